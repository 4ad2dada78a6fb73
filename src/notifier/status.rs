// SPDX-License-Identifier: GPL-3.0-only
use futures_util::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::{debug, error, info};

use crate::notifier::events::{EventKind, StatusEvent};
use crate::notifier::traits::StatusListener;
use crate::registry::Record;

/// Capacity of the fault channel; slow fault readers lag instead of blocking delivery
const FAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A listener failed (returned an error or panicked) while handling an event
#[derive(Debug, Clone)]
pub struct ListenerFault {
    pub subscription: SubscriptionHandle,
    pub kind: EventKind,
    pub registration_id: Option<String>,
    pub reason: String,
}

/// Fans lifecycle events out to listeners.
///
/// Each subscription owns an unbounded queue drained by its own task, so
/// `emit` never waits on a listener and one listener never delays another.
pub struct StatusNotifier {
    subscribers: RwLock<HashMap<SubscriptionHandle, mpsc::UnboundedSender<StatusEvent>>>,
    next_handle: AtomicU64,
    faults: broadcast::Sender<ListenerFault>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        let (faults, _) = broadcast::channel(FAULT_CHANNEL_CAPACITY);
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
            faults,
        }
    }

    pub async fn subscribe(&self, listener: Arc<dyn StatusListener>) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        spawn_delivery(handle, listener, rx, self.faults.clone());
        self.subscribers.write().await.insert(handle, tx);

        info!(subscription = %handle, "Listener subscribed");
        handle
    }

    /// Stop delivering new events to a listener. Events already queued are
    /// still delivered. Returns false if the handle was unknown.
    pub async fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let removed = self.subscribers.write().await.remove(&handle).is_some();
        if removed {
            info!(subscription = %handle, "Listener unsubscribed");
        }
        removed
    }

    /// Queue an event for every current listener; returns how many were reached
    pub async fn emit(&self, kind: EventKind, record: Record) -> usize {
        let event = StatusEvent::new(kind, record);
        let subscribers = self.subscribers.read().await;

        let mut delivered = 0;
        for (handle, tx) in subscribers.iter() {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(subscription = %handle, "Delivery task gone, dropping event");
            }
        }

        debug!(kind = ?kind, registration_id = ?event.registration_id(), listeners = delivered, "Emitted status event");
        delivered
    }

    /// Out-of-band stream of listener failures
    pub fn faults(&self) -> broadcast::Receiver<ListenerFault> {
        self.faults.subscribe()
    }

    pub async fn listener_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Drop every subscription; queued events still drain
    pub async fn shutdown(&self) {
        let mut subscribers = self.subscribers.write().await;
        let count = subscribers.len();
        subscribers.clear();
        info!(count, "Status notifier shut down");
    }
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_delivery(
    handle: SubscriptionHandle,
    listener: Arc<dyn StatusListener>,
    mut rx: mpsc::UnboundedReceiver<StatusEvent>,
    faults: broadcast::Sender<ListenerFault>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let outcome = AssertUnwindSafe(listener.on_event(&event)).catch_unwind().await;
            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{:#}", e),
                Err(panic) => format!("listener panicked: {}", panic_message(panic.as_ref())),
            };

            error!(subscription = %handle, kind = ?event.kind, error = %reason, "Listener failed to handle event");
            // No fault readers is fine
            let _ = faults.send(ListenerFault {
                subscription: handle,
                kind: event.kind,
                registration_id: event.registration_id().map(str::to_string),
                reason,
            });
        }
        debug!(subscription = %handle, "Listener queue drained");
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
