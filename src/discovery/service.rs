// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::notifier::{EventKind, ListenerFault, StatusListener, StatusNotifier, SubscriptionHandle};
use crate::registry::{
    DiscoveryError, DiscoveryResult, Filter, Persistence, Record, RegistryStore, Status, ValidRecord,
    matches, validate_for_publish, validate_for_update,
};

/// Entry point for publishing and looking up service records.
///
/// Mutations are serialised through a write gate that also covers the
/// matching event emission, so listeners see events for a record in the
/// order its mutations were applied. Lookups never take the gate.
pub struct DiscoveryService {
    name: String,
    store: RegistryStore,
    notifier: StatusNotifier,
    write_gate: Mutex<()>,
    closed: AtomicBool,
    final_checkpoint_pending: AtomicBool,
    internal_subscriptions: Mutex<Vec<SubscriptionHandle>>,
}

impl DiscoveryService {
    /// Purely in-memory registry
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_store(name, RegistryStore::in_memory())
    }

    /// Registry backed by a persistence collaborator; saved records are loaded first
    pub async fn with_persistence(
        name: impl Into<String>,
        persistence: Arc<dyn Persistence>,
        persist_on_mutation: bool,
    ) -> DiscoveryResult<Self> {
        let store = RegistryStore::open(persistence, persist_on_mutation).await?;
        Ok(Self::from_store(name, store))
    }

    pub fn from_store(name: impl Into<String>, store: RegistryStore) -> Self {
        let name = name.into();
        info!(registry = %name, "Discovery service started");
        Self {
            name,
            store,
            notifier: StatusNotifier::new(),
            write_gate: Mutex::new(()),
            closed: AtomicBool::new(false),
            final_checkpoint_pending: AtomicBool::new(true),
            internal_subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> DiscoveryResult<()> {
        if self.is_closed() {
            return Err(DiscoveryError::ServiceClosed);
        }
        Ok(())
    }

    /// Publish a fresh record; returns it with its new registration id
    pub async fn publish(&self, record: Record) -> DiscoveryResult<Record> {
        self.ensure_open()?;
        let valid = validate_for_publish(record)?;

        let _gate = self.write_gate.lock().await;
        self.ensure_open()?;

        let mut record = valid.into_inner();
        if record.status == Status::Unknown {
            record.status = Status::Up;
        }

        let id = self.store.insert(record.clone()).await?;
        record.registration_id = Some(id.clone());

        self.notifier.emit(EventKind::Published, record.clone()).await;
        info!(registry = %self.name, registration_id = %id, name = %record.name, service_type = %record.service_type, "Record published");
        Ok(record)
    }

    /// Remove a published record
    pub async fn unpublish(&self, id: &str) -> DiscoveryResult<()> {
        let _gate = self.write_gate.lock().await;
        self.ensure_open()?;

        let removed = self.store.remove(id).await?;
        self.notifier.emit(EventKind::Unpublished, removed).await;

        info!(registry = %self.name, registration_id = %id, "Record unpublished");
        Ok(())
    }

    /// Replace a published record; the record's registration id selects the target
    pub async fn update(&self, record: Record) -> DiscoveryResult<Record> {
        self.ensure_open()?;
        let (id, valid) = validate_for_update(record)?;
        self.replace(&id, valid).await
    }

    /// Replace the record published under `id`; the record must carry the same id
    pub async fn update_at(&self, id: &str, record: Record) -> DiscoveryResult<Record> {
        self.ensure_open()?;
        let (_, valid) = validate_for_update(record)?;
        self.replace(id, valid).await
    }

    async fn replace(&self, id: &str, valid: ValidRecord) -> DiscoveryResult<Record> {
        let _gate = self.write_gate.lock().await;
        self.ensure_open()?;

        let record = valid.into_inner();
        self.store.update(id, record.clone()).await?;
        self.notifier.emit(EventKind::Updated, record.clone()).await;

        info!(registry = %self.name, registration_id = %id, "Record updated");
        Ok(record)
    }

    /// Change only the status of a published record (external health signals)
    pub async fn set_status(&self, id: &str, status: Status) -> DiscoveryResult<Record> {
        let _gate = self.write_gate.lock().await;
        self.ensure_open()?;

        let mut record = self
            .store
            .get(id)
            .await
            .ok_or_else(|| DiscoveryError::NotFound(id.to_string()))?;
        if record.status == status {
            debug!(registration_id = %id, status = %status, "Status unchanged");
            return Ok(record);
        }

        let previous = record.status;
        record.status = status;
        self.store.update(id, record.clone()).await?;
        self.notifier.emit(EventKind::Updated, record.clone()).await;

        info!(registry = %self.name, registration_id = %id, from = %previous, to = %status, "Record status changed");
        Ok(record)
    }

    /// First record matching `filter` in scan order; `None` when nothing matches
    pub async fn get_record(&self, filter: &Filter) -> DiscoveryResult<Option<Record>> {
        self.ensure_open()?;
        Ok(self
            .store
            .scan()
            .await
            .into_iter()
            .find(|record| matches(filter, record)))
    }

    /// Every record matching `filter`, in scan order
    pub async fn get_records(&self, filter: &Filter) -> DiscoveryResult<Vec<Record>> {
        self.ensure_open()?;
        let records: Vec<Record> = self
            .store
            .scan()
            .await
            .into_iter()
            .filter(|record| matches(filter, record))
            .collect();
        debug!(registry = %self.name, unfiltered = filter.is_empty(), matched = records.len(), "Records looked up");
        Ok(records)
    }

    pub async fn subscribe(&self, listener: Arc<dyn StatusListener>) -> DiscoveryResult<SubscriptionHandle> {
        self.ensure_open()?;
        let handle = self.notifier.subscribe(listener).await;
        let listeners = self.notifier.listener_count().await;
        debug!(
            registry = %self.name,
            subscription = %handle,
            listeners = listeners,
            "Listener subscribed"
        );
        Ok(handle)
    }

    /// Subscribe a listener owned by the service itself; dropped on close
    pub async fn subscribe_internal(&self, listener: Arc<dyn StatusListener>) -> DiscoveryResult<SubscriptionHandle> {
        let handle = self.subscribe(listener).await?;
        self.internal_subscriptions.lock().await.push(handle);
        Ok(handle)
    }

    pub async fn unsubscribe(&self, handle: SubscriptionHandle) -> DiscoveryResult<bool> {
        self.ensure_open()?;
        Ok(self.notifier.unsubscribe(handle).await)
    }

    /// Listener failures, reported out of band
    pub fn faults(&self) -> broadcast::Receiver<ListenerFault> {
        self.notifier.faults()
    }

    /// Stop accepting operations and release listeners.
    ///
    /// Waits for the in-flight mutation, if any, so no mutation is cut in half.
    /// A failed final checkpoint is retried by calling `close` again; once it
    /// has succeeded further calls do nothing.
    pub async fn close(&self) -> DiscoveryResult<()> {
        let _gate = self.write_gate.lock().await;

        if !self.closed.swap(true, Ordering::SeqCst) {
            info!(registry = %self.name, "Closing discovery service");
            for handle in self.internal_subscriptions.lock().await.drain(..) {
                self.notifier.unsubscribe(handle).await;
            }
            self.notifier.shutdown().await;
        }

        if !self.final_checkpoint_pending.load(Ordering::SeqCst) {
            return Ok(());
        }

        if !self.store.persists_on_mutation() {
            if let Err(e) = self.store.checkpoint().await {
                warn!(registry = %self.name, error = %e, "Final checkpoint failed");
                return Err(e);
            }
        }
        self.final_checkpoint_pending.store(false, Ordering::SeqCst);

        info!(registry = %self.name, records = self.store.len().await, "Discovery service closed");
        Ok(())
    }
}
