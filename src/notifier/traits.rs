// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::notifier::events::StatusEvent;

#[async_trait]
pub trait StatusListener: Send + Sync + 'static {
    /// Handle one lifecycle event. Errors are reported, never propagated
    /// to the mutation that emitted the event.
    async fn on_event(&self, event: &StatusEvent) -> anyhow::Result<()>;
}

/// Forward events into a channel
#[async_trait]
impl StatusListener for UnboundedSender<StatusEvent> {
    async fn on_event(&self, event: &StatusEvent) -> anyhow::Result<()> {
        self.send(event.clone())
            .map_err(|_| anyhow::anyhow!("Event receiver dropped"))
    }
}
