// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use tracing::info;

use crate::notifier::{StatusEvent, StatusListener};

/// Internal listener writing every lifecycle event to the log
pub struct AuditListener {
    registry: String,
}

impl AuditListener {
    pub fn new(registry: impl Into<String>) -> Self {
        Self { registry: registry.into() }
    }
}

#[async_trait]
impl StatusListener for AuditListener {
    async fn on_event(&self, event: &StatusEvent) -> anyhow::Result<()> {
        info!(
            registry = %self.registry,
            kind = ?event.kind,
            registration_id = ?event.registration_id(),
            name = %event.record.name,
            service_type = %event.record.service_type,
            status = %event.record.status,
            "Status event"
        );
        Ok(())
    }
}
