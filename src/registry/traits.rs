// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use crate::registry::models::Record;

/// Durable backing for the in-memory registry.
///
/// Called only at checkpoints: once at startup and after mutations
/// (or on close, depending on configuration).
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load all previously saved records, in scan order
    async fn load(&self) -> anyhow::Result<Vec<Record>>;

    /// Replace the saved state with the given records
    async fn save(&self, records: &[Record]) -> anyhow::Result<()>;
}
