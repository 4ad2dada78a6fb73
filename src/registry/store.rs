// SPDX-License-Identifier: GPL-3.0-only
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::registry::error::{DiscoveryError, DiscoveryResult};
use crate::registry::models::Record;
use crate::registry::traits::Persistence;

#[derive(Debug, Clone)]
struct Slot {
    /// Insertion sequence number, defines scan order
    position: u64,
    record: Record,
}

#[derive(Debug, Clone, Default)]
struct Table {
    slots: HashMap<String, Slot>,
    next_position: u64,
}

impl Table {
    fn push(&mut self, id: String, record: Record) {
        let position = self.next_position;
        self.next_position += 1;
        self.slots.insert(id, Slot { position, record });
    }

    fn snapshot(&self) -> Vec<Record> {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.position);
        slots.into_iter().map(|slot| slot.record.clone()).collect()
    }
}

/// Authoritative table of published records.
///
/// Writers queue on `writer` for the whole mutation, including the save.
/// The table lock itself is only held exclusively to swap in a finished
/// state, so reads never wait on the persistence collaborator.
pub struct RegistryStore {
    table: RwLock<Table>,
    writer: Mutex<()>,
    persistence: Option<Arc<dyn Persistence>>,
    persist_on_mutation: bool,
}

impl RegistryStore {
    /// An empty, purely in-memory store
    pub fn in_memory() -> Self {
        Self {
            table: RwLock::new(Table::default()),
            writer: Mutex::new(()),
            persistence: None,
            persist_on_mutation: false,
        }
    }

    /// Open a store backed by a persistence collaborator, loading its saved records
    pub async fn open(
        persistence: Arc<dyn Persistence>,
        persist_on_mutation: bool,
    ) -> DiscoveryResult<Self> {
        let saved = persistence
            .load()
            .await
            .map_err(DiscoveryError::StoreUnavailable)?;

        let mut table = Table::default();
        for record in saved {
            let Some(id) = record.id().map(str::to_string) else {
                warn!(name = %record.name, "Skipping saved record without registration id");
                continue;
            };
            if table.slots.contains_key(&id) {
                warn!(registration_id = %id, "Skipping duplicate saved record");
                continue;
            }
            table.push(id, record);
        }

        info!(count = table.slots.len(), "Registry store loaded");
        Ok(Self {
            table: RwLock::new(table),
            writer: Mutex::new(()),
            persistence: Some(persistence),
            persist_on_mutation,
        })
    }

    /// Run a mutation as the only writer.
    ///
    /// With a persistence collaborator on mutation, the change is staged on a
    /// copy and only swapped in once the save succeeded.
    async fn apply<T, F>(&self, mutate: F) -> DiscoveryResult<T>
    where
        F: FnOnce(&mut Table) -> DiscoveryResult<T>,
    {
        let _writer = self.writer.lock().await;

        let persistence = match &self.persistence {
            Some(p) if self.persist_on_mutation => p,
            _ => return mutate(&mut *self.table.write().await),
        };

        let mut staged = self.table.read().await.clone();
        let outcome = mutate(&mut staged)?;
        persistence
            .save(&staged.snapshot())
            .await
            .map_err(DiscoveryError::StoreUnavailable)?;
        *self.table.write().await = staged;
        Ok(outcome)
    }

    /// Store a copy of `record` under a freshly assigned id and return the id
    pub async fn insert(&self, mut record: Record) -> DiscoveryResult<String> {
        self.apply(|table| {
            let mut id = Uuid::new_v4().to_string();
            while table.slots.contains_key(&id) {
                id = Uuid::new_v4().to_string();
            }
            record.registration_id = Some(id.clone());
            table.push(id.clone(), record);
            debug!(registration_id = %id, "Inserted record");
            Ok(id)
        })
        .await
    }

    /// Replace the record stored under `id` as a whole
    pub async fn update(&self, id: &str, record: Record) -> DiscoveryResult<()> {
        match record.id() {
            Some(actual) if actual == id => {}
            actual => {
                return Err(DiscoveryError::IdMismatch {
                    expected: id.to_string(),
                    actual: actual.unwrap_or_default().to_string(),
                });
            }
        }

        self.apply(|table| {
            let slot = table
                .slots
                .get_mut(id)
                .ok_or_else(|| DiscoveryError::NotFound(id.to_string()))?;
            slot.record = record;
            debug!(registration_id = %id, "Updated record");
            Ok(())
        })
        .await
    }

    /// Delete the record stored under `id`, returning it
    pub async fn remove(&self, id: &str) -> DiscoveryResult<Record> {
        self.apply(|table| {
            let slot = table
                .slots
                .remove(id)
                .ok_or_else(|| DiscoveryError::NotFound(id.to_string()))?;
            debug!(registration_id = %id, "Removed record");
            Ok(slot.record)
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Option<Record> {
        self.table
            .read()
            .await
            .slots
            .get(id)
            .map(|slot| slot.record.clone())
    }

    /// Point-in-time copy of every record, in insertion order
    pub async fn scan(&self) -> Vec<Record> {
        self.table.read().await.snapshot()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.slots.len()
    }

    /// Save the current state to the persistence collaborator, if any
    pub async fn checkpoint(&self) -> DiscoveryResult<()> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };

        // Writers wait until the snapshot is saved; readers do not
        let _writer = self.writer.lock().await;
        let snapshot = self.table.read().await.snapshot();
        persistence
            .save(&snapshot)
            .await
            .map_err(DiscoveryError::StoreUnavailable)?;
        info!(count = snapshot.len(), "Registry checkpoint saved");
        Ok(())
    }

    pub fn persists_on_mutation(&self) -> bool {
        self.persistence.is_some() && self.persist_on_mutation
    }
}
