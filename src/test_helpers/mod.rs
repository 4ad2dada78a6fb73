// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use crate::registry::{Persistence, Record, SqlitePersistence};
use crate::config::{Config, LogFormat};

/// Create a SQLite collaborator on a temporary file.
/// Keep the returned file alive for as long as the database is used.
pub async fn setup_test_persistence() -> (NamedTempFile, Arc<SqlitePersistence>) {
    let temp_file = NamedTempFile::new().expect("Failed to create temp database file");
    let persistence = SqlitePersistence::new(temp_file.path())
        .await
        .expect("Failed to open test database");
    (temp_file, Arc::new(persistence))
}

/// A record that looks like it came out of the registry
pub fn published_record(id: &str, name: &str, service_type: &str) -> Record {
    let mut record = Record::new(name, service_type);
    record.registration_id = Some(id.to_string());
    record
}

/// In-memory collaborator whose loads and saves can be made to fail or stall
#[derive(Default)]
pub struct FailingPersistence {
    saved: Mutex<Vec<Record>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    save_delay_ms: AtomicU64,
}

impl FailingPersistence {
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn delay_saves(&self, delay: Duration) {
        self.save_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn saved(&self) -> Vec<Record> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl Persistence for FailingPersistence {
    async fn load(&self) -> anyhow::Result<Vec<Record>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("backend unreachable"));
        }
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, records: &[Record]) -> anyhow::Result<()> {
        let delay = self.save_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("backend unreachable"));
        }
        *self.saved.lock().await = records.to_vec();
        Ok(())
    }
}

/// Create a test configuration with temporary paths
pub fn create_test_config() -> Config {
    use std::net::SocketAddr;
    use std::str::FromStr;

    let temp_dir = std::env::temp_dir().join(format!("discovery-test-{}", uuid::Uuid::new_v4()));

    Config {
        name: "test-registry".to_string(),
        registry_db_path: Some(temp_dir.join("test_registry.db")),
        persist_on_mutation: true,
        local_api_bind: SocketAddr::from_str("127.0.0.1:0").unwrap(), // Use port 0 to auto-assign
        log_level: "error".to_string(), // Reduce log noise in tests
        log_format: LogFormat::Pretty,
    }
}
