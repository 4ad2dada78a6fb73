// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    Row,
    sqlite::{SqliteConnectOptions, SqlitePool},
};
use std::path::Path;
use crate::registry::{models::{Record, Status}, traits::Persistence};
use tracing::{debug, error, info};

pub struct SqlitePersistence {
    pool: SqlitePool,
}

impl SqlitePersistence {
    pub async fn new(db_path: &Path) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let persistence = Self { pool };
        persistence.init_schema().await?;

        Ok(persistence)
    }

    async fn init_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                registration_id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'UNKNOWN',
                location TEXT NOT NULL DEFAULT '{}',
                metadata TEXT NOT NULL DEFAULT '{}',
                saved_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Initialized SQLite record schema");
        Ok(())
    }

    fn record_from_row(&self, row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Record> {
        let status_str: String = row.try_get("status")?;
        let status: Status = serde_json::from_value(serde_json::Value::String(status_str))?;

        Ok(Record {
            registration_id: Some(row.try_get::<String, _>("registration_id")?),
            name: row.try_get("name")?,
            service_type: row.try_get("type")?,
            location: serde_json::from_str(&row.try_get::<String, _>("location")?)?,
            metadata: serde_json::from_str(&row.try_get::<String, _>("metadata")?)?,
            status,
        })
    }
}

#[async_trait]
impl Persistence for SqlitePersistence {
    async fn load(&self) -> anyhow::Result<Vec<Record>> {
        let rows = sqlx::query("SELECT * FROM records ORDER BY position")
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match self.record_from_row(&row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!(error = %e, "Failed to parse record from database");
                }
            }
        }

        info!(count = records.len(), "Loaded records from SQLite");
        Ok(records)
    }

    async fn save(&self, records: &[Record]) -> anyhow::Result<()> {
        let saved_at = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records")
            .execute(&mut *tx)
            .await?;

        for (position, record) in records.iter().enumerate() {
            let id = record
                .id()
                .ok_or_else(|| anyhow::anyhow!("Refusing to save record '{}' without registration id", record.name))?;

            sqlx::query(
                r#"
                INSERT INTO records (registration_id, position, name, type, status, location, metadata, saved_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(id)
            .bind(position as i64)
            .bind(&record.name)
            .bind(&record.service_type)
            .bind(record.status.as_str())
            .bind(serde_json::to_string(&record.location)?)
            .bind(serde_json::to_string(&record.metadata)?)
            .bind(&saved_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(count = records.len(), "Saved records to SQLite");
        Ok(())
    }
}
