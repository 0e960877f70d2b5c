//! services/api/src/adapters/overlay_db.rs
//!
//! SQLite-backed implementation of the `OverlayStore` and `OverlayDirectory` ports.
//! Every device owns a private key space inside one `overlay_entries` table.

use async_trait::async_trait;
use learning_overlay_core::ports::{OverlayDirectory, OverlayStore, OverlayUpdateGuard, PortError, PortResult};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// Directory
//=========================================================================================

/// Opens per-device overlay stores over a shared connection pool.
#[derive(Clone)]
pub struct SqliteOverlayDirectory {
    pool: SqlitePool,
    /// One update lock per device, shared by every store opened for it.
    update_locks: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SqliteOverlayDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            update_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn update_lock(&self, device_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        // The map only ever gains entries, so a poisoned guard is still consistent.
        let mut locks = match self.update_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(device_id).or_default().clone()
    }

    /// Creates the overlay table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query("PRAGMA journal_mode=WAL").execute(&self.pool).await?;
        sqlx::query("PRAGMA busy_timeout=5000").execute(&self.pool).await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS overlay_entries (
                device_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at_unix_secs INTEGER NOT NULL,
                PRIMARY KEY(device_id, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl OverlayDirectory for SqliteOverlayDirectory {
    fn open(&self, device_id: Uuid) -> Arc<dyn OverlayStore> {
        Arc::new(SqliteOverlayStore {
            pool: self.pool.clone(),
            device_id: device_id.to_string(),
            update_lock: self.update_lock(device_id),
        })
    }
}

//=========================================================================================
// Store
//=========================================================================================

/// The overlay store of a single device.
pub struct SqliteOverlayStore {
    pool: SqlitePool,
    device_id: String,
    update_lock: Arc<tokio::sync::Mutex<()>>,
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

#[async_trait]
impl OverlayStore for SqliteOverlayStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM overlay_entries WHERE device_id = ?1 AND key = ?2")
            .bind(self.device_id.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            r#"
            INSERT INTO overlay_entries (device_id, key, value, updated_at_unix_secs)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(device_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at_unix_secs = excluded.updated_at_unix_secs
            "#,
        )
        .bind(self.device_id.as_str())
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        debug!(device_id = %self.device_id, key, bytes = value.len(), "overlay written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM overlay_entries WHERE device_id = ?1 AND key = ?2")
            .bind(self.device_id.as_str())
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn clear(&self) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM overlay_entries WHERE device_id = ?1")
            .bind(self.device_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        debug!(device_id = %self.device_id, removed = result.rows_affected(), "overlays cleared");
        Ok(())
    }

    async fn lock_for_update(&self) -> OverlayUpdateGuard {
        self.update_lock.clone().lock_owned().await
    }
}
