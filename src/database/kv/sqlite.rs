use super::{expiry_timestamp, Clock, KvStore, SystemClock};
use crate::database::core::{DatabaseConn, SchemaManager, SchemaStatus};
use anyhow::{anyhow, Result};
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// SQLite-backed key-value store
///
/// Expired rows are ignored on read and purged opportunistically on write.
pub struct SqliteKvStore {
    db: Mutex<DatabaseConn>,
    clock: Arc<dyn Clock>,
}

impl SqliteKvStore {
    /// Open (or create) a store at the given path; `None` opens an in-memory store
    pub fn open(path: Option<&str>) -> Result<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(path: Option<&str>, clock: Arc<dyn Clock>) -> Result<Self> {
        let db = DatabaseConn::open(path)?;
        let schema = SchemaManager::new(&db.conn);

        match schema.check_status()? {
            SchemaStatus::Current => {}
            SchemaStatus::NotInitialized => {
                debug!("initializing kv store schema");
                schema.initialize()?;
            }
            SchemaStatus::Incompatible {
                database_version,
                required_version,
            } => {
                info!(
                    "kv store schema incompatible (db: v{}, required: v{}), resetting",
                    database_version, required_version
                );
                schema.reset()?;
                schema.initialize()?;
            }
        }

        Ok(Self {
            db: Mutex::new(db),
            clock,
        })
    }

    /// Open the store file inside a data directory
    pub fn open_in_dir(data_dir: &str) -> Result<Self> {
        let data_dir = data_dir.trim_end_matches('/');
        crate::database::ensure_data_dir(data_dir)?;
        let path = format!("{}/rdapbot-kv.sqlite3", data_dir);
        Self::open(Some(path.as_str()))
    }

    /// Delete every expired row, returning how many were removed
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now().timestamp();
        let db = self.lock()?;
        db.execute_with_params("DELETE FROM kv_entries WHERE expires_at <= ?1", [now])
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DatabaseConn>> {
        self.db
            .lock()
            .map_err(|_| anyhow!("kv store connection lock poisoned"))
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now().timestamp();
        let db = self.lock()?;
        db.conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1 AND expires_at > ?2",
                rusqlite::params![key, now],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| anyhow!("Failed to read key '{}': {}", key, e))
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = self.clock.now();
        let expires_at = expiry_timestamp(now, ttl);
        let db = self.lock()?;
        db.execute_with_params(
            "INSERT OR REPLACE INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, expires_at],
        )?;

        let purged = db.execute_with_params(
            "DELETE FROM kv_entries WHERE expires_at <= ?1",
            [now.timestamp()],
        )?;
        if purged > 0 {
            debug!("purged {} expired kv entries", purged);
        }
        Ok(())
    }
}
