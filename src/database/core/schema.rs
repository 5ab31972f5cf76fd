//! Database schema management
//!
//! Schema definitions for the key-value store database.

use anyhow::{anyhow, Result};
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
/// Increment this when making breaking schema changes
pub const SCHEMA_VERSION: u32 = 1;

/// Schema definitions for all tables in the store database
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// SQL for creating the meta table (tracks schema version)
    pub const META_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS rdapbot_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );
    "#;

    /// SQL for creating the key-value table
    ///
    /// `expires_at` is a unix timestamp in seconds; rows past it are treated as absent.
    pub const KV_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS kv_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        );
    "#;

    pub const KV_INDEXES: &'static [&'static str] =
        &["CREATE INDEX IF NOT EXISTS idx_kv_expires_at ON kv_entries(expires_at)"];
}

/// Schema state of an opened database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Database is not initialized (fresh database)
    NotInitialized,

    /// Schema is current and valid
    Current,

    /// Database was written by a different schema version
    Incompatible {
        database_version: u32,
        required_version: u32,
    },
}

/// Creates tables and tracks the schema version
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create all tables and indexes if they don't exist
    ///
    /// A version already recorded in the meta table is left untouched.
    pub fn initialize(&self) -> Result<()> {
        self.conn
            .execute(SchemaDefinitions::META_TABLE, [])
            .map_err(|e| anyhow!("Failed to create meta table: {}", e))?;

        if self.get_meta("schema_version")?.is_none() {
            self.set_meta("schema_version", &SCHEMA_VERSION.to_string())?;
        }

        self.conn
            .execute(SchemaDefinitions::KV_TABLE, [])
            .map_err(|e| anyhow!("Failed to create kv_entries table: {}", e))?;

        for index_sql in SchemaDefinitions::KV_INDEXES {
            self.conn
                .execute(index_sql, [])
                .map_err(|e| anyhow!("Failed to create kv index: {}", e))?;
        }

        Ok(())
    }

    /// Drop all tables; the store only holds expiring entries
    pub fn reset(&self) -> Result<()> {
        self.conn
            .execute("DROP TABLE IF EXISTS kv_entries", [])
            .map_err(|e| anyhow!("Failed to drop kv_entries: {}", e))?;
        self.conn
            .execute("DROP TABLE IF EXISTS rdapbot_meta", [])
            .map_err(|e| anyhow!("Failed to drop meta table: {}", e))?;
        Ok(())
    }

    pub fn check_status(&self) -> Result<SchemaStatus> {
        let has_meta: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='rdapbot_meta'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to inspect schema: {}", e))?;
        if has_meta == 0 {
            return Ok(SchemaStatus::NotInitialized);
        }

        let version = self
            .get_meta("schema_version")?
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);

        if version == SCHEMA_VERSION {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::Incompatible {
                database_version: version,
                required_version: SCHEMA_VERSION,
            })
        }
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO rdapbot_meta (key, value, updated_at) VALUES (?1, ?2, strftime('%s', 'now'))",
                [key, value],
            )
            .map_err(|e| anyhow!("Failed to set meta '{}': {}", key, e))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM rdapbot_meta WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| anyhow!("Failed to get meta '{}': {}", key, e))
    }
}
