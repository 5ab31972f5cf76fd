//! Database module
//!
//! This module provides all storage for rdapbot, organized into:
//!
//! - **core**: SQLite connection wrapper and schema management
//! - **kv**: the expiring key-value store trait and its implementations
//! - **session**: interaction sessions (query + delivery token per report)
//! - **rdap_cache**: raw RDAP responses keyed by normalized query
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── schema      # Table definitions and version tracking
//! │
//! ├── kv/             # KvStore trait
//! │   ├── sqlite      # Persistent store (kv_entries table)
//! │   └── memory      # In-process store with injectable clock
//! │
//! ├── session/        # "session:<interaction id>" entries
//! └── rdap_cache      # "rdap:<query>" entries
//! ```
//!
//! Both caches share one [`KvStore`] and are distinguished only by key prefix.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rdapbot::database::{MemoryKvStore, RdapCache, Session, SessionStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryKvStore::new());
//! let sessions = SessionStore::new(store.clone());
//! sessions.put("1180000000000000000", &Session {
//!     token: "interaction-token".to_string(),
//!     query: "example.com".to_string(),
//! })?;
//!
//! let cache = RdapCache::new(store);
//! let raw = cache.get("example.com")?;
//! ```

pub mod core;
pub mod kv;
pub mod rdap_cache;
pub mod session;

pub use core::{DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SCHEMA_VERSION};
pub use kv::{Clock, KvStore, ManualClock, MemoryKvStore, SqliteKvStore, SystemClock};
pub use rdap_cache::{RdapCache, DEFAULT_LOOKUP_CACHE_TTL};
pub use session::{Session, SessionStore, DEFAULT_SESSION_TTL};

/// Ensure the data directory exists
pub fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory '{}': {}", data_dir, e))
}
