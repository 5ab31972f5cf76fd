//! Interaction sessions
//!
//! A session links a rendered report back to the query that produced it and the
//! delivery token needed to edit it. It is written once when the command runs,
//! keyed by that command interaction's id, and read by every follow-up component
//! interaction through the message's interaction metadata.

use crate::database::kv::KvStore;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Default session lifetime (8 minutes)
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 8);

const SESSION_KEY_PREFIX: &str = "session:";

/// Data needed to re-render a report on a follow-up interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Interaction token of the originating command, used to edit its reply
    pub token: String,
    /// Normalized lookup query
    pub query: String,
}

/// Session cache over a shared key-value store
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_ttl(store, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(session_key: &str) -> String {
        format!("{}{}", SESSION_KEY_PREFIX, session_key)
    }

    /// Store a session under the originating interaction id
    pub fn put(&self, session_key: &str, session: &Session) -> Result<()> {
        let value = serde_json::to_string(session)
            .map_err(|e| anyhow!("Failed to serialize session: {}", e))?;
        self.store.put(&Self::key(session_key), &value, self.ttl)
    }

    /// Look a session up; `None` means expired or never created
    ///
    /// An unreadable entry is treated the same as an expired one.
    pub fn get(&self, session_key: &str) -> Result<Option<Session>> {
        let Some(value) = self.store.get(&Self::key(session_key))? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&value) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("discarding unreadable session {}: {}", session_key, e);
                Ok(None)
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
