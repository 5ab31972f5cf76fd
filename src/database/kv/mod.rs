//! Key-value store with per-entry expiry
//!
//! Both the RDAP lookup cache and the interaction session cache live behind the
//! [`KvStore`] trait. They share one store and are kept apart only by key
//! namespace and payload shape.
//!
//! Two implementations are provided:
//! - [`SqliteKvStore`]: persistent, backed by a SQLite file
//! - [`MemoryKvStore`]: in-process map, used for tests and `--ephemeral` runs
//!
//! Expiry is passive: an entry past its TTL reads as absent and is never
//! explicitly deleted by callers.

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// A string-to-string store where every entry carries a time-to-live
pub trait KvStore: Send + Sync {
    /// Get a value, or `None` if the key was never written or has expired
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value that expires after `ttl`
    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Time source for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let Ok(step) = chrono::Duration::from_std(by) else {
            return;
        };
        if let Ok(mut now) = self.now.lock() {
            *now += step;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Unix timestamp (seconds) at which an entry written `now` with `ttl` expires
pub(crate) fn expiry_timestamp(now: DateTime<Utc>, ttl: Duration) -> i64 {
    now.timestamp()
        .saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}
