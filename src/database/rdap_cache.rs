//! Raw RDAP response cache
//!
//! Stores the raw JSON body of a successful lookup keyed by the normalized
//! query. Entries are written only after the body normalized successfully and
//! are read before any network call.

use crate::database::kv::KvStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Default TTL for cached RDAP responses (8 minutes)
pub const DEFAULT_LOOKUP_CACHE_TTL: Duration = Duration::from_secs(60 * 8);

const LOOKUP_KEY_PREFIX: &str = "rdap:";

#[derive(Clone)]
pub struct RdapCache {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl RdapCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_ttl(store, DEFAULT_LOOKUP_CACHE_TTL)
    }

    pub fn with_ttl(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(query: &str) -> String {
        format!("{}{}", LOOKUP_KEY_PREFIX, query)
    }

    /// Cached raw JSON for a normalized query
    pub fn get(&self, query: &str) -> Result<Option<String>> {
        self.store.get(&Self::key(query))
    }

    pub fn put(&self, query: &str, raw_json: &str) -> Result<()> {
        self.store.put(&Self::key(query), raw_json, self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::kv::{ManualClock, MemoryKvStore};

    #[test]
    fn test_cache_round_trip_and_expiry() {
        let clock = Arc::new(ManualClock::default());
        let cache = RdapCache::new(Arc::new(MemoryKvStore::with_clock(clock.clone())));

        assert!(cache.get("example.com").unwrap().is_none());
        cache.put("example.com", r#"{"objectClassName":"domain"}"#).unwrap();
        assert!(cache.get("example.com").unwrap().is_some());

        clock.advance(DEFAULT_LOOKUP_CACHE_TTL);
        assert!(cache.get("example.com").unwrap().is_none());
    }
}
