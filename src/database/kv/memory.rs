use super::{expiry_timestamp, Clock, KvStore, SystemClock};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-process key-value store with controllable clock
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, (String, i64)>>,
    clock: Arc<dyn Clock>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now().timestamp();
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value.clone()))
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = self.clock.now();
        let expires_at = expiry_timestamp(now, ttl);
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        let now = now.timestamp();
        entries.retain(|_, (_, expiry)| *expiry > now);
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::kv::ManualClock;

    #[test]
    fn test_put_and_get() {
        let store = MemoryKvStore::new();
        store.put("a", "1", Duration::from_secs(60)).unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_entry_expires() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryKvStore::with_clock(clock.clone());
        store.put("a", "1", Duration::from_secs(480)).unwrap();

        clock.advance(Duration::from_secs(479));
        assert!(store.get("a").unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.get("a").unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_purges_expired_entries() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryKvStore::with_clock(clock.clone());
        for i in 0..1000 {
            store
                .put(&format!("session:{}", i), "{}", Duration::from_secs(480))
                .unwrap();
            clock.advance(Duration::from_secs(600));
        }
        assert_eq!(store.len(), 1);

        store.put("rdap:example.com", "{}", Duration::from_secs(480)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("rdap:example.com").unwrap().is_some());
    }

    #[test]
    fn test_put_replaces_and_refreshes_ttl() {
        let clock = Arc::new(ManualClock::default());
        let store = MemoryKvStore::with_clock(clock.clone());
        store.put("a", "1", Duration::from_secs(10)).unwrap();
        clock.advance(Duration::from_secs(8));
        store.put("a", "2", Duration::from_secs(10)).unwrap();
        clock.advance(Duration::from_secs(8));
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));
    }
}
