use std::collections::hash_map::{self, HashMap};

use crate::entry::Entry;

/// In-memory mapping from key to [`Entry`].
///
/// `Store` does no locking of its own. The facade owns it behind a single
/// mutex so that a mutation and the persist that follows it are one step.
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<String, Entry>,
}

impl Store {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `key` without evicting anything
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.data.get(key)
    }

    /// Inserts or overwrites `key`
    pub fn put(&mut self, key: impl Into<String>, entry: Entry) {
        self.data.insert(key.into(), entry);
    }

    /// Removes `key` if present, returning the removed entry
    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.data.remove(key)
    }

    /// Removes every entry expired at `now_millis`, returning how many were removed
    pub fn sweep_expired(&mut self, now_millis: i64) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired(now_millis));
        before - self.data.len()
    }

    /// Returns `true` if `key` is present, expired or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns the number of entries (including expired ones)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over all entries in arbitrary order
    pub fn iter(&self) -> hash_map::Iter<'_, String, Entry> {
        self.data.iter()
    }
}

impl From<HashMap<String, Entry>> for Store {
    fn from(data: HashMap<String, Entry>) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(expires_at: Option<i64>) -> Entry {
        Entry::new(json!({"v": 1}), expires_at)
    }

    #[test]
    fn test_put_and_get() {
        let mut store = Store::new();
        store.put("key1", entry(None));

        assert_eq!(store.get("key1").map(Entry::value), Some(&json!({"v": 1})));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_get_does_not_evict_expired() {
        let mut store = Store::new();
        store.put("old", entry(Some(10)));

        assert!(store.get("old").unwrap().is_expired(11));
        assert!(store.contains_key("old"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = Store::new();
        store.put("key1", entry(None));
        store.put("key1", entry(Some(5)));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("key1").unwrap().expires_at(), Some(5));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = Store::new();
        assert!(store.remove("nothing").is_none());

        store.put("key1", entry(None));
        assert!(store.remove("key1").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_expired() {
        let mut store = Store::new();
        store.put("expired1", entry(Some(100)));
        store.put("expired2", entry(Some(200)));
        store.put("boundary", entry(Some(300)));
        store.put("forever", entry(None));

        let removed = store.sweep_expired(300);
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 2);
        assert!(store.contains_key("boundary"));
        assert!(store.contains_key("forever"));
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut store = Store::new();
        store.put("expired", entry(Some(1)));
        store.put("valid", entry(Some(1_000)));

        assert_eq!(store.sweep_expired(500), 1);
        assert_eq!(store.sweep_expired(500), 0);
        assert_eq!(store.len(), 1);
    }
}
