//! Store - the injected key-value capability a collection persists into.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Synchronous string-keyed storage over a flat namespace.
///
/// Semantically a browser-local-storage equivalent: string keys, string
/// values, no queries. Methods take `&self` so one backing store can be
/// handed to several sequentially-used collections (interior mutability is
/// the implementor's concern).
pub trait Store {
    /// Get the value stored under `key`. Returns None if absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Delete `key`. Deleting an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// In-memory store backed by a HashMap.
///
/// Clone-friendly via Arc: clones share the same storage, which is how the
/// round-trip tests hand one store to two collection instances.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored. Test helper.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let store = MemoryStore::new();
        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn set_replaces() {
        let store = MemoryStore::new();
        store.set("k", "v1");
        store.set("k", "v2");
        assert_eq!(store.get("k"), Some("v2".to_string()));
    }

    #[test]
    fn remove_deletes() {
        let store = MemoryStore::new();
        store.set("k", "v");
        store.remove("k");
        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn remove_missing_is_noop() {
        let store = MemoryStore::new();
        store.remove("missing");
        assert!(store.is_empty());
    }

    #[test]
    fn clone_shares_storage() {
        let store = MemoryStore::new();
        let clone = store.clone();
        store.set("k", "v");
        assert_eq!(clone.get("k"), Some("v".to_string()));
    }
}
