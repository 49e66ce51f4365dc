//! Cache storage seam and the in-memory arena implementation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::namespace::{CacheEntry, CacheNamespace, EntryStamp};

/// Errors from cache storage.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("cache store lock poisoned")]
    Poisoned,
}

/// Key-value storage for cached responses, partitioned by namespace.
///
/// Injected into the worker and the retriever; each key is written whole,
/// so no read-modify-write spans two calls.
pub trait CacheStore: Send + Sync {
    fn get(&self, namespace: CacheNamespace, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Inserts or replaces the entry under `entry.key`.
    fn put(&self, namespace: CacheNamespace, entry: CacheEntry) -> Result<(), CacheError>;

    /// Removes `key`, returning whether it existed.
    fn delete(&self, namespace: CacheNamespace, key: &str) -> Result<bool, CacheError>;

    /// Key and write time of every entry in `namespace`, sorted by key.
    ///
    /// Implementations must not load response bodies for this.
    fn stamps(&self, namespace: CacheNamespace) -> Result<Vec<EntryStamp>, CacheError>;

    /// All keys of `namespace`, sorted.
    fn keys(&self, namespace: CacheNamespace) -> Result<Vec<String>, CacheError> {
        Ok(self
            .stamps(namespace)?
            .into_iter()
            .map(|stamp| stamp.key)
            .collect())
    }
}

/// In-memory arena: one map per namespace behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    arena: Mutex<HashMap<CacheNamespace, BTreeMap<String, CacheEntry>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in `namespace`.
    pub fn len(&self, namespace: CacheNamespace) -> usize {
        self.arena
            .lock()
            .map(|a| a.get(&namespace).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, namespace: CacheNamespace, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let arena = self.arena.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(arena.get(&namespace).and_then(|ns| ns.get(key)).cloned())
    }

    fn put(&self, namespace: CacheNamespace, entry: CacheEntry) -> Result<(), CacheError> {
        let mut arena = self.arena.lock().map_err(|_| CacheError::Poisoned)?;
        arena
            .entry(namespace)
            .or_default()
            .insert(entry.key.clone(), entry);
        Ok(())
    }

    fn delete(&self, namespace: CacheNamespace, key: &str) -> Result<bool, CacheError> {
        let mut arena = self.arena.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(arena
            .get_mut(&namespace)
            .is_some_and(|ns| ns.remove(key).is_some()))
    }

    fn stamps(&self, namespace: CacheNamespace) -> Result<Vec<EntryStamp>, CacheError> {
        let arena = self.arena.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(arena
            .get(&namespace)
            .map(|ns| ns.values().map(CacheEntry::stamp).collect())
            .unwrap_or_default())
    }
}
