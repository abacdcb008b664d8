//! Memory Cache Module
//!
//! Plain HashMap-backed store implementing [`CacheBackend`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::CacheBackend;
use crate::error::{CacheError, Result};

// == Memory Cache ==
/// In-memory key-value store with no expiry and no size bound.
#[derive(Debug)]
pub struct MemoryCache<K, V> {
    /// Key-value storage
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for MemoryCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty MemoryCache.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<K, V>>> {
        self.entries
            .read()
            .map_err(|_| CacheError::Internal("memory cache lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<K, V>>> {
        self.entries
            .write()
            .map_err(|_| CacheError::Internal("memory cache lock poisoned".to_string()))
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    // == Clear ==
    /// Removes every entry, returning how many were dropped.
    pub fn clear(&self) -> Result<usize> {
        let mut entries = self.write()?;
        let count = entries.len();
        entries.clear();
        Ok(count)
    }
}

impl<K, V> CacheBackend for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;
    type Error = CacheError;

    fn get(&self, key: &K) -> Result<Option<V>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set(&self, key: K, value: V) -> Result<()> {
        self.write()?.insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &K) -> Result<bool> {
        Ok(self.write()?.remove(key).is_some())
    }
}
