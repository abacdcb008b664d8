//! Cache Backend Module
//!
//! Capability trait for the synchronous key-value stores the coalescing
//! wrapper sits in front of.

use std::hash::Hash;
use std::sync::Arc;

// == Cache Backend ==
/// Synchronous key-value store consulted before any fetch is issued.
///
/// `get` returns `Ok(None)` for a missing key and `Ok(Some(value))` for every
/// stored value, whatever that value is. Errors returned from `get` are
/// surfaced to lookup callers unchanged.
pub trait CacheBackend: Send + Sync + 'static {
    /// Key type
    type Key: Eq + Hash + Clone + Send + Sync + 'static;
    /// Stored value type
    type Value: Clone + Send + Sync + 'static;
    /// Error produced by the store itself
    type Error;

    /// Reads the value stored under `key`.
    fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error>;

    /// Stores `value` under `key`, overwriting any prior value.
    fn set(&self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error>;

    /// Removes `key`, returning whether an entry was present.
    fn delete(&self, key: &Self::Key) -> Result<bool, Self::Error>;
}

impl<C: CacheBackend> CacheBackend for Arc<C> {
    type Key = C::Key;
    type Value = C::Value;
    type Error = C::Error;

    fn get(&self, key: &Self::Key) -> Result<Option<Self::Value>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: Self::Key, value: Self::Value) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &Self::Key) -> Result<bool, Self::Error> {
        (**self).delete(key)
    }
}
