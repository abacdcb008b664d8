//! Coalescing Cache - request coalescing in front of a key-value cache
//!
//! Concurrent lookups that miss the cache share a single in-flight fetch.
//! Ships with an in-memory backend and a small HTTP demo server.

pub mod api;
pub mod cache;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod models;
pub mod origin;

pub use api::AppState;
pub use cache::{CacheBackend, CoalesceStats, MemoryCache};
pub use coalesce::{CoalescingCache, Fetcher, Lookup};
pub use config::Config;
pub use error::{CacheError, FetchError};
pub use origin::Origin;
