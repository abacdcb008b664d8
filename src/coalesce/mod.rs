//! Coalesce Module
//!
//! Request coalescing in front of a cache backend: concurrent misses for one
//! key share a single fetch.

mod fetch;
mod lookup;
mod wrapper;


// Re-export public types
pub use fetch::Fetcher;
pub use lookup::Lookup;
pub use wrapper::CoalescingCache;
