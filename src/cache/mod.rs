//! Cache Module
//!
//! Backing store capability, the in-memory store, and lookup statistics.

mod backend;
mod memory;
mod stats;

// Re-export public types
pub use backend::CacheBackend;
pub use memory::MemoryCache;
pub use stats::CoalesceStats;
pub(crate) use stats::StatsRecorder;

// == Public Constants ==
/// Maximum allowed key length in bytes for the HTTP surface
pub const MAX_KEY_LENGTH: usize = 256;
