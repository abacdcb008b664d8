//! Coalescing Statistics Module
//!
//! Tracks lookup outcomes: hits, misses, coalesced joins and fetches.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Coalesce Stats ==
/// Point-in-time snapshot of a wrapper's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoalesceStats {
    /// Lookups answered straight from the backing cache
    pub hits: u64,
    /// Lookups that missed the cache and started a fetch
    pub misses: u64,
    /// Lookups that missed the cache and joined a pending fetch
    pub coalesced: u64,
    /// Fetches started
    pub fetches: u64,
    /// Fetches that settled with an error
    pub fetch_failures: u64,
    /// Fetches outstanding when the snapshot was taken
    pub in_flight: usize,
}

impl CoalesceStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses + coalesced), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.coalesced;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by every clone of a wrapper.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A miss always starts a fetch.
    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, in_flight: usize) -> CoalesceStats {
        CoalesceStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            in_flight,
        }
    }
}
