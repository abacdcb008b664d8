//! Coalescing Cache Module
//!
//! Wraps a [`CacheBackend`] so that concurrent misses for the same key share
//! one in-flight [`Fetcher`] call.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CoalesceStats, StatsRecorder};
use crate::coalesce::{Fetcher, Lookup};

type Key<C> = <C as CacheBackend>::Key;
type Value<C> = <C as CacheBackend>::Value;
type FetchErr<C, F, A> = <F as Fetcher<Key<C>, A>>::Error;
type InFlightTable<C, F, A> = HashMap<Key<C>, Lookup<Value<C>, FetchErr<C, F, A>>>;

// == Coalescing Cache ==
/// A cache whose lookups fall back to a fetcher, with at most one fetch per
/// key in flight.
///
/// Clones share the backend, the fetcher and the in-flight table.
///
/// # Example
/// ```ignore
/// let cache = CoalescingCache::new(MemoryCache::new(), |key: String, _: ()| async move {
///     Ok::<_, FetchError>(format!("value-for-{key}"))
/// });
/// let first = cache.get("a".to_string())?;
/// let second = cache.get("a".to_string())?;
/// assert!(first.ptr_eq(&second));
/// ```
pub struct CoalescingCache<C, F, A = ()>
where
    C: CacheBackend,
    F: Fetcher<C::Key, A>,
{
    inner: Arc<Inner<C, F, A>>,
}

struct Inner<C, F, A>
where
    C: CacheBackend,
    F: Fetcher<C::Key, A>,
{
    backend: C,
    fetcher: F,
    /// Pending fetches, removed by the fetch itself on settlement
    in_flight: Mutex<InFlightTable<C, F, A>>,
    stats: StatsRecorder,
    _args: PhantomData<fn(A)>,
}

impl<C, F, A> Inner<C, F, A>
where
    C: CacheBackend,
    F: Fetcher<C::Key, A>,
{
    /// The table holds plain handles, so a panic elsewhere cannot leave it inconsistent.
    fn lock_in_flight(&self) -> MutexGuard<'_, InFlightTable<C, F, A>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C, F, A> CoalescingCache<C, F, A>
where
    C: CacheBackend,
    C::Key: fmt::Debug,
    F: Fetcher<C::Key, A, Value = C::Value>,
    F::Error: Clone + Send + Sync + 'static,
    A: 'static,
{
    // == Constructor ==
    /// Composes `backend` with `fetcher`.
    pub fn new(backend: C, fetcher: F) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                fetcher,
                in_flight: Mutex::new(HashMap::new()),
                stats: StatsRecorder::default(),
                _args: PhantomData,
            }),
        }
    }

    // == Lookup ==
    /// Looks up `key`, fetching it with `args` on a miss.
    ///
    /// - Hit: returns a handle already carrying the cached value.
    /// - Miss with a fetch pending for `key`: returns that fetch's handle.
    /// - Otherwise: invokes the fetcher, registers its handle and returns it.
    ///
    /// When the fetch settles its entry leaves the in-flight table, and on
    /// success the value is written to the backend. Failures reach every
    /// holder of the handle and nothing is cached.
    ///
    /// Errors from the backend's `get` are returned as-is.
    pub fn lookup(&self, key: C::Key, args: A) -> Result<Lookup<C::Value, F::Error>, C::Error> {
        if let Some(value) = self.inner.backend.get(&key)? {
            self.inner.stats.record_hit();
            return Ok(Lookup::ready(value));
        }

        let mut in_flight = self.inner.lock_in_flight();
        if let Some(pending) = in_flight.get(&key) {
            self.inner.stats.record_coalesced();
            debug!(?key, "Joining in-flight fetch");
            return Ok(pending.clone());
        }

        // A fetch may have settled and populated the backend since the first read.
        if let Some(value) = self.inner.backend.get(&key)? {
            self.inner.stats.record_hit();
            return Ok(Lookup::ready(value));
        }

        self.inner.stats.record_miss();
        debug!(?key, "Cache miss, starting fetch");

        let fetch = self.inner.fetcher.fetch(key.clone(), args);
        let lookup = Lookup::pending(settle(Arc::clone(&self.inner), key.clone(), fetch));
        in_flight.insert(key, lookup.clone());
        drop(in_flight);

        // Drive the fetch to completion even if every caller drops its handle.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(lookup.clone());
        }

        Ok(lookup)
    }

    // == Get ==
    /// Looks up `key` with default fetch arguments.
    pub fn get(&self, key: C::Key) -> Result<Lookup<C::Value, F::Error>, C::Error>
    where
        A: Default,
    {
        self.lookup(key, A::default())
    }

    // == Set ==
    /// Writes straight through to the backend.
    pub fn set(&self, key: C::Key, value: C::Value) -> Result<(), C::Error> {
        self.inner.backend.set(key, value)
    }

    // == Delete ==
    /// Removes `key` from the backend. A fetch already in flight for the key
    /// is unaffected and will repopulate it.
    pub fn delete(&self, key: &C::Key) -> Result<bool, C::Error> {
        self.inner.backend.delete(key)
    }

    /// Returns the wrapped backend.
    pub fn backend(&self) -> &C {
        &self.inner.backend
    }

    /// Returns the fetcher.
    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    /// Number of fetches currently outstanding.
    pub fn in_flight_len(&self) -> usize {
        self.inner.lock_in_flight().len()
    }

    /// Whether a fetch for `key` is outstanding.
    pub fn is_in_flight(&self, key: &C::Key) -> bool {
        self.inner.lock_in_flight().contains_key(key)
    }

    // == Stats ==
    /// Returns a snapshot of the lookup counters.
    pub fn stats(&self) -> CoalesceStats {
        self.inner.stats.snapshot(self.in_flight_len())
    }
}

/// Awaits the fetch, then clears its table entry and caches a success.
///
/// Both outcomes clear the entry on their own branch. The entry is removed
/// and the value written under the table lock, so a lookup never sees the
/// key absent from both the table and a freshly populated backend.
///
/// A fetch that panics also clears its entry before the panic resumes, so
/// the next lookup starts a fresh fetch instead of joining a poisoned handle.
async fn settle<C, F, A>(
    inner: Arc<Inner<C, F, A>>,
    key: C::Key,
    fetch: BoxFuture<'static, Result<C::Value, F::Error>>,
) -> Result<C::Value, F::Error>
where
    C: CacheBackend,
    C::Key: fmt::Debug,
    F: Fetcher<C::Key, A, Value = C::Value>,
{
    let outcome = match AssertUnwindSafe(fetch).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            inner.lock_in_flight().remove(&key);
            inner.stats.record_fetch_failure();
            warn!(?key, "Fetch panicked, in-flight entry cleared");
            panic::resume_unwind(payload);
        }
    };

    match &outcome {
        Ok(value) => {
            let mut in_flight = inner.lock_in_flight();
            in_flight.remove(&key);
            if inner.backend.set(key.clone(), value.clone()).is_err() {
                warn!(?key, "Fetched value could not be written to the cache");
            } else {
                debug!(?key, "Fetch settled, value cached");
            }
        }
        Err(_) => {
            inner.lock_in_flight().remove(&key);
            inner.stats.record_fetch_failure();
            debug!(?key, "Fetch failed, nothing cached");
        }
    }

    outcome
}

impl<C, F, A> Clone for CoalescingCache<C, F, A>
where
    C: CacheBackend,
    F: Fetcher<C::Key, A>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, F, A> fmt::Debug for CoalescingCache<C, F, A>
where
    C: CacheBackend,
    F: Fetcher<C::Key, A>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoalescingCache")
            .field("in_flight", &self.inner.lock_in_flight().len())
            .finish_non_exhaustive()
    }
}
