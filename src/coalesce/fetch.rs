//! Fetcher Module
//!
//! The asynchronous producer invoked when a lookup misses the cache.

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

// == Fetcher ==
/// Computes the value for a key the backing cache does not hold.
///
/// `fetch` is called synchronously while the wrapper holds its in-flight
/// table lock. Until it returns it must not call into the same wrapper:
/// `lookup`, `get`, `in_flight_len`, `is_in_flight`, `stats` and the
/// `Debug` impl all take that lock and would deadlock. Calling them from
/// inside the returned future is fine.
/// Any state the fetch needs is captured by the implementor or passed
/// through `args`.
///
/// Implemented for every `Fn(K, A) -> impl Future<Output = Result<V, E>>`.
pub trait Fetcher<K, A = ()>: Send + Sync + 'static {
    /// Value produced on success
    type Value;
    /// Error produced on failure
    type Error;

    /// Starts a fetch for `key`.
    fn fetch(&self, key: K, args: A) -> BoxFuture<'static, Result<Self::Value, Self::Error>>;
}

impl<K, A, V, E, F, Fut> Fetcher<K, A> for F
where
    F: Fn(K, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    type Value = V;
    type Error = E;

    fn fetch(&self, key: K, args: A) -> BoxFuture<'static, Result<V, E>> {
        (self)(key, args).boxed()
    }
}
