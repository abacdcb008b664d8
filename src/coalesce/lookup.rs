//! Lookup Handle Module
//!
//! The shared result handle handed to every caller of a lookup.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;

// == Lookup ==
/// Handle to the outcome of a lookup.
///
/// Cloning a handle yields another reference to the same computation. Every
/// caller that joins an in-flight fetch receives a clone of the same handle,
/// which [`Lookup::ptr_eq`] makes observable.
#[must_use = "a lookup handle does nothing unless awaited"]
pub struct Lookup<V, E> {
    inner: Shared<BoxFuture<'static, Result<V, E>>>,
}

impl<V, E> Lookup<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wraps a pending computation.
    pub(crate) fn pending<Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            inner: fut.boxed().shared(),
        }
    }

    /// Creates a handle already carrying `value`.
    ///
    /// The handle is settled on return, so `peek` sees the value at once.
    pub fn ready(value: V) -> Self {
        let lookup = Self::pending(future::ready(Ok(value)));
        // A ready future completes on its first poll
        let _ = lookup.inner.clone().now_or_never();
        lookup
    }

    /// Returns the outcome if the handle has already settled.
    pub fn peek(&self) -> Option<&Result<V, E>> {
        self.inner.peek()
    }

    /// Whether the handle has settled.
    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }

    /// Whether both handles refer to the same computation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<V, E> Clone for Lookup<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V, E> Future for Lookup<V, E>
where
    V: Clone,
    E: Clone,
{
    type Output = Result<V, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl<V, E> fmt::Debug for Lookup<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lookup").finish_non_exhaustive()
    }
}
