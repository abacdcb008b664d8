//! Integration Tests for the Coalescing Cache
//!
//! Exercises the wrapper through the public API with the in-memory backend
//! and with backends that fail.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use coalescing_cache::{CacheBackend, CacheError, CoalescingCache, MemoryCache};

// == Helper Backends ==

/// Backend whose reads always fail.
struct UnreadableCache;

impl CacheBackend for UnreadableCache {
    type Key = String;
    type Value = String;
    type Error = CacheError;

    fn get(&self, _key: &String) -> Result<Option<String>, CacheError> {
        Err(CacheError::Internal("backend offline".to_string()))
    }

    fn set(&self, _key: String, _value: String) -> Result<(), CacheError> {
        Ok(())
    }

    fn delete(&self, _key: &String) -> Result<bool, CacheError> {
        Ok(false)
    }
}

/// Backend that can be read but refuses writes.
#[derive(Default)]
struct ReadOnlyCache {
    inner: MemoryCache<String, String>,
}

impl CacheBackend for ReadOnlyCache {
    type Key = String;
    type Value = String;
    type Error = CacheError;

    fn get(&self, key: &String) -> Result<Option<String>, CacheError> {
        self.inner.get(key)
    }

    fn set(&self, _key: String, _value: String) -> Result<(), CacheError> {
        Err(CacheError::Internal("read only".to_string()))
    }

    fn delete(&self, key: &String) -> Result<bool, CacheError> {
        self.inner.delete(key)
    }
}

// == End-to-End Scenario ==

#[tokio::test]
async fn test_fetch_once_then_serve_from_cache_until_expired() {
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let counter = fetch_calls.clone();
    let cache = CoalescingCache::new(
        MemoryCache::<String, String>::new(),
        move |_key: String, _: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, String>("a-result".to_string())
            }
        },
    );

    let res1 = cache.get("a-key".to_string()).unwrap();
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1, "a call on the first get");
    let res2 = cache.get("a-key".to_string()).unwrap();
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1, "no new call on the second get");

    assert!(res1.ptr_eq(&res2), "both gets share the same handle");

    assert_eq!(res1.clone().await, Ok("a-result".to_string()));
    assert_eq!(res2.await, Ok("a-result".to_string()));

    let res3 = cache.get("a-key".to_string()).unwrap();
    assert!(!res3.ptr_eq(&res1), "served from the cache once the fetch is done");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1, "no new call on the third get");
    assert_eq!(res3.await, Ok("a-result".to_string()));

    cache.delete(&"a-key".to_string()).unwrap();

    let res4 = cache.get("a-key".to_string()).unwrap();
    assert!(!res4.ptr_eq(&res1), "a new handle for the new fetch");
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 2, "another call after expiry");
}

// == Falsy Values ==

async fn assert_cached_without_refetch<V>(value: V)
where
    V: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static,
{
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let counter = fetch_calls.clone();
    let produced = value.clone();
    let fetcher = move |_key: &'static str, _: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        let produced = produced.clone();
        async move { Ok::<_, ()>(produced) }
    };
    let cache = CoalescingCache::new(MemoryCache::<&'static str, V>::new(), fetcher);

    assert_eq!(cache.get("k").unwrap().await, Ok(value.clone()));
    assert_eq!(cache.get("k").unwrap().await, Ok(value));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_falsy_values_are_cache_hits() {
    assert_cached_without_refetch(0i64).await;
    assert_cached_without_refetch(String::new()).await;
    assert_cached_without_refetch(false).await;
    assert_cached_without_refetch(None::<u32>).await;
}

// == Error Propagation ==

#[tokio::test]
async fn test_backend_read_error_is_returned_without_fetching() {
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let counter = fetch_calls.clone();
    let cache = CoalescingCache::new(UnreadableCache, move |key: String, _: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, ()>(key) }
    });

    let result = cache.get("k".to_string());

    assert!(matches!(result, Err(CacheError::Internal(_))));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(cache.in_flight_len(), 0);
}

#[tokio::test]
async fn test_failed_cache_write_still_delivers_value() {
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let counter = fetch_calls.clone();
    let cache = CoalescingCache::new(ReadOnlyCache::default(), move |key: String, _: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, ()>(key.repeat(2)) }
    });

    assert_eq!(cache.get("ab".to_string()).unwrap().await, Ok("abab".to_string()));
    assert_eq!(cache.in_flight_len(), 0);

    // Nothing was cached, so the next lookup fetches again
    assert_eq!(cache.get("ab".to_string()).unwrap().await, Ok("abab".to_string()));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failure_shared_then_retried() {
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let counter = fetch_calls.clone();
    let cache = CoalescingCache::new(
        MemoryCache::<String, String>::new(),
        move |key: String, _: ()| {
            let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                if attempt == 1 {
                    Err(format!("attempt {attempt} for {key} failed"))
                } else {
                    Ok(format!("{key} on attempt {attempt}"))
                }
            }
        },
    );

    let first = cache.get("k".to_string()).unwrap();
    let second = cache.get("k".to_string()).unwrap();
    let (a, b) = tokio::join!(first, second);

    assert_eq!(a, Err("attempt 1 for k failed".to_string()));
    assert_eq!(a, b);
    assert!(!cache.is_in_flight(&"k".to_string()));

    let retry = cache.get("k".to_string()).unwrap().await;
    assert_eq!(retry, Ok("k on attempt 2".to_string()));
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 2);
}

// == Multi-threaded Runtime ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_tasks_share_one_fetch() {
    let fetch_calls = Arc::new(AtomicUsize::new(0));
    let counter = fetch_calls.clone();
    let cache = CoalescingCache::new(
        MemoryCache::<u32, u32>::new(),
        move |key: u32, _: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, ()>(key * 2)
            }
        },
    );

    let barrier = Arc::new(tokio::sync::Barrier::new(16));
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                cache.get(21).unwrap().await
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), Ok(42));
    }
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.in_flight_len(), 0);
}
