//! Origin Module
//!
//! Simulated slow upstream used as the fetcher behind the demo server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use crate::coalesce::Fetcher;
use crate::config::Config;
use crate::error::FetchError;

// == Origin ==
/// Upstream that takes `delay` to answer and counts every call it receives.
///
/// Keys starting with `fail_prefix` are answered with [`FetchError::Upstream`].
#[derive(Debug, Clone)]
pub struct Origin {
    delay: Duration,
    fail_prefix: Option<String>,
    calls: Arc<AtomicU64>,
}

impl Origin {
    // == Constructor ==
    /// Creates an Origin with the given latency and failure prefix.
    pub fn new(delay: Duration, fail_prefix: Option<String>) -> Self {
        Self {
            delay,
            fail_prefix,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates an Origin from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Duration::from_millis(config.origin_delay_ms),
            config.origin_fail_prefix.clone(),
        )
    }

    /// Number of fetches this origin (and its clones) has served.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    fn should_fail(&self, key: &str) -> bool {
        self.fail_prefix
            .as_deref()
            .is_some_and(|prefix| !prefix.is_empty() && key.starts_with(prefix))
    }
}

impl Fetcher<String> for Origin {
    type Value = String;
    type Error = FetchError;

    fn fetch(&self, key: String, _args: ()) -> BoxFuture<'static, Result<String, FetchError>> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self.delay;
        let fail = self.should_fail(&key);
        debug!(%key, call, "Origin fetch started");

        async move {
            tokio::time::sleep(delay).await;
            if fail {
                Err(FetchError::Upstream {
                    key,
                    reason: "origin rejected the key".to_string(),
                })
            } else {
                Ok(format!("value-for-{key}"))
            }
        }
        .boxed()
    }
}
