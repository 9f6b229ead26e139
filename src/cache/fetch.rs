//! Cached fetch wrapper around external calls
//!
//! `CachedFetcher` is the single entry point tools use to resolve "give me
//! fresh-enough data for this key". It checks the TTL cache, calls the
//! supplied fetch function on miss or expiry, stores successful results, and
//! routes hit/miss counters and fetch latency through the injected metric
//! sink. Errors from the fetch function propagate unchanged and are never
//! cached.
//!
//! There is no request coalescing: two concurrent misses on the same key each
//! perform their own external call. At this tool's call rates that is a
//! documented limitation, not a bug.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::cache::TtlCache;
use crate::error::ExternalCallError;
use crate::observability::MetricSink;

/// Wraps a [`TtlCache`] and a metric sink into the cached-invocation helper
/// every tool shares.
///
/// The cache map sits behind a mutex so a fetcher can be shared by reference
/// from async code; the lock is only held for map lookups and inserts, never
/// across the fetch itself.
pub struct CachedFetcher<V> {
    cache: Mutex<TtlCache<V>>,
    sink: Arc<dyn MetricSink>,
    enabled: bool,
    tool: String,
}

impl<V: Clone> CachedFetcher<V> {
    /// Creates a fetcher for the named tool.
    ///
    /// With `enabled` set to false every call goes straight to the fetch
    /// function and nothing is stored, mirroring a cache-disabled deployment.
    pub fn new(tool: impl Into<String>, sink: Arc<dyn MetricSink>, enabled: bool) -> Self {
        Self {
            cache: Mutex::new(TtlCache::new()),
            sink,
            enabled,
            tool: tool.into(),
        }
    }

    /// Resolves `key` from the cache or by awaiting `fetch`.
    ///
    /// On a hit the cached value is returned immediately and only a
    /// `cache_hit` counter is recorded. On a miss the fetch function runs;
    /// success stores the value under `key` for `ttl` and records the fetch
    /// latency, failure propagates the error and leaves the key absent so
    /// the next call retries.
    pub async fn fetch_with_cache<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, ExternalCallError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ExternalCallError>>,
    {
        let tags = [("tool", self.tool.as_str())];

        if self.enabled {
            let cached = self.lock_cache().get(key).cloned();
            if let Some(value) = cached {
                self.sink.incr("cache_hit", &tags);
                tracing::debug!(tool = %self.tool, key, "cache hit");
                return Ok(value);
            }
        }
        self.sink.incr("cache_miss", &tags);
        tracing::debug!(tool = %self.tool, key, "cache miss, fetching");

        let started = Instant::now();
        let value = fetch().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.sink.timing_ms("fetch_latency_ms", elapsed_ms, &tags);

        if self.enabled {
            self.lock_cache().set(key, value.clone(), ttl);
        }
        Ok(value)
    }

    /// Forces immediate expiry of `key`.
    pub fn invalidate(&self, key: &str) {
        self.lock_cache().invalidate(key);
    }

    /// Whether any entry is cached under `key` right now.
    pub fn contains(&self, key: &str) -> bool {
        self.lock_cache().get(key).is_some()
    }

    fn lock_cache(&self) -> MutexGuard<'_, TtlCache<V>> {
        // A poisoned lock means a panic elsewhere; the map itself is still
        // consistent, so recover the guard rather than propagating the panic.
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
