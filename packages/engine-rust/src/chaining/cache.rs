//! Resolution cache: route signature -> previously resolved [`ChainBundle`].
//!
//! Bounded by entry count (via `quick_cache`) and by idle time. Expiry is
//! checked lazily on access: an entry idle for longer than the timeout is
//! dropped and resolved again. Concurrent misses on one key are coalesced by
//! `quick_cache`'s placeholder guard, so each key is resolved once.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use quick_cache::sync::Cache;

use super::keys::CacheKey;
use super::resolver::ChainBundle;
use crate::config::EngineConfig;

/// Point-in-time counters of cache activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
}

struct CachedChain {
    bundle: Arc<ChainBundle>,
    last_access: Mutex<Instant>,
}

impl CachedChain {
    fn new(bundle: ChainBundle) -> Self {
        Self {
            bundle: Arc::new(bundle),
            last_access: Mutex::new(Instant::now()),
        }
    }

    /// Refreshes the access time unless the entry has been idle too long.
    fn touch(&self, idle_timeout: Duration) -> bool {
        let now = Instant::now();
        let mut last = self.last_access.lock();
        if now.duration_since(*last) > idle_timeout {
            return false;
        }
        *last = now;
        true
    }
}

/// Removes `stale` from `entries`, leaving any entry another dispatch
/// inserted under `key` in the meantime.
fn evict_stale(entries: &Cache<CacheKey, Arc<CachedChain>>, key: &CacheKey, stale: &Arc<CachedChain>) {
    entries.remove_if(key, |current| Arc::ptr_eq(current, stale));
}

/// Thread-safe cache of resolved chains, owned by the executor.
pub struct ResolutionCache {
    /// `None` when caching is disabled (capacity 0).
    entries: Option<Cache<CacheKey, Arc<CachedChain>>>,
    idle_timeout: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
}

impl ResolutionCache {
    /// Creates a cache holding up to `capacity` chains. A capacity of `0`
    /// disables caching.
    #[must_use]
    pub fn new(capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            entries: (capacity > 0).then(|| Cache::new(capacity)),
            idle_timeout,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_capacity, config.cache_idle_timeout)
    }

    /// Returns the cached chain for `key`, running `resolve` on a miss.
    ///
    /// `resolve` must be free of side effects: whether it runs is a caching
    /// detail invisible to the dispatch outcome.
    pub fn get_or_resolve<F>(&self, key: &CacheKey, resolve: F) -> Arc<ChainBundle>
    where
        F: FnOnce() -> ChainBundle,
    {
        let Some(entries) = &self.entries else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Arc::new(resolve());
        };

        if let Some(entry) = entries.get(key) {
            if entry.touch(self.idle_timeout) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, "chain cache hit");
                return entry.bundle.clone();
            }
            self.expirations.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "chain cache entry expired");
            evict_stale(entries, key, &entry);
        }

        let mut resolved_here = false;
        let entry = entries
            .get_or_insert_with(key, || {
                resolved_here = true;
                Ok::<_, Infallible>(Arc::new(CachedChain::new(resolve())))
            })
            .unwrap_or_else(|never| match never {});

        if resolved_here {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key, "chain cache miss");
        } else {
            // Another dispatch resolved the same key while we waited.
            self.hits.fetch_add(1, Ordering::Relaxed);
            entry.touch(self.idle_timeout);
        }
        entry.bundle.clone()
    }

    /// Number of cached chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Cache::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether caching is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Drops every cached chain. Counters are kept.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.clear();
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}
