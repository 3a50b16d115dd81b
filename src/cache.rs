//! Result cache for interpreted transactions.
//!
//! ## Cache Key Design
//!
//! The key is derived from everything that can change a report:
//! - `txid`
//! - `network`
//! - the parameter hash ([`AnalysisParams::params_hash`])
//!
//! Any parameter change therefore results in a cache miss and a fresh
//! analysis. Confirmed transactions never change, so entries are only evicted
//! by capacity.

use std::hash::Hasher;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use crate::config::{AnalysisParams, Network};
use crate::report::TxReport;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => unreachable!(),
};

/// Configuration for the report cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Config with the given capacity; zero disables the cache.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            max_entries,
            enabled: max_entries > 0,
        }
    }
}

/// Cache key for one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnalysisKey(u64);

impl AnalysisKey {
    /// Compute the key from request parameters.
    pub fn compute(txid: &str, network: Network, params: &AnalysisParams) -> Self {
        let mut hasher = Xxh64::new(0);

        hasher.write(txid.as_bytes());
        hasher.write(network.to_string().as_bytes());
        hasher.write(params.params_hash().as_bytes());

        Self(hasher.finish())
    }
}

/// LRU cache of reports, safe to share between tasks.
pub struct ReportCache {
    entries: Mutex<LruCache<AnalysisKey, TxReport>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReportCache {
    /// Create a cache from a config. Returns `None` when disabled.
    pub fn new(config: &CacheConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let size = NonZeroUsize::new(config.max_entries).unwrap_or(FALLBACK_CAPACITY);
        Some(Self {
            entries: Mutex::new(LruCache::new(size)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Look up a report, refreshing its recency on a hit.
    pub fn get(&self, key: &AnalysisKey) -> Option<TxReport> {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a report.
    pub fn put(&self, key: AnalysisKey, report: TxReport) {
        self.entries.lock().put(key, report);
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            len: entries.len(),
            cap: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all entries. Counters are kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that did not.
    pub misses: u64,
}
