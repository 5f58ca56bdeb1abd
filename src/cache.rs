use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::error::Error;
use crate::types::Number;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

struct Inner {
    entries: LruCache<String, Result<Number, Error>>,
    stats: CacheStats,
}

/// Thread-safe memo of evaluation outcomes keyed by the raw input string,
/// holding at most `capacity` entries and evicting the least recently used.
pub struct ExpressionCache {
    inner: Mutex<Inner>,
}

impl ExpressionCache {
    /// `None` when `capacity` is zero: a cache that can hold nothing is no cache.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            inner: Mutex::new(Inner { entries: LruCache::new(capacity), stats: CacheStats::default() }),
        })
    }

    pub fn get(&self, key: &str) -> Option<Result<Number, Error>> {
        let mut inner = self.inner.lock().ok()?;
        match inner.entries.get(key).cloned() {
            Some(outcome) => {
                inner.stats.hits += 1;
                tracing::trace!(expression = key, "cache hit");
                Some(outcome)
            }
            None => {
                inner.stats.misses += 1;
                tracing::trace!(expression = key, "cache miss");
                None
            }
        }
    }

    pub fn put(&self, key: &str, outcome: Result<Number, Error>) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if let Some((evicted, _)) = inner.entries.push(key.to_string(), outcome) {
            // push hands back the old value when the key was already present
            if evicted != key {
                inner.stats.evictions += 1;
                tracing::trace!(expression = %evicted, "cache eviction");
            }
        }
        inner.stats.entries = inner.entries.len();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().map(|inner| inner.stats.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
            inner.stats = CacheStats::default();
        }
    }
}
