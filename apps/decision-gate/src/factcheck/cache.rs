//! Bounded validation cache.
//!
//! Keyed by a blake3 hash of the claim text and the trading date, so the
//! same claim re-checked later in the same session is free, while
//! yesterday's answer can never leak into today. Insertion-order (FIFO)
//! eviction keeps the memory bound hard; the host clears the cache at
//! day boundaries.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::factcheck::types::FactCheckResult;

/// Cache key: blake3 of claim text + trading date.
pub type CacheKey = [u8; 32];

/// Derive the cache key for a claim on a trading date.
#[must_use]
pub fn cache_key(claim: &str, trading_date: NaiveDate) -> CacheKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(claim.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(trading_date.to_string().as_bytes());
    *hasher.finalize().as_bytes()
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, FactCheckResult>,
    order: VecDeque<CacheKey>,
}

/// Thread-safe FIFO cache of fact-check results.
///
/// All methods take `&self`; cycles running concurrently share one cache
/// behind an `Arc`. The lock is held only for map operations, never
/// across any await point.
#[derive(Debug)]
pub struct ValidationCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl ValidationCache {
    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Look up a previous result. The returned copy is marked `cached`.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<FactCheckResult> {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.get(key).map(|result| {
            let mut hit = result.clone();
            hit.cached = true;
            hit
        })
    }

    /// Store a result, evicting the oldest entry at capacity.
    pub fn insert(&self, key: CacheKey, result: FactCheckResult) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, result);
            return;
        }
        while inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
        inner.order.push_back(key);
        inner.entries.insert(key, result);
    }

    /// Drop every entry. Called by the host at trading-day boundaries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.clear();
        inner.order.clear();
    }

    /// Current entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
