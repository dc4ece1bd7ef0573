//! Cache Statistics Module
//!
//! Counters describing how the cache has been used since it was created.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of the cache counters, returned by `LruTtlCache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// `get` calls that found a live entry
    pub hits: u64,
    /// `get` calls that found nothing live
    pub misses: u64,
    /// Entries dropped to make room at capacity
    pub evictions: u64,
    /// Entries removed by a sweep after their deadline
    pub expirations: u64,
    /// Stored entries, expired ones not yet swept included
    pub total_entries: usize,
}

impl CacheStats {
    /// Fraction of `get` calls that hit, or 0.0 before the first one.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
