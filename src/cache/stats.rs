//! Cache Statistics Module
//!
//! Tracks credential cache lookups, writes and removals.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of credential cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries written
    pub sets: u64,
    /// Entries removed explicitly (not by expiry)
    pub deletes: u64,
    /// Entries currently held, including expired ones not yet swept
    pub size: usize,
    /// hits / (hits + misses), 0.0 before the first lookup
    pub hit_rate: f64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn compute_hit_rate(&self) -> f64 {
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

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Adds `count` removals.
    pub fn record_deletes(&mut self, count: usize) {
        self.deletes += count as u64;
    }

    /// Returns a copy with `size` and `hit_rate` filled in.
    pub fn snapshot(&self, size: usize) -> Self {
        Self {
            size,
            hit_rate: self.compute_hit_rate(),
            ..self.clone()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.sets, 0);
        assert_eq!(stats.deletes, 0);
        assert_eq!(stats.size, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        let stats = CacheStats::new();
        assert_eq!(stats.compute_hit_rate(), 0.0);
        assert_eq!(stats.snapshot(0).hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.compute_hit_rate(), 0.75);
    }

    #[test]
    fn test_record_deletes_accumulates() {
        let mut stats = CacheStats::new();
        stats.record_deletes(2);
        stats.record_deletes(0);
        stats.record_deletes(3);
        assert_eq!(stats.deletes, 5);
    }

    #[test]
    fn test_snapshot_fills_derived_fields() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_set();

        let snap = stats.snapshot(7);
        assert_eq!(snap.size, 7);
        assert_eq!(snap.hit_rate, 0.5);
        assert_eq!(snap.sets, 1);
    }
}
