//! Rate Limit Store
//!
//! Key to window map implementing fixed-window counting. Callers hold the
//! owning lock for the whole of each method, so every read-modify-write is a
//! single critical section.

use std::collections::HashMap;

use crate::rate_limit::{RateLimitEntry, RateLimitResult};
use crate::tasks::Sweep;

#[derive(Debug, Default)]
pub struct RateLimitStore {
    entries: HashMap<String, RateLimitEntry>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit ==
    /// Books one request for `key` and returns the resulting state.
    ///
    /// Starts a fresh window when none is active, otherwise increments the
    /// count in place.
    pub fn hit(&mut self, key: &str, now_ms: u64, window_ms: u64, limit: u32) -> RateLimitResult {
        let entry = match self.entries.get_mut(key) {
            Some(entry) if entry.is_active(now_ms) => {
                entry.count = entry.count.saturating_add(1);
                *entry
            }
            _ => {
                let fresh = RateLimitEntry::start(now_ms, window_ms);
                self.entries.insert(key.to_string(), fresh);
                fresh
            }
        };

        RateLimitResult::from_entry(&entry, limit)
    }

    // == Refund ==
    /// Takes back one request booked in the window ending at `reset_time`.
    /// An entry reaching zero is removed.
    ///
    /// A window that has since been replaced is left alone. Returns the count
    /// left for the key.
    pub fn refund(&mut self, key: &str, reset_time: u64) -> u32 {
        let Some(entry) = self.entries.get_mut(key) else {
            return 0;
        };
        if entry.reset_time != reset_time {
            return entry.count;
        }

        entry.count = entry.count.saturating_sub(1);
        let left = entry.count;
        if left == 0 {
            self.entries.remove(key);
        }
        left
    }

    /// Drops the window for `key`. Returns whether one existed.
    pub fn reset(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns the active window for `key` without counting a request.
    pub fn status(&self, key: &str, now_ms: u64) -> Option<RateLimitEntry> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_active(now_ms))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Sweep for RateLimitStore {
    fn sweep_expired(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_active(now_ms));
        before - self.entries.len()
    }
}
