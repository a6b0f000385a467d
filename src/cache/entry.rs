//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A cached value together with the instant it was stored and its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The stored value
    pub data: T,
    /// Insertion timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Lifetime in milliseconds
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stored at `now_ms` living for `ttl_ms`.
    pub fn new(data: T, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            data,
            timestamp: now_ms,
            ttl: ttl_ms,
        }
    }

    /// Last instant (inclusive) at which the entry is still live.
    pub fn expires_at(&self) -> u64 {
        self.timestamp.saturating_add(self.ttl)
    }

    // == Is Live ==
    /// An entry is live while `now <= timestamp + ttl`.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms <= self.expires_at()
    }

    /// Negation of [`CacheEntry::is_live`].
    pub fn is_expired(&self, now_ms: u64) -> bool {
        !self.is_live(now_ms)
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at().saturating_sub(now_ms)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_live_until_boundary_inclusive() {
        let entry = CacheEntry::new("value", 1_000, 500);

        assert!(entry.is_live(1_000));
        assert!(entry.is_live(1_500), "entry is live exactly at timestamp + ttl");
        assert!(entry.is_expired(1_501));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("value", 1_000, 500);

        assert_eq!(entry.ttl_remaining_ms(1_000), 500);
        assert_eq!(entry.ttl_remaining_ms(1_200), 300);
        assert_eq!(entry.ttl_remaining_ms(9_999), 0);
    }

    #[test]
    fn test_expires_at_saturates() {
        let entry = CacheEntry::new((), u64::MAX - 1, 10);
        assert_eq!(entry.expires_at(), u64::MAX);
        assert!(entry.is_live(u64::MAX));
    }
}
