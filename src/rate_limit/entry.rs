//! Rate Limit Entry Module
//!
//! Per-key window state and the result derived from it on every lookup.

use serde::Serialize;

// == Rate Limit Entry ==
/// Request count inside the current fixed window for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitEntry {
    /// Requests booked into the window
    pub count: u32,
    /// Instant the window closes (Unix milliseconds)
    pub reset_time: u64,
}

impl RateLimitEntry {
    /// Opens a window at `now_ms` with the first request already booked.
    pub fn start(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_time: now_ms.saturating_add(window_ms),
        }
    }

    /// A window is active while `now < reset_time`.
    pub fn is_active(&self, now_ms: u64) -> bool {
        now_ms < self.reset_time
    }
}

// == Rate Limit Result ==
/// Outcome of counting one request against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitResult {
    pub exceeded: bool,
    pub remaining: u32,
    pub reset_time: u64,
    pub current: u32,
    pub limit: u32,
}

impl RateLimitResult {
    pub fn from_entry(entry: &RateLimitEntry, limit: u32) -> Self {
        Self {
            exceeded: entry.count > limit,
            remaining: limit.saturating_sub(entry.count),
            reset_time: entry.reset_time,
            current: entry.count,
            limit,
        }
    }

    /// Window close as Unix seconds, rounded up.
    pub fn reset_secs(&self) -> u64 {
        self.reset_time.div_ceil(1000)
    }

    /// Seconds until the window closes, rounded up and never below 1.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_time.saturating_sub(now_ms).div_ceil(1000).max(1)
    }
}

/// Rate-limit state handed to downstream handlers through request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub current: u32,
    pub remaining: u32,
    pub reset_time: u64,
}

impl From<&RateLimitResult> for RateLimitInfo {
    fn from(result: &RateLimitResult) -> Self {
        Self {
            limit: result.limit,
            current: result.current,
            remaining: result.remaining,
            reset_time: result.reset_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_active_until_reset_exclusive() {
        let entry = RateLimitEntry::start(1_000, 500);
        assert_eq!(entry.count, 1);
        assert!(entry.is_active(1_499));
        assert!(!entry.is_active(1_500));
    }

    #[test]
    fn test_result_derivation() {
        let entry = RateLimitEntry {
            count: 4,
            reset_time: 10_000,
        };
        let result = RateLimitResult::from_entry(&entry, 3);

        assert!(result.exceeded);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.current, 4);

        let at_limit = RateLimitResult::from_entry(&RateLimitEntry { count: 3, ..entry }, 3);
        assert!(!at_limit.exceeded);
        assert_eq!(at_limit.remaining, 0);
    }

    #[test]
    fn test_reset_and_retry_after_round_up() {
        let result = RateLimitResult::from_entry(
            &RateLimitEntry {
                count: 1,
                reset_time: 60_001,
            },
            10,
        );

        assert_eq!(result.reset_secs(), 61);
        assert_eq!(result.retry_after_secs(0), 61);
        assert_eq!(result.retry_after_secs(59_500), 1);
        assert_eq!(result.retry_after_secs(70_000), 1);
    }
}
