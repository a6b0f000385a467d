//! Policy Registry
//!
//! The fixed set of named limiters placed in front of the API. Each policy
//! owns an independent [`RateLimiter`] with its own window, limit, key
//! generator and message.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::{system_clock, SharedClock};
use crate::rate_limit::{keys, LimitHook, RateLimitOptions, RateLimiter};

// == Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Anonymous traffic, per client IP
    Public,
    /// Authenticated traffic, per user
    Authenticated,
    /// Admin operations, per user
    Admin,
    /// API-key authenticated calls, per user
    ApiKey,
    /// Login and key verification attempts, per client IP
    AuthAttempts,
}

impl Policy {
    pub const ALL: [Policy; 5] = [
        Policy::Public,
        Policy::Authenticated,
        Policy::Admin,
        Policy::ApiKey,
        Policy::AuthAttempts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::Public => "public",
            Policy::Authenticated => "authenticated",
            Policy::Admin => "admin",
            Policy::ApiKey => "api_key",
            Policy::AuthAttempts => "auth_attempts",
        }
    }

    /// Upper-case name used in environment variable overrides.
    pub fn env_name(&self) -> &'static str {
        match self {
            Policy::Public => "PUBLIC",
            Policy::Authenticated => "AUTHENTICATED",
            Policy::Admin => "ADMIN",
            Policy::ApiKey => "API_KEY",
            Policy::AuthAttempts => "AUTH_ATTEMPTS",
        }
    }

    pub fn default_limits(&self) -> PolicyLimits {
        let (minutes, limit) = match self {
            Policy::Public => (15, 1000),
            Policy::Authenticated => (10, 100),
            Policy::Admin => (5, 50),
            Policy::ApiKey => (1, 60),
            Policy::AuthAttempts => (15, 20),
        };
        PolicyLimits {
            window: Duration::from_secs(minutes * 60),
            limit,
        }
    }

    /// Full limiter options for this policy with the given window and limit.
    pub fn options(&self, limits: PolicyLimits) -> RateLimitOptions {
        let PolicyLimits { window, limit } = limits;
        match self {
            Policy::Public => RateLimitOptions::new(window, limit, keys::by_ip("public"))
                .message("Too many requests from this IP"),
            Policy::Authenticated => RateLimitOptions::new(window, limit, keys::by_user("auth"))
                .message("Rate limit exceeded for authenticated user"),
            Policy::Admin => RateLimitOptions::new(window, limit, keys::by_user("admin"))
                .message("Admin rate limit exceeded"),
            Policy::ApiKey => RateLimitOptions::new(window, limit, keys::by_user("api"))
                .message("API rate limit exceeded"),
            Policy::AuthAttempts => {
                let hook: LimitHook = Arc::new(|key: &str| -> anyhow::Result<()> {
                    warn!(key = %key, "Rate limit reached for auth attempts");
                    Ok(())
                });
                RateLimitOptions::new(window, limit, keys::by_ip("auth_attempt"))
                    .message("Too many authentication attempts")
                    .skip_successful_requests(true)
                    .on_limit_reached(hook)
            }
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| format!("Unknown rate limit policy '{}'", s))
    }
}

/// Window and request ceiling of one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyLimits {
    pub window: Duration,
    pub limit: u32,
}

// == Policy Registry ==
/// One limiter per [`Policy`], constructed together and torn down together.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    limiters: HashMap<Policy, Arc<RateLimiter>>,
}

impl PolicyRegistry {
    /// Builds every policy, taking limits from `overrides` where present.
    pub fn new(overrides: &HashMap<Policy, PolicyLimits>) -> Self {
        Self::with_clock(overrides, system_clock())
    }

    pub fn with_clock(overrides: &HashMap<Policy, PolicyLimits>, clock: SharedClock) -> Self {
        let limiters = Policy::ALL
            .into_iter()
            .map(|policy| {
                let limits = overrides
                    .get(&policy)
                    .copied()
                    .unwrap_or_else(|| policy.default_limits());
                let limiter = RateLimiter::with_clock(policy.as_str(), policy.options(limits), clock.clone());
                (policy, Arc::new(limiter))
            })
            .collect();

        Self { limiters }
    }

    /// Starts the sweep task of every limiter.
    pub fn start_sweepers(&self, interval: Duration) {
        for limiter in self.limiters.values() {
            limiter.start_sweeper(interval);
        }
    }

    pub fn get(&self, policy: Policy) -> Arc<RateLimiter> {
        // Every policy is inserted by the constructor.
        self.limiters[&policy].clone()
    }

    /// Stops every sweep task and clears every limiter.
    pub fn destroy(&self) {
        for limiter in self.limiters.values() {
            limiter.destroy();
        }
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new(&HashMap::new())
    }
}
