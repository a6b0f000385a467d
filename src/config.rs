//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_CLEANUP_INTERVAL, DEFAULT_CREDENTIAL_TTL};
use crate::rate_limit::{Policy, PolicyLimits};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Lifetime of a cached credential in seconds
    pub credential_ttl: u64,
    /// Background sweep interval in seconds, shared by the cache and every limiter
    pub cleanup_interval: u64,
    /// Per-policy window/limit overrides
    pub policy_limits: HashMap<Policy, PolicyLimits>,
    /// Optional key seeded into the in-memory source with the admin scope
    pub admin_api_key: Option<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CREDENTIAL_TTL` - Cached credential lifetime in seconds (default: 1800)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `RATE_LIMIT_<POLICY>_WINDOW` - Window in seconds for a policy
    /// - `RATE_LIMIT_<POLICY>_LIMIT` - Requests per window for a policy
    /// - `ADMIN_API_KEY` - Bootstrap admin key (unset by default)
    ///
    /// `<POLICY>` is one of `PUBLIC`, `AUTHENTICATED`, `ADMIN`, `API_KEY`,
    /// `AUTH_ATTEMPTS`. Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let policy_limits = Policy::ALL
            .into_iter()
            .map(|policy| {
                let base = policy.default_limits();
                let window = env_parse(&format!("RATE_LIMIT_{}_WINDOW", policy.env_name()))
                    .map(Duration::from_secs)
                    .unwrap_or(base.window);
                let limit = env_parse(&format!("RATE_LIMIT_{}_LIMIT", policy.env_name()))
                    .unwrap_or(base.limit);
                (policy, PolicyLimits { window, limit })
            })
            .collect();

        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(defaults.server_port),
            credential_ttl: env_parse("CREDENTIAL_TTL").unwrap_or(defaults.credential_ttl),
            cleanup_interval: env_parse("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            policy_limits,
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|key| !key.is_empty()),
        }
    }

    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_ttl)
    }

    /// Sweep interval, never shorter than one second.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            credential_ttl: DEFAULT_CREDENTIAL_TTL.as_secs(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL.as_secs(),
            policy_limits: Policy::ALL
                .into_iter()
                .map(|policy| (policy, policy.default_limits()))
                .collect(),
            admin_api_key: None,
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
