//! Rate Limit Module
//!
//! Fixed-window request counting per key, the axum middleware that enforces
//! it, and the registry of named policies.

mod entry;
pub mod keys;
mod limiter;
mod middleware;
mod policy;
mod store;


// Re-export public types
pub use entry::{RateLimitEntry, RateLimitInfo, RateLimitResult};
pub use limiter::{KeyGenerator, LimitHook, RateLimitOptions, RateLimiter, DEFAULT_LIMIT_MESSAGE};
pub use middleware::{
    apply_rate_limit_headers, enforce_rate_limit, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING,
    X_RATELIMIT_RESET,
};
pub use policy::{Policy, PolicyLimits, PolicyRegistry};
pub use store::RateLimitStore;
