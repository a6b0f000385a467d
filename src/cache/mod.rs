//! Cache Module
//!
//! Provides the in-memory credential cache with TTL expiration and
//! hit/miss accounting.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CredentialCache;

use std::time::Duration;

// == Public Constants ==
/// Default lifetime of a cached credential
pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(30 * 60);

/// Default interval between background sweeps
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);
