//! Keygate - request admission for HTTP services
//!
//! A TTL credential cache in front of an authoritative API key source, and
//! fixed-window rate limiting applied per policy as axum middleware.

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod tasks;

pub use api::{create_router, AppState};
pub use auth::{CredentialSource, CredentialValidator, InMemoryCredentialSource};
pub use cache::CredentialCache;
pub use config::Config;
pub use error::{AdmissionError, Result};
pub use rate_limit::{enforce_rate_limit, Policy, PolicyRegistry, RateLimitOptions, RateLimiter};
