//! Response DTOs for the admission API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::auth::CachedCredential;
use crate::rate_limit::{Policy, RateLimitEntry, RateLimitInfo};

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for POST /auth/verify
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub credential: CachedCredential,
}

impl VerifyResponse {
    pub fn new(credential: CachedCredential) -> Self {
        Self {
            valid: true,
            credential,
        }
    }
}

/// Response body for GET /me: the caller's credential and its current quota
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub credential: CachedCredential,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}

/// Response body for the key and team invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidationResponse {
    pub message: String,
    /// Credentials affected at the source
    pub affected: usize,
}

impl InvalidationResponse {
    pub fn key_revoked(id: &str) -> Self {
        Self {
            message: format!("API key '{}' revoked", id),
            affected: 1,
        }
    }

    pub fn team_removed(team_id: &str, affected: usize) -> Self {
        Self {
            message: format!("Removed {} API key(s) of team '{}'", affected, team_id),
            affected,
        }
    }
}

/// Response body for GET /admin/rate-limits/:policy/:key
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatusResponse {
    pub policy: Policy,
    pub key: String,
    pub limit: u32,
    pub current: u32,
    pub remaining: u32,
    /// Window end in epoch milliseconds
    pub reset_time: u64,
}

impl RateLimitStatusResponse {
    pub fn new(policy: Policy, key: impl Into<String>, limit: u32, entry: RateLimitEntry) -> Self {
        Self {
            policy,
            key: key.into(),
            limit,
            current: entry.count,
            remaining: limit.saturating_sub(entry.count),
            reset_time: entry.reset_time,
        }
    }
}

/// Response body for DELETE /admin/rate-limits/:policy/:key
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub policy: Policy,
    pub key: String,
}

impl ResetResponse {
    pub fn new(policy: Policy, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Rate limit for '{}' under '{}' reset", key, policy),
            policy,
            key,
        }
    }
}

/// Error response body for all non rate-limit error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_status_response_remaining_saturates() {
        let entry = RateLimitEntry {
            count: 12,
            reset_time: 5_000,
        };
        let resp = RateLimitStatusResponse::new(Policy::Admin, "admin:u1", 10, entry);
        assert_eq!(resp.remaining, 0);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["policy"], "admin");
        assert_eq!(json["current"], 12);
    }

    #[test]
    fn test_team_removed_message() {
        let resp = InvalidationResponse::team_removed("team_9", 3);
        assert_eq!(resp.affected, 3);
        assert!(resp.message.contains("team_9"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
