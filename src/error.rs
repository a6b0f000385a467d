//! Error types for the admission layer
//!
//! Provides unified error handling using thiserror. Cache misses and expired
//! entries are ordinary outcomes and never show up here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::rate_limit::apply_rate_limit_headers;

// == Admission Error Enum ==
/// Unified error type for the admission layer.
#[derive(Error, Debug)]
pub enum AdmissionError {
    /// Request rejected by a rate limiter
    #[error("{message}")]
    RateLimited {
        message: String,
        status: StatusCode,
        limit: u32,
        remaining: u32,
        reset_secs: u64,
        retry_after: u64,
    },

    /// Missing or invalid API key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid key lacking a required scope
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AdmissionError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AdmissionError::RateLimited {
                message,
                status,
                limit,
                remaining,
                reset_secs,
                retry_after,
            } => {
                let mut response = (*status, Json(json!({ "message": message }))).into_response();
                let headers = response.headers_mut();
                apply_rate_limit_headers(headers, *limit, *remaining, *reset_secs);
                headers.insert(axum::http::header::RETRY_AFTER, (*retry_after).into());
                return response;
            }
            AdmissionError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AdmissionError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AdmissionError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AdmissionError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AdmissionError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the admission layer.
pub type Result<T> = std::result::Result<T, AdmissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_response_carries_headers() {
        let response = AdmissionError::RateLimited {
            message: "Too many requests from this IP".to_string(),
            status: StatusCode::TOO_MANY_REQUESTS,
            limit: 2,
            remaining: 0,
            reset_secs: 1_700_000_060,
            retry_after: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers["retry-after"], "42");
        assert_eq!(headers["x-ratelimit-limit"], "2");
        assert_eq!(headers["x-ratelimit-remaining"], "0");
        assert_eq!(headers["x-ratelimit-reset"], "1700000060");
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (AdmissionError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AdmissionError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AdmissionError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AdmissionError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (AdmissionError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
