//! Rate Limit Middleware
//!
//! Axum middleware gating requests through a [`RateLimiter`]. Attach with
//! `axum::middleware::from_fn_with_state(limiter, enforce_rate_limit)`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::error::AdmissionError;
use crate::rate_limit::{RateLimitInfo, RateLimiter};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Writes the three `X-RateLimit-*` headers.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_secs: u64) {
    headers.insert(X_RATELIMIT_LIMIT, limit.into());
    headers.insert(X_RATELIMIT_REMAINING, remaining.into());
    headers.insert(X_RATELIMIT_RESET, reset_secs.into());
}

/// Counts the request against `limiter` and either rejects it or runs the
/// rest of the stack.
///
/// The counter is committed before `next` runs. When the limiter skips
/// successful or failed requests the booking is taken back once the
/// response status is known.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let key = limiter.key_for(&request);
    let result = limiter.check(&key);
    let options = limiter.options();

    if result.exceeded {
        limiter.notify_limit_reached(&key);

        let retry_after = result.retry_after_secs(limiter.now_ms());
        debug!(
            limiter = %limiter.name(),
            key = %key,
            current = result.current,
            retry_after,
            "Request rejected by rate limiter"
        );

        return AdmissionError::RateLimited {
            message: options.message.clone(),
            status: options.status_code,
            limit: result.limit,
            remaining: result.remaining,
            reset_secs: result.reset_secs(),
            retry_after,
        }
        .into_response();
    }

    request.extensions_mut().insert(RateLimitInfo::from(&result));

    let mut response = next.run(request).await;
    // When limiters are stacked the innermost one, the most specific, reports.
    if !response.headers().contains_key(X_RATELIMIT_LIMIT) {
        apply_rate_limit_headers(
            response.headers_mut(),
            result.limit,
            result.remaining,
            result.reset_secs(),
        );
    }

    if options.should_refund(response.status()) {
        let left = limiter.refund(&key, result.reset_time);
        debug!(limiter = %limiter.name(), key = %key, left, "Rate limit booking refunded");
    }

    response
}
