//! Key Generators
//!
//! Functions that map a request to its rate-limit bucket. Whatever is missing
//! from the request (no client address, no auth context) degrades to the
//! literal `unknown` bucket so the request is still limited.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderMap;

use crate::auth::AuthContext;
use crate::rate_limit::KeyGenerator;

/// Bucket id used when the request does not carry the expected identity.
pub const UNKNOWN: &str = "unknown";

/// Client address from `X-Forwarded-For` (first hop), then `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded.or_else(real_ip).unwrap_or(UNKNOWN).to_string()
}

/// `<prefix>:<client ip>`
pub fn by_ip(prefix: &'static str) -> KeyGenerator {
    Arc::new(move |request: &Request| format!("{}:{}", prefix, client_ip(request.headers())))
}

/// `<prefix>:<user id>` from the request's [`AuthContext`].
pub fn by_user(prefix: &'static str) -> KeyGenerator {
    Arc::new(move |request: &Request| {
        let user = request
            .extensions()
            .get::<AuthContext>()
            .map(|ctx| ctx.user_id.as_str())
            .unwrap_or(UNKNOWN);
        format!("{}:{}", prefix, user)
    })
}

/// `<prefix>:<team id>` from the request's [`AuthContext`].
pub fn by_team(prefix: &'static str) -> KeyGenerator {
    Arc::new(move |request: &Request| {
        let team = request
            .extensions()
            .get::<AuthContext>()
            .map(|ctx| ctx.team_id.as_str())
            .unwrap_or(UNKNOWN);
        format!("{}:{}", prefix, team)
    })
}
