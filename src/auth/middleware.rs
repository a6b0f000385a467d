//! Authentication Middleware
//!
//! Resolves the caller's API key into an [`AuthContext`] before rate
//! limiting and handlers run.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthContext, CachedCredential, CredentialValidator, ADMIN_SCOPE};
use crate::error::{AdmissionError, Result};

/// Reads the presented key from `Authorization: Bearer` or `X-API-Key`.
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    bearer
        .or_else(|| {
            headers
                .get("x-api-key")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
        })
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

/// Rejects requests without a valid API key; otherwise stores the
/// [`CachedCredential`] and its [`AuthContext`] in request extensions.
pub async fn require_api_key(
    State(validator): State<Arc<CredentialValidator>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_api_key(request.headers())
        .ok_or_else(|| AdmissionError::Unauthorized("Missing API key".to_string()))?;

    let credential = validator.validate(&token).await?;

    request.extensions_mut().insert(AuthContext::from(&credential));
    request.extensions_mut().insert(credential);

    Ok(next.run(request).await)
}

/// Requires the admin scope on the credential placed by [`require_api_key`].
pub async fn require_admin_scope(request: Request, next: Next) -> Result<Response> {
    let allowed = request
        .extensions()
        .get::<CachedCredential>()
        .is_some_and(|credential| credential.has_scope(ADMIN_SCOPE));

    if !allowed {
        return Err(AdmissionError::Forbidden(format!(
            "API key lacks the '{}' scope",
            ADMIN_SCOPE
        )));
    }

    Ok(next.run(request).await)
}
