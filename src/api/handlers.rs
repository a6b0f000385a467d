//! API Handlers
//!
//! HTTP request handlers for the admission demo surface.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::error;

use crate::auth::{CachedCredential, CredentialSource, CredentialValidator};
use crate::cache::{CacheStats, CredentialCache};
use crate::config::Config;
use crate::error::{AdmissionError, Result};
use crate::models::{
    HealthResponse, InvalidationResponse, MeResponse, RateLimitStatusResponse, ResetResponse,
    VerifyRequest, VerifyResponse,
};
use crate::rate_limit::{Policy, PolicyRegistry, RateLimitInfo};

/// Application state shared across all handlers.
///
/// Every component is constructed here and injected; nothing is global.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CredentialCache>,
    pub validator: Arc<CredentialValidator>,
    pub policies: PolicyRegistry,
}

impl AppState {
    /// Wires a validator over `cache` and `source`.
    pub fn new(
        cache: Arc<CredentialCache>,
        source: Arc<dyn CredentialSource>,
        policies: PolicyRegistry,
    ) -> Self {
        let validator = Arc::new(CredentialValidator::new(cache.clone(), source));
        Self {
            cache,
            validator,
            policies,
        }
    }

    /// Creates the state from configuration and starts every sweep task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config, source: Arc<dyn CredentialSource>) -> Self {
        let cache = Arc::new(CredentialCache::spawn(
            config.credential_ttl(),
            config.cleanup_interval(),
        ));
        let policies = PolicyRegistry::new(&config.policy_limits);
        policies.start_sweepers(config.cleanup_interval());
        Self::new(cache, source, policies)
    }

    /// Stops the sweep tasks and empties the cache and every limiter.
    pub fn destroy(&self) {
        self.cache.destroy();
        self.policies.destroy();
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for POST /auth/verify
///
/// Checks a key passed in the body. Only failures count towards the
/// auth-attempts window.
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AdmissionError::Unauthorized(error_msg));
    }

    let credential = state.validator.validate(req.api_key.trim()).await?;
    Ok(Json(VerifyResponse::new(credential)))
}

/// Handler for GET /me
pub async fn me_handler(
    Extension(credential): Extension<CachedCredential>,
    rate_limit: Option<Extension<RateLimitInfo>>,
) -> Json<MeResponse> {
    Json(MeResponse {
        credential,
        rate_limit: rate_limit.map(|Extension(info)| info),
    })
}

/// Handler for GET /admin/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for DELETE /admin/keys/:id
pub async fn revoke_key_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InvalidationResponse>> {
    let found = state.validator.revoke(&id).await.map_err(|err| {
        error!("Failed to revoke API key {}: {:#}", id, err);
        AdmissionError::Internal("Failed to revoke API key".to_string())
    })?;

    if !found {
        return Err(AdmissionError::NotFound(format!("API key '{}'", id)));
    }

    Ok(Json(InvalidationResponse::key_revoked(&id)))
}

/// Handler for DELETE /admin/teams/:id
pub async fn delete_team_handler(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Result<Json<InvalidationResponse>> {
    let removed = state.validator.remove_team(&team_id).await.map_err(|err| {
        error!("Failed to remove team {}: {:#}", team_id, err);
        AdmissionError::Internal("Failed to remove team".to_string())
    })?;

    Ok(Json(InvalidationResponse::team_removed(&team_id, removed)))
}

/// Handler for GET /admin/rate-limits/:policy/:key
pub async fn rate_limit_status_handler(
    State(state): State<AppState>,
    Path((policy, key)): Path<(String, String)>,
) -> Result<Json<RateLimitStatusResponse>> {
    let policy: Policy = policy.parse().map_err(AdmissionError::InvalidRequest)?;
    let limiter = state.policies.get(policy);

    let entry = limiter
        .status(&key)
        .ok_or_else(|| AdmissionError::NotFound(format!("No active window for '{}'", key)))?;

    Ok(Json(RateLimitStatusResponse::new(
        policy,
        key,
        limiter.options().limit,
        entry,
    )))
}

/// Handler for DELETE /admin/rate-limits/:policy/:key
pub async fn rate_limit_reset_handler(
    State(state): State<AppState>,
    Path((policy, key)): Path<(String, String)>,
) -> Result<Json<ResetResponse>> {
    let policy: Policy = policy.parse().map_err(AdmissionError::InvalidRequest)?;

    if !state.policies.get(policy).reset(&key) {
        return Err(AdmissionError::NotFound(format!("No window for '{}'", key)));
    }

    Ok(Json(ResetResponse::new(policy, key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credential, InMemoryCredentialSource};
    use std::time::Duration;

    fn test_state() -> (AppState, Arc<InMemoryCredentialSource>) {
        let source = Arc::new(InMemoryCredentialSource::new());
        source.insert(Credential::issue(
            "key_1",
            "team_1",
            "user_1",
            "ci",
            "kg_api_valid",
            vec![],
            chrono::Duration::days(1),
        ));
        let cache = Arc::new(CredentialCache::new(Duration::from_secs(300)));
        let state = AppState::new(cache, source.clone(), PolicyRegistry::default());
        (state, source)
    }

    fn verify_req(key: &str) -> Json<VerifyRequest> {
        Json(VerifyRequest {
            api_key: key.to_string(),
        })
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_verify_handler_caches_credential() {
        let (state, _) = test_state();

        let response = verify_handler(State(state.clone()), verify_req("kg_api_valid"))
            .await
            .unwrap();
        assert!(response.valid);
        assert_eq!(response.credential.id, "key_1");

        let stats = cache_stats_handler(State(state)).await;
        assert_eq!(stats.size, 1);
        assert_eq!(stats.sets, 1);
    }

    #[tokio::test]
    async fn test_verify_handler_rejects_unknown_key() {
        let (state, _) = test_state();

        let result = verify_handler(State(state.clone()), verify_req("kg_api_nope")).await;
        assert!(matches!(result, Err(AdmissionError::Unauthorized(_))));

        let result = verify_handler(State(state), verify_req("other_prefix")).await;
        assert!(matches!(result, Err(AdmissionError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_revoke_key_handler() {
        let (state, _) = test_state();
        verify_handler(State(state.clone()), verify_req("kg_api_valid"))
            .await
            .unwrap();

        let response = revoke_key_handler(State(state.clone()), Path("key_1".to_string()))
            .await
            .unwrap();
        assert_eq!(response.affected, 1);
        assert!(state.cache.is_empty());

        let missing = revoke_key_handler(State(state), Path("key_404".to_string())).await;
        assert!(matches!(missing, Err(AdmissionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_team_handler() {
        let (state, source) = test_state();

        let response = delete_team_handler(State(state), Path("team_1".to_string()))
            .await
            .unwrap();
        assert_eq!(response.affected, 1);
        assert!(source.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_status_and_reset() {
        let (state, _) = test_state();
        let limiter = state.policies.get(Policy::Admin);
        limiter.check("admin:user_1");
        limiter.check("admin:user_1");

        let path = Path(("admin".to_string(), "admin:user_1".to_string()));
        let status = rate_limit_status_handler(State(state.clone()), path)
            .await
            .unwrap();
        assert_eq!(status.current, 2);
        assert_eq!(status.remaining, 48);

        let path = Path(("admin".to_string(), "admin:user_1".to_string()));
        rate_limit_reset_handler(State(state.clone()), path)
            .await
            .unwrap();
        assert!(limiter.status("admin:user_1").is_none());

        let path = Path(("admin".to_string(), "admin:user_1".to_string()));
        let gone = rate_limit_reset_handler(State(state), path).await;
        assert!(matches!(gone, Err(AdmissionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rate_limit_status_unknown_policy() {
        let (state, _) = test_state();

        let path = Path(("premium".to_string(), "x".to_string()));
        let result = rate_limit_status_handler(State(state), path).await;
        assert!(matches!(result, Err(AdmissionError::InvalidRequest(_))));
    }
}
