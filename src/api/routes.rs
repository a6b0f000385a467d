//! API Routes
//!
//! Configures the Axum router and places the admission middleware in front
//! of each route group.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, delete_team_handler, health_handler, me_handler,
    rate_limit_reset_handler, rate_limit_status_handler, revoke_key_handler, verify_handler,
    AppState,
};
use crate::auth::{require_admin_scope, require_api_key};
use crate::rate_limit::{enforce_rate_limit, Policy};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check (public policy)
/// - `POST /auth/verify` - Verify a key (auth-attempts policy)
/// - `GET /me` - Caller's credential (API key, api_key policy)
/// - `GET /admin/cache/stats` - Credential cache statistics
/// - `DELETE /admin/keys/:id` - Revoke a key
/// - `DELETE /admin/teams/:id` - Remove a team's keys
/// - `GET|DELETE /admin/rate-limits/:policy/:key` - Inspect or reset a window
///
/// Admin routes need an API key carrying the admin scope and run under the
/// admin policy. Every route that resolves an API key sits behind the
/// IP-keyed auth-attempts limiter, so rejected keys are counted per client
/// before the credential source is consulted.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // Layers run bottom to top: the API key is resolved before any
    // user-keyed limiter reads it.
    let key_attempts = state.policies.get(Policy::AuthAttempts);

    let public: Router<AppState> = Router::new()
        .route("/health", get(health_handler))
        .route_layer(from_fn_with_state(
            state.policies.get(Policy::Public),
            enforce_rate_limit,
        ));

    let auth_attempts: Router<AppState> = Router::new()
        .route("/auth/verify", post(verify_handler))
        .route_layer(from_fn_with_state(
            key_attempts.clone(),
            enforce_rate_limit,
        ));

    let api: Router<AppState> = Router::new()
        .route("/me", get(me_handler))
        .route_layer(from_fn_with_state(
            state.policies.get(Policy::ApiKey),
            enforce_rate_limit,
        ))
        .route_layer(from_fn_with_state(state.validator.clone(), require_api_key))
        .route_layer(from_fn_with_state(key_attempts.clone(), enforce_rate_limit));

    let admin: Router<AppState> = Router::new()
        .route("/admin/cache/stats", get(cache_stats_handler))
        .route("/admin/keys/:id", delete(revoke_key_handler))
        .route("/admin/teams/:id", delete(delete_team_handler))
        .route(
            "/admin/rate-limits/:policy/:key",
            get(rate_limit_status_handler).delete(rate_limit_reset_handler),
        )
        .route_layer(from_fn_with_state(
            state.policies.get(Policy::Admin),
            enforce_rate_limit,
        ))
        .route_layer(from_fn(require_admin_scope))
        .route_layer(from_fn_with_state(state.validator.clone(), require_api_key))
        .route_layer(from_fn_with_state(key_attempts, enforce_rate_limit));

    Router::new()
        .merge(public)
        .merge(auth_attempts)
        .merge(api)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
