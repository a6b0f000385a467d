//! Keygate demo server
//!
//! Serves the admission stack over HTTP with an in-memory key source.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keygate::auth::{Credential, InMemoryCredentialSource, ADMIN_SCOPE, API_KEY_PREFIX};
use keygate::{create_router, AppState, Config};

/// Main entry point for the Keygate server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Seed the key source and build the cache and policy registry
/// 4. Start HTTP server on configured port
/// 5. On SIGINT/SIGTERM, stop sweeps and clear all stores
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to info for this crate, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keygate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Keygate admission server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: credential_ttl={}s, cleanup_interval={}s, port={}",
        config.credential_ttl, config.cleanup_interval, config.server_port
    );
    for (policy, limits) in &config.policy_limits {
        info!(
            policy = %policy,
            window_secs = limits.window.as_secs(),
            limit = limits.limit,
            "Rate limit policy configured"
        );
    }

    let source = Arc::new(InMemoryCredentialSource::new());
    match &config.admin_api_key {
        Some(key) if key.starts_with(API_KEY_PREFIX) => {
            source.insert(Credential::issue(
                "admin",
                "system",
                "admin",
                "bootstrap admin key",
                key,
                vec![ADMIN_SCOPE.to_string()],
                chrono::Duration::days(365),
            ));
            info!("Bootstrap admin key registered");
        }
        Some(_) => warn!("ADMIN_API_KEY ignored: key must start with '{}'", API_KEY_PREFIX),
        None => warn!("ADMIN_API_KEY not set, admin routes are unreachable"),
    }

    let state = AppState::from_config(&config, source);
    info!("Credential cache and rate limiters initialized");

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    state.destroy();
    info!("Sweep tasks stopped, stores cleared");

    if let Err(err) = served {
        error!("Server error: {}", err);
        return Err(err.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
