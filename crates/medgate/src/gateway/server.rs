//! Gateway HTTP server
//!
//! Builds the axum router, wires the security middleware around every
//! route, and runs the listener with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{MedgateError, Result};
use crate::gateway::chat::{chat_handler, create_chat_handler};
use crate::gateway::upstream::UpstreamClient;
use crate::security::middleware::security_middleware;
use crate::security::rate_limit::{RateLimitStore, RouteLimits};

/// Shared state behind every handler and the security middleware
pub struct AppState {
    pub config: Config,
    pub limiter: RateLimitStore,
    pub upstream: UpstreamClient,
}

/// Build shared state from a loaded configuration
pub fn build_state(config: Config) -> Result<Arc<AppState>> {
    let limits = RouteLimits::with_overrides(&config.security.rate_limits);
    let limiter = RateLimitStore::new(limits, config.security.sweep_probability);
    let upstream = UpstreamClient::new(config.upstream.clone())?;

    Ok(Arc::new(AppState {
        config,
        limiter,
        upstream,
    }))
}

/// Build the gateway router with the security middleware wrapped around
/// every route
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/create-chat", post(create_chat_handler))
        .route("/api/health", get(health_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct GatewayServer {
    config: Config,
}

impl GatewayServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn serve(&self) -> Result<()> {
        let state = build_state(self.config.clone())?;
        let app = create_router(state);

        let addr: SocketAddr = self
            .config
            .server
            .listen_addr
            .parse()
            .map_err(|e| MedgateError::Config(format!("Invalid listen address: {e}")))?;

        tracing::info!("Starting gateway on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| MedgateError::Gateway(format!("Failed to bind to {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| MedgateError::Gateway(format!("Server error: {e}")))?;

        tracing::info!("Gateway shut down gracefully");
        Ok(())
    }
}

/// Handle `GET /api/health`: probe the upstream model server and report
/// whether the configured model is loaded
async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.upstream.list_models().await {
        Ok(models) => {
            let model_available = models.iter().any(|m| m == state.upstream.model());
            Json(serde_json::json!({
                "status": "healthy",
                "models": models,
                "config": {
                    "baseURL": state.upstream.base_url(),
                    "configuredModel": state.upstream.model(),
                    "modelAvailable": model_available,
                },
                "timestamp": Utc::now().to_rfc3339(),
            }))
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "upstream health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                    "config": {
                        "baseURL": state.upstream.base_url(),
                        "configuredModel": state.upstream.model(),
                    },
                    "instructions": {
                        "message": "The model server is not running or not accessible",
                        "steps": [
                            "1. Ensure the model server is installed and running",
                            "2. Load the configured model",
                            "3. Check that the server is listening on the configured port",
                            format!("4. Verify the base URL is correct: {}", state.upstream.base_url()),
                        ],
                    },
                })),
            )
                .into_response()
        }
    }
}

/// JSON error body with the given status
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
