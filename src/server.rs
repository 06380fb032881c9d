//! HTTP API serving the dashboard report.
//!
//! This module provides an HTTP server that:
//! - Runs the full pipeline against the configured row source on every
//!   `GET /api/dashboard` request
//! - Returns the report as JSON for the presentation layer
//!
//! # Architecture
//!
//! ```text
//! Dashboard page ──→ GET /api/dashboard ──→ row source ──→ pipeline ──→ JSON
//! ```
//!
//! The server keeps no per-request state: configuration and the source are
//! immutable and each request builds its own observation series.

use crate::config::PipelineConfig;
use crate::core::{run_from_source, DashboardReport, PipelineError};
use crate::source::RowSource;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: IpAddr,
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Pipeline settings used for every request
    pub pipeline: PipelineConfig,
    /// Where rows are fetched from
    pub source: Arc<dyn RowSource + Send + Sync>,
}

impl ServerConfig {
    /// Create a new server configuration bound to localhost
    pub fn new(
        port: u16,
        pipeline: PipelineConfig,
        source: Arc<dyn RowSource + Send + Sync>,
    ) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            pipeline,
            source,
        }
    }
}

/// Shared server state
struct ServerState {
    pipeline: PipelineConfig,
    source: Arc<dyn RowSource + Send + Sync>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/dashboard
///
/// Fetches rows and runs the pipeline on a blocking thread, since the source
/// may block on I/O.
async fn dashboard(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<DashboardReport>, ApiError> {
    let source = Arc::clone(&state.source);
    let pipeline = state.pipeline.clone();

    let result = tokio::task::spawn_blocking(move || run_from_source(source.as_ref(), &pipeline))
        .await
        .map_err(|e| {
            tracing::error!("Pipeline task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e)
        })?;

    match result {
        Ok(report) => Ok(Json(report)),
        Err(e @ PipelineError::Source(_)) => {
            tracing::error!("Dashboard request failed: {}", e);
            Err(api_error(StatusCode::BAD_GATEWAY, "SOURCE_UNAVAILABLE", e))
        }
        Err(e @ PipelineError::Config(_)) => {
            tracing::error!("Dashboard request failed: {}", e);
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVALID_CONFIG",
                e,
            ))
        }
    }
}

/// Build the API router.
fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    config.pipeline.validate()?;

    let state = Arc::new(ServerState {
        pipeline: config.pipeline,
        source: config.source,
    });
    tracing::info!("Serving rows from source '{}'", state.source.name());

    let app = router(state);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Condensate monitor listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
