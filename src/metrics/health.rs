//! HTTP health server
//!
//! Serves the keep-alive page, a JSON health summary, store counts and the
//! Prometheus metrics using Axum.

use crate::metrics::collector::MetricsCollector;
use crate::service::health::{HealthProbe, HealthStatus};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Health server configuration
#[derive(Debug, Clone)]
pub struct HealthServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for the health server
#[derive(Clone)]
pub struct HealthServerState {
    pub metrics_collector: Arc<MetricsCollector>,
    pub probe: Option<HealthProbe>,
}

pub struct HealthServer {
    config: HealthServerConfig,
    state: HealthServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HealthServer {
    pub fn new(config: HealthServerConfig, metrics_collector: Arc<MetricsCollector>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: HealthServerState {
                metrics_collector,
                probe: None,
            },
            shutdown_tx,
        }
    }

    /// Attach the probe used by `/health` and `/stats`
    pub fn with_probe(mut self, probe: HealthProbe) -> Self {
        self.state.probe = Some(probe);
        self
    }

    /// Serve until [`HealthServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid health server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind health server to {}", addr))?;

        info!("Health server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Health server shutdown signal received");
            })
            .await?;

        info!("Health server stopped");
        Ok(())
    }

    fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/stats", get(stats_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state.clone())
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping health server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to health server: {}", e);
        }
        Ok(())
    }
}

async fn root_handler() -> &'static str {
    "Bot is alive!"
}

async fn health_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Health check requested");

    let Some(probe) = &state.probe else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": HealthStatus::Unhealthy,
                "uptime": 0.0,
                "timestamp": chrono::Utc::now(),
                "error": "Service not initialized"
            })),
        );
    };

    let health = probe.check().await;
    let code = match health.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (
        code,
        Json(json!({
            "status": health.status,
            "uptime": probe.uptime().as_secs_f64(),
            "timestamp": health.timestamp,
        })),
    )
}

async fn stats_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    let Some(probe) = &state.probe else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Service not initialized" })),
        );
    };

    match probe.counts() {
        Ok(counts) => (
            StatusCode::OK,
            Json(json!({
                "guilds": counts.guilds,
                "active_matches": counts.active_matches,
                "players": counts.players,
                "timestamp": chrono::Utc::now(),
            })),
        ),
        Err(e) => {
            error!("Failed to read store counts: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "Failed to read store" })),
            )
        }
    }
}

async fn metrics_handler(State(state): State<HealthServerState>) -> Response {
    debug!("Metrics endpoint requested");

    match state.metrics_collector.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}
