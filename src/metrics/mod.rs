//! Metrics and monitoring for the ranked room coordinator
//!
//! Prometheus collection plus the HTTP health server that exposes it.

pub mod collector;
pub mod health;

pub use collector::{
    LeaderboardMetrics, MatchMetrics, MetricsCollector, MetricsTimer, RatingMetrics,
    ServiceMetrics,
};
pub use health::{HealthServer, HealthServerConfig};

use std::sync::Arc;

/// Collector and health server started and stopped together
#[derive(Clone)]
pub struct MetricsService {
    collector: Arc<MetricsCollector>,
    health_server: Arc<HealthServer>,
}

impl MetricsService {
    pub fn new(collector: Arc<MetricsCollector>, health_server: Arc<HealthServer>) -> Self {
        Self {
            collector,
            health_server,
        }
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn health_server(&self) -> Arc<HealthServer> {
        self.health_server.clone()
    }

    /// Serve the health endpoints until stopped
    pub async fn start(&self) -> anyhow::Result<()> {
        self.health_server.start().await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.health_server.stop().await
    }
}
