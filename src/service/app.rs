//! Main application state and service coordination
//!
//! [`AppState`] owns the store, the command router and the metrics service,
//! and runs the background tasks that keep the health gauges current.

use crate::commands::{CommandRouter, RouterSettings};
use crate::config::AppConfig;
use crate::metrics::health::HealthServerConfig;
use crate::metrics::{HealthServer, MetricsCollector, MetricsService};
use crate::platform::Platform;
use crate::service::health::{HealthCheck, HealthProbe};
use crate::store::{JsonFileBackend, Store};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

const HEALTH_METRICS_INTERVAL: Duration = Duration::from_secs(30);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    config: AppConfig,

    store: Arc<Store>,

    router: Arc<CommandRouter>,

    /// Metrics collector and health server
    metrics_service: Arc<MetricsService>,

    probe: HealthProbe,

    background_tasks: Vec<JoinHandle<()>>,

    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Load the JSON store from the configured data directory and wire up
    /// every component around it
    pub fn new(config: AppConfig, platform: Arc<dyn Platform>) -> Result<Self, ServiceError> {
        info!(
            "Initializing {} with data directory {}",
            config.service.name,
            config.storage.data_dir.display()
        );

        let backend = JsonFileBackend::new(&config.storage.data_dir).map_err(|e| {
            ServiceError::Storage {
                message: format!("Failed to open data directory: {}", e),
            }
        })?;
        let store = Store::load(Arc::new(backend)).map_err(|e| ServiceError::Storage {
            message: format!("Failed to load persisted state: {}", e),
        })?;

        Self::with_store(config, Arc::new(store), platform)
    }

    /// Wire up every component around an already loaded store
    pub fn with_store(
        config: AppConfig,
        store: Arc<Store>,
        platform: Arc<dyn Platform>,
    ) -> Result<Self, ServiceError> {
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let is_running = Arc::new(RwLock::new(false));
        let probe = HealthProbe::new(&config.service.name, store.clone(), is_running.clone());
        let metrics_service = Self::initialize_metrics(&config, probe.clone())?;

        let router = Arc::new(CommandRouter::new(
            store.clone(),
            platform,
            metrics_service.collector(),
            RouterSettings {
                deletion_delay: config.room_deletion_delay(),
                leaderboard_size: config.leaderboard.size,
            },
        ));

        Ok(Self {
            config,
            store,
            router,
            metrics_service,
            probe,
            background_tasks: Vec::new(),
            is_running,
        })
    }

    /// Start the health server and background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {}", self.config.service.name);

        *self.is_running.write().await = true;

        self.start_metrics_service().await;
        self.start_background_tasks();

        info!("✅ {} started successfully", self.config.service.name);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);

        *self.is_running.write().await = false;

        info!("Stopping metrics service...");
        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        } else {
            info!("✅ Metrics service stopped");
        }

        self.stop_background_tasks().await;

        match self.store.counts() {
            Ok(counts) => info!("Final store contents: {:?}", counts),
            Err(e) => warn!("Cannot read final store contents: {}", e),
        }
        info!("✅ {} shutdown completed", self.config.service.name);

        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn router(&self) -> Arc<CommandRouter> {
        self.router.clone()
    }

    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    pub async fn health_check(&self) -> HealthCheck {
        self.probe.check().await
    }

    fn initialize_metrics(
        config: &AppConfig,
        probe: HealthProbe,
    ) -> Result<Arc<MetricsService>, ServiceError> {
        info!(
            "Initializing metrics service on {}",
            config.health_addr()
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let health_config = HealthServerConfig {
            port: config.service.health_port,
            host: config.service.health_host.clone(),
        };
        let health_server = Arc::new(
            HealthServer::new(health_config, metrics_collector.clone()).with_probe(probe),
        );

        Ok(Arc::new(MetricsService::new(metrics_collector, health_server)))
    }

    async fn start_metrics_service(&mut self) {
        info!("Starting health and metrics endpoints");

        let metrics_service = self.metrics_service.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Health server failed: {}", e);
            } else {
                info!("Health server task completed");
            }
        });
        self.background_tasks.push(handle);

        // Let the listener bind before reporting
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("✅ Health server started on {}", self.config.health_addr());
    }

    fn start_background_tasks(&mut self) {
        info!(
            "Starting health metrics task ({}s interval)...",
            HEALTH_METRICS_INTERVAL.as_secs()
        );

        let probe = self.probe.clone();
        let metrics_collector = self.metrics_service.collector();
        let is_running = self.is_running.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEALTH_METRICS_INTERVAL);
            info!("Health metrics task started");

            while *is_running.read().await {
                interval.tick().await;

                let health = probe.check().await;
                metrics_collector.update_uptime(probe.uptime());
                metrics_collector.update_health_status(health.status.gauge_value());
                metrics_collector.set_active_matches(health.stats.active_matches);

                debug!(
                    "Updated health metrics - status: {}, active matches: {}, uptime: {}s",
                    health.status, health.stats.active_matches, health.uptime_seconds
                );
            }

            info!("Health metrics task stopped");
        });
        self.background_tasks.push(task);
    }

    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in self.background_tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, Invocation};
    use crate::platform::MockPlatform;
    use crate::service::health::HealthStatus;
    use crate::types::MatchType;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.service.health_host = "127.0.0.1".to_string();
        config.service.health_port = 0;
        config
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = AppState::with_store(
            config(),
            Arc::new(Store::in_memory()),
            Arc::new(MockPlatform::new()),
        );
        assert!(matches!(result, Err(ServiceError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_lifecycle_updates_health() {
        let mut config = config();
        config.service.health_port = 38_471;
        let platform = Arc::new(MockPlatform::new().with_role("g", "host", "hosts"));
        let mut app =
            AppState::with_store(config, Arc::new(Store::in_memory()), platform).unwrap();

        assert!(!app.is_running().await);
        assert_eq!(app.health_check().await.status, HealthStatus::Unhealthy);

        app.start().await.unwrap();
        assert!(app.is_running().await);
        assert_eq!(app.health_check().await.status, HealthStatus::Healthy);

        app.shutdown().await.unwrap();
        assert!(!app.is_running().await);
        assert!(app.background_tasks.is_empty());
    }

    #[tokio::test]
    async fn test_router_shares_store() {
        let mut config = config();
        config.service.health_port = 38_472;
        let store = Arc::new(Store::in_memory());
        store
            .update_settings("g", |settings| {
                settings.host_role_ids = vec!["hosts".to_string()]
            })
            .unwrap();
        let platform = Arc::new(MockPlatform::new().with_role("g", "host", "hosts"));
        let app = AppState::with_store(config, store.clone(), platform).unwrap();

        let reply = app
            .router()
            .dispatch(Invocation::new(
                "g",
                "lobby",
                "host",
                Command::StartMatch {
                    match_type: MatchType::OneVsOne,
                },
            ))
            .await;
        assert!(reply.ephemeral);
        assert_eq!(store.counts().unwrap().active_matches, 1);
        assert_eq!(app.health_check().await.stats.active_matches, 1);
    }
}
