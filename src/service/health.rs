//! Health checks for the coordinator
//!
//! A [`HealthProbe`] is handed to the HTTP health server so that it can report
//! on the store and the service lifecycle without owning the application.

use crate::store::{Store, StoreCounts};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Value exported through the health status gauge
    pub fn gauge_value(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    fn worst(self, other: HealthStatus) -> HealthStatus {
        if self.gauge_value() <= other.gauge_value() {
            self
        } else {
            other
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Full health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: u64,
    pub checks: Vec<ComponentCheck>,
    /// Row counts, zeroed when the store cannot be read
    pub stats: StoreCounts,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Read-only view of the pieces a health check looks at
#[derive(Clone)]
pub struct HealthProbe {
    service_name: String,
    store: Arc<Store>,
    is_running: Arc<RwLock<bool>>,
    started_at: Instant,
}

impl HealthProbe {
    pub fn new(service_name: &str, store: Arc<Store>, is_running: Arc<RwLock<bool>>) -> Self {
        Self {
            service_name: service_name.to_string(),
            store,
            is_running,
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(self.store.counts()?)
    }

    /// Check every component
    pub async fn check(&self) -> HealthCheck {
        let service_check = self.check_service_running().await;
        let (store_check, stats) = self.check_store();

        let status = service_check.status.worst(store_check.status);

        HealthCheck {
            status,
            service: self.service_name.clone(),
            version: crate::VERSION.to_string(),
            timestamp: chrono::Utc::now(),
            uptime_seconds: self.uptime().as_secs(),
            checks: vec![service_check, store_check],
            stats,
        }
    }

    /// Liveness only looks at the service lifecycle
    pub async fn liveness(&self) -> HealthStatus {
        if *self.is_running.read().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    async fn check_service_running(&self) -> ComponentCheck {
        let start = Instant::now();

        let (status, message) = match self.liveness().await {
            HealthStatus::Healthy => (HealthStatus::Healthy, None),
            other => (other, Some("Service is not running".to_string())),
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn check_store(&self) -> (ComponentCheck, StoreCounts) {
        let start = Instant::now();

        let (status, message, counts) = match self.store.counts() {
            Ok(counts) => {
                debug!("Store check passed: {:?}", counts);
                (HealthStatus::Healthy, None, counts)
            }
            Err(e) => {
                error!("Store health check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Cannot read store: {}", e)),
                    StoreCounts::default(),
                )
            }
        };

        let check = ComponentCheck {
            name: format!("store ({})", self.store.describe()),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        (check, counts)
    }
}

impl HealthCheck {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchType;

    fn probe(running: bool) -> (HealthProbe, Arc<Store>) {
        let store = Arc::new(Store::in_memory());
        let probe = HealthProbe::new(
            "ranked-room",
            store.clone(),
            Arc::new(RwLock::new(running)),
        );
        (probe, store)
    }

    #[tokio::test]
    async fn test_running_service_is_healthy() {
        let (probe, store) = probe(true);
        store.player("g", "u1").unwrap();
        store
            .update_settings("g", |settings| settings.log_channel_id = Some("log".into()))
            .unwrap();

        let health = probe.check().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.checks.len(), 2);
        assert_eq!(health.stats.players, 1);
        assert_eq!(health.stats.guilds, 1);
        assert_eq!(health.service, "ranked-room");
    }

    #[tokio::test]
    async fn test_stopped_service_is_unhealthy() {
        let (probe, _) = probe(false);
        assert_eq!(probe.liveness().await, HealthStatus::Unhealthy);

        let health = probe.check().await;
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.checks[0].message.is_some());
    }

    #[tokio::test]
    async fn test_report_serializes() {
        let (probe, store) = probe(true);
        store
            .insert_room("room-1", crate::types::MatchRoom::new(MatchType::OneVsOne, "u1"))
            .unwrap();

        let json = probe.check().await.to_json().unwrap();
        assert!(json.contains("\"status\": \"healthy\""));
        assert!(json.contains("\"active_matches\": 1"));
    }

    #[test]
    fn test_status_ordering() {
        assert_eq!(
            HealthStatus::Healthy.worst(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Unhealthy.worst(HealthStatus::Degraded),
            HealthStatus::Unhealthy
        );
        assert_eq!(HealthStatus::Healthy.gauge_value(), 2);
    }
}
