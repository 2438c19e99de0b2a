//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the ranked match coordinator
//! using Prometheus metrics.

use crate::types::{AutoStreakKind, MatchType};
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the coordinator
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Rating engine metrics
    rating_metrics: RatingMetrics,

    /// Match room metrics
    match_metrics: MatchMetrics,

    /// Leaderboard panel metrics
    leaderboard_metrics: LeaderboardMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Commands and button presses handled, by name and outcome
    pub commands_total: IntCounterVec,

    /// Command handling time
    pub command_duration_seconds: HistogramVec,

    /// Failed collaborator calls, by operation
    pub external_failures_total: IntCounterVec,
}

/// Rating engine metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Outcomes recorded, by effective result and whether an auto streak overrode it
    pub outcomes_reported_total: IntCounterVec,

    /// Manual ELO adjustments, by mode and direction
    pub elo_adjustments_total: IntCounterVec,

    /// Auto streaks armed, by kind
    pub auto_streaks_armed_total: IntCounterVec,

    /// Dodges recorded
    pub dodges_recorded_total: IntCounter,
}

/// Match room metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Rooms opened, by match type
    pub matches_opened_total: IntCounterVec,

    /// Rooms closed, by match type
    pub matches_closed_total: IntCounterVec,

    /// Rooms currently open
    pub active_matches: IntGauge,

    /// Deferred room deletions, by status
    pub room_deletions_total: IntCounterVec,
}

/// Leaderboard panel metrics
#[derive(Clone)]
pub struct LeaderboardMetrics {
    /// Panel syncs, by mode and action (edited, created, recreated)
    pub syncs_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let match_metrics = MatchMetrics::new(&registry)?;
        let leaderboard_metrics = LeaderboardMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            rating_metrics,
            match_metrics,
            leaderboard_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Get match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Get leaderboard metrics
    pub fn leaderboard(&self) -> &LeaderboardMetrics {
        &self.leaderboard_metrics
    }

    /// Record an outcome report
    pub fn record_outcome(&self, effective_result: bool, was_overridden: bool) {
        let result = if effective_result { "win" } else { "loss" };
        let overridden = if was_overridden { "true" } else { "false" };

        self.rating_metrics
            .outcomes_reported_total
            .with_label_values(&[result, overridden])
            .inc();
    }

    /// Record a manual ELO adjustment
    pub fn record_elo_adjustment(&self, mode: MatchType, delta: i64) {
        let direction = if delta >= 0 { "add" } else { "remove" };

        self.rating_metrics
            .elo_adjustments_total
            .with_label_values(&[mode.as_str(), direction])
            .inc();
    }

    /// Record an auto streak being armed (count > 0)
    pub fn record_auto_streak(&self, kind: AutoStreakKind) {
        let kind = match kind {
            AutoStreakKind::Win => "win",
            AutoStreakKind::Lose => "lose",
        };

        self.rating_metrics
            .auto_streaks_armed_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record a dodge
    pub fn record_dodge(&self) {
        self.rating_metrics.dodges_recorded_total.inc();
    }

    /// Record a match room opening
    pub fn record_match_opened(&self, match_type: MatchType) {
        self.match_metrics
            .matches_opened_total
            .with_label_values(&[match_type.as_str()])
            .inc();
        self.match_metrics.active_matches.inc();
    }

    /// Record a match room closing
    pub fn record_match_closed(&self, match_type: MatchType) {
        self.match_metrics
            .matches_closed_total
            .with_label_values(&[match_type.as_str()])
            .inc();
        self.match_metrics.active_matches.dec();
    }

    /// Set the open-room gauge (at startup, from the store)
    pub fn set_active_matches(&self, count: usize) {
        self.match_metrics.active_matches.set(count as i64);
    }

    /// Record the outcome of a deferred room deletion
    pub fn record_room_deletion(&self, success: bool) {
        let status = if success { "success" } else { "failed" };

        self.match_metrics
            .room_deletions_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record a leaderboard panel sync
    pub fn record_leaderboard_sync(&self, mode: MatchType, action: &str) {
        self.leaderboard_metrics
            .syncs_total
            .with_label_values(&[mode.as_str(), action])
            .inc();
    }

    /// Record a failed collaborator call
    pub fn record_external_failure(&self, operation: &str) {
        self.service_metrics
            .external_failures_total
            .with_label_values(&[operation])
            .inc();
    }

    /// Record a handled command
    pub fn record_command(&self, command: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.service_metrics
            .commands_total
            .with_label_values(&[command, status])
            .inc();

        self.service_metrics
            .command_duration_seconds
            .with_label_values(&[command])
            .observe(duration.as_secs_f64());
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update uptime gauge
    pub fn update_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("ranked_room_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "ranked_room_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let commands_total = IntCounterVec::new(
            Opts::new("ranked_room_commands_total", "Total commands handled"),
            &["command", "status"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let command_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "ranked_room_command_duration_seconds",
                "Command handling time in seconds",
            ),
            &["command"],
        )?;
        registry.register(Box::new(command_duration_seconds.clone()))?;

        let external_failures_total = IntCounterVec::new(
            Opts::new(
                "ranked_room_external_failures_total",
                "Total failed platform calls",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(external_failures_total.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            commands_total,
            command_duration_seconds,
            external_failures_total,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let outcomes_reported_total = IntCounterVec::new(
            Opts::new(
                "ranked_room_outcomes_reported_total",
                "Total match outcomes recorded",
            ),
            &["result", "overridden"],
        )?;
        registry.register(Box::new(outcomes_reported_total.clone()))?;

        let elo_adjustments_total = IntCounterVec::new(
            Opts::new(
                "ranked_room_elo_adjustments_total",
                "Total manual ELO adjustments",
            ),
            &["mode", "direction"],
        )?;
        registry.register(Box::new(elo_adjustments_total.clone()))?;

        let auto_streaks_armed_total = IntCounterVec::new(
            Opts::new(
                "ranked_room_auto_streaks_armed_total",
                "Total auto streaks armed",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(auto_streaks_armed_total.clone()))?;

        let dodges_recorded_total =
            IntCounter::new("ranked_room_dodges_recorded_total", "Total dodges recorded")?;
        registry.register(Box::new(dodges_recorded_total.clone()))?;

        Ok(Self {
            outcomes_reported_total,
            elo_adjustments_total,
            auto_streaks_armed_total,
            dodges_recorded_total,
        })
    }
}

impl MatchMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_opened_total = IntCounterVec::new(
            Opts::new("ranked_room_matches_opened_total", "Total match rooms opened"),
            &["match_type"],
        )?;
        registry.register(Box::new(matches_opened_total.clone()))?;

        let matches_closed_total = IntCounterVec::new(
            Opts::new("ranked_room_matches_closed_total", "Total match rooms closed"),
            &["match_type"],
        )?;
        registry.register(Box::new(matches_closed_total.clone()))?;

        let active_matches =
            IntGauge::new("ranked_room_active_matches", "Match rooms currently open")?;
        registry.register(Box::new(active_matches.clone()))?;

        let room_deletions_total = IntCounterVec::new(
            Opts::new(
                "ranked_room_room_deletions_total",
                "Total deferred room deletions",
            ),
            &["status"],
        )?;
        registry.register(Box::new(room_deletions_total.clone()))?;

        Ok(Self {
            matches_opened_total,
            matches_closed_total,
            active_matches,
            room_deletions_total,
        })
    }
}

impl LeaderboardMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let syncs_total = IntCounterVec::new(
            Opts::new(
                "ranked_room_leaderboard_syncs_total",
                "Total leaderboard panel syncs",
            ),
            &["mode", "action"],
        )?;
        registry.register(Box::new(syncs_total.clone()))?;

        Ok(Self { syncs_total })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
