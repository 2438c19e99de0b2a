//! Player rating engine
//!
//! Turns reported outcomes and host adjustments into new player statistics.
//! Every operation is a single read-modify-write against the players table,
//! so the record returned is exactly what was persisted.

use crate::error::{RankedError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::tier::{tier_of, Tier};
use crate::store::Store;
use crate::types::{AutoStreakKind, CounterField, MatchType, PlayerRecord};
use crate::utils::apply_floored_delta;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Upper bound for a single auto streak arm
pub const MAX_AUTO_STREAK: u32 = 100;

/// Result of recording one match outcome
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    /// The record after the outcome was applied
    pub record: PlayerRecord,
    /// What the host reported
    pub reported_won: bool,
    /// What was actually recorded
    pub effective_result: bool,
    /// Whether an armed auto streak replaced the reported result
    pub was_overridden: bool,
}

/// Result of a manual ELO change
#[derive(Debug, Clone, Serialize)]
pub struct EloAdjustment {
    pub record: PlayerRecord,
    pub mode: MatchType,
    pub old_elo: u64,
    pub new_elo: u64,
    pub old_tier: Tier,
    pub new_tier: Tier,
}

impl EloAdjustment {
    pub fn tier_changed(&self) -> bool {
        self.old_tier != self.new_tier
    }

    pub fn ranked_up(&self) -> bool {
        self.new_tier > self.old_tier
    }
}

/// Decide what an outcome report actually records, consuming one game
/// from an armed auto streak if there is one.
///
/// Returns `(effective_result, was_overridden)`.
pub fn resolve_outcome(record: &mut PlayerRecord, reported_won: bool) -> (bool, bool) {
    if record.auto_win_streak > 0 {
        record.auto_win_streak -= 1;
        (true, true)
    } else if record.auto_lose_streak > 0 {
        record.auto_lose_streak -= 1;
        (false, true)
    } else {
        (reported_won, false)
    }
}

/// Apply a win or a loss to the counters and the signed streak
pub fn apply_result(record: &mut PlayerRecord, won: bool) {
    if won {
        record.wins = record.wins.saturating_add(1);
        record.current_streak = if record.current_streak >= 0 {
            record.current_streak + 1
        } else {
            1
        };
    } else {
        record.losses = record.losses.saturating_add(1);
        record.current_streak = if record.current_streak <= 0 {
            record.current_streak - 1
        } else {
            -1
        };
    }
}

/// Rating engine over the shared store
pub struct RatingEngine {
    store: Arc<Store>,
    metrics_collector: Arc<MetricsCollector>,
}

impl RatingEngine {
    /// Create a new rating engine
    pub fn new(store: Arc<Store>) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(store, metrics_collector)
    }

    /// Create a new rating engine with metrics collector
    pub fn with_metrics(store: Arc<Store>, metrics_collector: Arc<MetricsCollector>) -> Self {
        Self {
            store,
            metrics_collector,
        }
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    /// Record a reported outcome for one player
    pub fn report_outcome(
        &self,
        guild_id: &str,
        user_id: &str,
        reported_won: bool,
    ) -> Result<OutcomeReport> {
        let (record, (effective_result, was_overridden)) =
            self.store.update_player(guild_id, user_id, |record| {
                let (effective, overridden) = resolve_outcome(record, reported_won);
                apply_result(record, effective);
                (effective, overridden)
            })?;

        self.metrics_collector
            .record_outcome(effective_result, was_overridden);

        if was_overridden {
            info!(
                "Outcome for '{}' in guild '{}' overridden by auto streak: reported {}, recorded {} (win streak left {}, lose streak left {})",
                user_id,
                guild_id,
                if reported_won { "win" } else { "loss" },
                if effective_result { "win" } else { "loss" },
                record.auto_win_streak,
                record.auto_lose_streak
            );
        } else {
            info!(
                "Recorded {} for '{}' in guild '{}' ({}W-{}L, streak {})",
                if effective_result { "win" } else { "loss" },
                user_id,
                guild_id,
                record.wins,
                record.losses,
                record.current_streak
            );
        }

        Ok(OutcomeReport {
            record,
            reported_won,
            effective_result,
            was_overridden,
        })
    }

    /// Add a signed amount to one ELO track, floored at zero
    pub fn adjust_elo(
        &self,
        guild_id: &str,
        user_id: &str,
        mode: MatchType,
        delta: i64,
    ) -> Result<EloAdjustment> {
        let (record, (old_elo, new_elo)) = self.store.update_player(guild_id, user_id, |record| {
            let elo = record.elo_mut(mode);
            let old = *elo;
            *elo = apply_floored_delta(old, delta);
            (old, *elo)
        })?;

        self.metrics_collector.record_elo_adjustment(mode, delta);

        let adjustment = EloAdjustment {
            record,
            mode,
            old_elo,
            new_elo,
            old_tier: tier_of(old_elo),
            new_tier: tier_of(new_elo),
        };

        info!(
            "Adjusted {} ELO for '{}' in guild '{}' by {}: {} -> {}{}",
            mode,
            user_id,
            guild_id,
            delta,
            old_elo,
            new_elo,
            if adjustment.tier_changed() {
                format!(" ({} -> {})", adjustment.old_tier, adjustment.new_tier)
            } else {
                String::new()
            }
        );

        Ok(adjustment)
    }

    /// Add a signed amount to the wins or losses counter, floored at zero.
    /// Returns the new counter value.
    pub fn adjust_counters(
        &self,
        guild_id: &str,
        user_id: &str,
        field: CounterField,
        delta: i64,
    ) -> Result<(PlayerRecord, u32)> {
        let (record, value) = self.store.update_player(guild_id, user_id, |record| {
            let counter = record.counter_mut(field);
            let adjusted = apply_floored_delta(u64::from(*counter), delta);
            *counter = u32::try_from(adjusted).unwrap_or(u32::MAX);
            *counter
        })?;

        info!(
            "Adjusted {:?} for '{}' in guild '{}' by {} (now {})",
            field, user_id, guild_id, delta, value
        );
        Ok((record, value))
    }

    /// Arm (or with 0, clear) one auto streak; the other is always cleared
    pub fn set_auto_streak(
        &self,
        guild_id: &str,
        user_id: &str,
        kind: AutoStreakKind,
        count: u32,
    ) -> Result<PlayerRecord> {
        if count > MAX_AUTO_STREAK {
            return Err(RankedError::InvalidInput {
                reason: format!(
                    "Auto streak count must be between 0 and {}",
                    MAX_AUTO_STREAK
                ),
            });
        }

        let (record, ()) = self
            .store
            .update_player(guild_id, user_id, |record| match kind {
                AutoStreakKind::Win => {
                    record.auto_win_streak = count;
                    record.auto_lose_streak = 0;
                }
                AutoStreakKind::Lose => {
                    record.auto_lose_streak = count;
                    record.auto_win_streak = 0;
                }
            })?;

        if count > 0 {
            self.metrics_collector.record_auto_streak(kind);
        }

        info!(
            "Auto {:?} streak for '{}' in guild '{}' set to {}",
            kind, user_id, guild_id, count
        );
        Ok(record)
    }

    /// Zero both auto streaks and the current streak
    pub fn clear_all_streaks(&self, guild_id: &str, user_id: &str) -> Result<PlayerRecord> {
        let (record, ()) = self.store.update_player(guild_id, user_id, |record| {
            record.auto_win_streak = 0;
            record.auto_lose_streak = 0;
            record.current_streak = 0;
        })?;

        info!("Cleared all streaks for '{}' in guild '{}'", user_id, guild_id);
        Ok(record)
    }

    /// Count one dodge against a player
    pub fn record_dodge(&self, guild_id: &str, user_id: &str) -> Result<PlayerRecord> {
        let (record, ()) = self.store.update_player(guild_id, user_id, |record| {
            record.dodges = record.dodges.saturating_add(1);
        })?;

        self.metrics_collector.record_dodge();
        info!(
            "Recorded dodge for '{}' in guild '{}' (total {})",
            user_id, guild_id, record.dodges
        );
        Ok(record)
    }

    /// Current statistics, creating a default record on first lookup
    pub fn stats(&self, guild_id: &str, user_id: &str) -> Result<PlayerRecord> {
        debug!("Stats lookup for '{}' in guild '{}'", user_id, guild_id);
        self.store.player(guild_id, user_id)
    }
}
