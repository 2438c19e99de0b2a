//! Load-time normalization of persisted tables
//!
//! Older data files predate the 1v1/2v2 split, the dodge counter and the
//! leaderboard settings. Everything a reader would otherwise have to backfill
//! is fixed here once, before the tables go live.

use crate::error::{RankedError, Result};
use crate::store::backend::TableName;
use crate::types::{GuildSettings, MatchRoom, PlayerRecord, DEFAULT_ELO, MAX_HOST_ROLES};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::warn;

/// What the migration pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub players_backfilled: usize,
    /// Players whose single pre-split rating became their 1v1 rating
    pub legacy_ratings_carried: usize,
    pub streak_conflicts_repaired: usize,
    pub players_skipped: usize,
    pub settings_repaired: usize,
    pub rooms_repaired: usize,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        *self == MigrationReport::default()
    }
}

/// Player row as it may appear on disk, every field optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredPlayer {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(rename = "guildId")]
    guild_id: Option<String>,
    wins: Option<i64>,
    losses: Option<i64>,
    #[serde(rename = "currentStreak")]
    current_streak: Option<i64>,
    #[serde(rename = "autoWinStreak")]
    auto_win_streak: Option<i64>,
    #[serde(rename = "autoLoseStreak")]
    auto_lose_streak: Option<i64>,
    elo: Option<i64>,
    elo1v1: Option<i64>,
    elo2v2: Option<i64>,
    dodges: Option<i64>,
}

/// Parse a serialized table; absent or blank contents are an empty table
pub fn parse_table<T: DeserializeOwned>(
    table: TableName,
    raw: Option<&str>,
) -> Result<BTreeMap<String, T>> {
    match raw {
        Some(contents) if !contents.trim().is_empty() => {
            serde_json::from_str(contents).map_err(|e| RankedError::Storage {
                message: format!("Failed to parse {}: {}", table, e),
            })
        }
        _ => Ok(BTreeMap::new()),
    }
}

fn counter(value: Option<i64>, changed: &mut bool) -> u32 {
    match value {
        Some(v) if v >= 0 => u32::try_from(v).unwrap_or(u32::MAX),
        Some(_) => {
            *changed = true;
            0
        }
        None => {
            *changed = true;
            0
        }
    }
}

fn elo(value: Option<i64>, changed: &mut bool) -> u64 {
    match value {
        Some(v) if v >= 0 => v as u64,
        Some(_) => {
            *changed = true;
            0
        }
        None => {
            *changed = true;
            DEFAULT_ELO
        }
    }
}

/// Normalize the players table
pub fn migrate_players(
    raw: Option<&str>,
    report: &mut MigrationReport,
) -> Result<BTreeMap<String, PlayerRecord>> {
    let stored: BTreeMap<String, StoredPlayer> = parse_table(TableName::Players, raw)?;
    let mut players = BTreeMap::new();

    for (key, row) in stored {
        let from_key = key.split_once('-');
        let guild_id = row
            .guild_id
            .clone()
            .or_else(|| from_key.map(|(g, _)| g.to_string()));
        let user_id = row
            .user_id
            .clone()
            .or_else(|| from_key.map(|(_, u)| u.to_string()));

        let (Some(guild_id), Some(user_id)) = (guild_id, user_id) else {
            warn!("Skipping player row '{}': guild/user ids unrecoverable", key);
            report.players_skipped += 1;
            continue;
        };

        let mut changed = row.guild_id.is_none() || row.user_id.is_none();
        let elo_legacy = elo(row.elo, &mut changed);
        // A file written before the 1v1/2v2 split only has the single rating
        let elo_1v1 = match (row.elo1v1, row.elo) {
            (None, Some(_)) => {
                changed = true;
                report.legacy_ratings_carried += 1;
                elo_legacy
            }
            (stored, _) => elo(stored, &mut changed),
        };
        let mut record = PlayerRecord {
            wins: counter(row.wins, &mut changed),
            losses: counter(row.losses, &mut changed),
            current_streak: row.current_streak.unwrap_or_else(|| {
                changed = true;
                0
            }),
            auto_win_streak: counter(row.auto_win_streak, &mut changed),
            auto_lose_streak: counter(row.auto_lose_streak, &mut changed),
            elo_legacy,
            elo_1v1,
            elo_2v2: elo(row.elo2v2, &mut changed),
            dodges: counter(row.dodges, &mut changed),
            guild_id,
            user_id,
        };

        if record.auto_win_streak > 0 && record.auto_lose_streak > 0 {
            warn!(
                "Player '{}' had both auto streaks armed (win {}, lose {}); keeping the win streak",
                key, record.auto_win_streak, record.auto_lose_streak
            );
            record.auto_lose_streak = 0;
            report.streak_conflicts_repaired += 1;
        }

        if changed {
            report.players_backfilled += 1;
        }

        players.insert(PlayerRecord::key(&record.guild_id, &record.user_id), record);
    }

    Ok(players)
}

/// Normalize the settings table
pub fn migrate_settings(
    raw: Option<&str>,
    report: &mut MigrationReport,
) -> Result<BTreeMap<String, GuildSettings>> {
    let mut settings: BTreeMap<String, GuildSettings> = parse_table(TableName::Settings, raw)?;

    for (guild_id, guild) in settings.iter_mut() {
        let original = guild.host_role_ids.clone();
        let mut seen = Vec::new();
        for role in original.iter() {
            if !seen.contains(role) {
                seen.push(role.clone());
            }
        }
        seen.truncate(MAX_HOST_ROLES);

        if seen != original {
            warn!(
                "Guild '{}' host roles normalized from {} to {} entries",
                guild_id,
                original.len(),
                seen.len()
            );
            guild.host_role_ids = seen;
            report.settings_repaired += 1;
        }
    }

    Ok(settings)
}

/// Normalize the matches table
pub fn migrate_matches(
    raw: Option<&str>,
    report: &mut MigrationReport,
) -> Result<BTreeMap<String, MatchRoom>> {
    let mut rooms: BTreeMap<String, MatchRoom> = parse_table(TableName::Matches, raw)?;

    for room in rooms.values_mut() {
        let mut participants = vec![room.creator_id.clone()];
        for participant in room.participants.iter() {
            if !participants.contains(participant) {
                participants.push(participant.clone());
            }
        }
        if participants != room.participants {
            room.participants = participants;
            report.rooms_repaired += 1;
        }
    }

    Ok(rooms)
}
