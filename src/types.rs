//! Common types used throughout the ranked match coordinator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Platform snowflake for a guild (community)
pub type GuildId = String;

/// Platform snowflake for a user
pub type UserId = String;

/// Platform snowflake for a role
pub type RoleId = String;

/// Platform snowflake for a channel or category
pub type ChannelId = String;

/// Match rooms are keyed by the id of their private channel
pub type RoomId = ChannelId;

/// Platform snowflake for a posted message
pub type MessageId = String;

/// Starting value of every ELO track
pub const DEFAULT_ELO: u64 = 800;

/// Maximum number of configurable host roles per guild
pub const MAX_HOST_ROLES: usize = 3;

/// Kind of ranked match, which also selects the ELO track it feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchType {
    #[serde(rename = "1v1")]
    OneVsOne,
    #[serde(rename = "2v2")]
    TwoVsTwo,
}

impl MatchType {
    pub const ALL: [MatchType; 2] = [MatchType::OneVsOne, MatchType::TwoVsTwo];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::OneVsOne => "1v1",
            MatchType::TwoVsTwo => "2v2",
        }
    }

    /// Number of players a full match of this type seats
    pub fn player_count(&self) -> usize {
        match self {
            MatchType::OneVsOne => 2,
            MatchType::TwoVsTwo => 4,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = crate::error::RankedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1v1" => Ok(MatchType::OneVsOne),
            "2v2" => Ok(MatchType::TwoVsTwo),
            other => Err(crate::error::RankedError::InvalidInput {
                reason: format!("Unknown match type: {}", other),
            }),
        }
    }
}

/// Which pre-armed override counter to set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoStreakKind {
    Win,
    Lose,
}

/// Manually correctable win/loss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterField {
    Wins,
    Losses,
}

/// Per-player, per-guild statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "guildId")]
    pub guild_id: GuildId,
    pub wins: u32,
    pub losses: u32,
    /// Positive for consecutive wins, negative for consecutive losses
    #[serde(rename = "currentStreak")]
    pub current_streak: i64,
    #[serde(rename = "autoWinStreak")]
    pub auto_win_streak: u32,
    #[serde(rename = "autoLoseStreak")]
    pub auto_lose_streak: u32,
    /// Single-track rating carried over from before the 1v1/2v2 split
    #[serde(rename = "elo")]
    pub elo_legacy: u64,
    #[serde(rename = "elo1v1")]
    pub elo_1v1: u64,
    #[serde(rename = "elo2v2")]
    pub elo_2v2: u64,
    pub dodges: u32,
}

impl PlayerRecord {
    /// Fresh record with default statistics
    pub fn new(guild_id: &str, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            guild_id: guild_id.to_string(),
            wins: 0,
            losses: 0,
            current_streak: 0,
            auto_win_streak: 0,
            auto_lose_streak: 0,
            elo_legacy: DEFAULT_ELO,
            elo_1v1: DEFAULT_ELO,
            elo_2v2: DEFAULT_ELO,
            dodges: 0,
        }
    }

    /// Composite key of the players table
    pub fn key(guild_id: &str, user_id: &str) -> String {
        format!("{}-{}", guild_id, user_id)
    }

    pub fn elo(&self, mode: MatchType) -> u64 {
        match mode {
            MatchType::OneVsOne => self.elo_1v1,
            MatchType::TwoVsTwo => self.elo_2v2,
        }
    }

    pub fn elo_mut(&mut self, mode: MatchType) -> &mut u64 {
        match mode {
            MatchType::OneVsOne => &mut self.elo_1v1,
            MatchType::TwoVsTwo => &mut self.elo_2v2,
        }
    }

    pub fn counter_mut(&mut self, field: CounterField) -> &mut u32 {
        match field {
            CounterField::Wins => &mut self.wins,
            CounterField::Losses => &mut self.losses,
        }
    }

    /// Win percentage over all recorded games, 0.0 with no games
    pub fn win_rate(&self) -> f64 {
        let games = self.wins as u64 + self.losses as u64;
        if games == 0 {
            0.0
        } else {
            self.wins as f64 / games as f64 * 100.0
        }
    }
}

/// Per-guild configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    #[serde(rename = "hostRoleIds", alias = "hostRoles", default)]
    pub host_role_ids: Vec<RoleId>,
    #[serde(rename = "matchCategoryId", alias = "matchCategory", default)]
    pub match_category_id: Option<ChannelId>,
    #[serde(rename = "logChannelId", alias = "logChannel", default)]
    pub log_channel_id: Option<ChannelId>,
    #[serde(rename = "leaderboardChannelId", default)]
    pub leaderboard_channel_id: Option<ChannelId>,
    #[serde(rename = "leaderboardMessageIds", default)]
    pub leaderboard_message_ids: BTreeMap<MatchType, Option<MessageId>>,
    #[serde(rename = "dodgeChannelId", default)]
    pub dodge_channel_id: Option<ChannelId>,
}

impl GuildSettings {
    pub fn leaderboard_message_id(&self, mode: MatchType) -> Option<&MessageId> {
        self.leaderboard_message_ids
            .get(&mode)
            .and_then(|id| id.as_ref())
    }
}

/// An open private match room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRoom {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    #[serde(rename = "creator")]
    pub creator_id: UserId,
    /// Ordered set; the creator is always first
    pub participants: Vec<UserId>,
    #[serde(rename = "createdAt", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl MatchRoom {
    pub fn new(match_type: MatchType, creator_id: &str) -> Self {
        Self {
            match_type,
            creator_id: creator_id.to_string(),
            participants: vec![creator_id.to_string()],
            created_at: crate::utils::current_timestamp(),
        }
    }

    /// Append a participant unless already present; returns whether it was added
    pub fn add_participant(&mut self, user_id: &str) -> bool {
        if self.participants.iter().any(|p| p == user_id) {
            return false;
        }
        self.participants.push(user_id.to_string());
        true
    }
}
