//! Command/event routing
//!
//! Gateway interactions are parsed into a typed [`Command`] and handed to the
//! [`CommandRouter`], which runs the operation and renders a [`Reply`].

pub mod render;
pub mod reply;
pub mod router;

pub use reply::{Panel, PanelField, Reply};
pub use router::{CommandRouter, RouterSettings};

use crate::matches::{MemberAccess, Requester};
use crate::types::{AutoStreakKind, ChannelId, CounterField, GuildId, MatchType, RoleId, UserId};

/// A parsed slash command or button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Administrator configuration
    Setup,
    SetHosts { role_ids: Vec<RoleId> },
    SetCategory { channel_id: ChannelId, is_category: bool },
    SetLogChannel { channel_id: ChannelId },
    SetLeaderboardChannel { channel_id: ChannelId },
    SetDodgeChannel { channel_id: ChannelId },

    // Everyone
    ViewHosts,
    Stats { player_id: Option<UserId> },
    EloLeaderboard { mode: Option<MatchType> },
    StartMatch { match_type: MatchType },

    // Inside a match room
    Add { user_id: UserId },
    Close,

    // Hosts
    Win { user_id: UserId },
    Lose { user_id: UserId },
    SetStreak { user_id: UserId, kind: AutoStreakKind, count: i64 },
    ClearStreak { user_id: UserId },
    AddElo { user_id: UserId, amount: i64, mode: Option<MatchType> },
    RemoveElo { user_id: UserId, amount: i64, mode: Option<MatchType> },
    AdjustRecord { user_id: UserId, field: CounterField, amount: i64 },
    Dodge { user_id: UserId },
    UpdateLeaderboard { mode: Option<MatchType> },
}

/// Who may run a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Administrators,
    Hosts,
    Everyone,
}

impl Command {
    /// Stable name for logging and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Command::Setup => "setup",
            Command::SetHosts { .. } => "sethosts",
            Command::SetCategory { .. } => "setcategory",
            Command::SetLogChannel { .. } => "setlogchannel",
            Command::SetLeaderboardChannel { .. } => "setleaderboardchannel",
            Command::SetDodgeChannel { .. } => "setdodgechannel",
            Command::ViewHosts => "viewhosts",
            Command::Stats { .. } => "stats",
            Command::EloLeaderboard { .. } => "eloleaderboard",
            Command::StartMatch { .. } => "start_match",
            Command::Add { .. } => "add",
            Command::Close => "close",
            Command::Win { .. } => "win",
            Command::Lose { .. } => "lose",
            Command::SetStreak { .. } => "setstreak",
            Command::ClearStreak { .. } => "clearstreak",
            Command::AddElo { .. } => "addelo",
            Command::RemoveElo { .. } => "removeelo",
            Command::AdjustRecord { .. } => "adjustrecord",
            Command::Dodge { .. } => "dodge",
            Command::UpdateLeaderboard { .. } => "updateleaderboard",
        }
    }

    pub fn audience(&self) -> Audience {
        match self {
            Command::Setup
            | Command::SetHosts { .. }
            | Command::SetCategory { .. }
            | Command::SetLogChannel { .. }
            | Command::SetLeaderboardChannel { .. }
            | Command::SetDodgeChannel { .. } => Audience::Administrators,
            Command::Win { .. }
            | Command::Lose { .. }
            | Command::SetStreak { .. }
            | Command::ClearStreak { .. }
            | Command::AddElo { .. }
            | Command::RemoveElo { .. }
            | Command::AdjustRecord { .. }
            | Command::Dodge { .. }
            | Command::UpdateLeaderboard { .. } => Audience::Hosts,
            // Close is host-only too, but the room check comes first
            Command::ViewHosts
            | Command::Stats { .. }
            | Command::EloLeaderboard { .. }
            | Command::StartMatch { .. }
            | Command::Add { .. }
            | Command::Close => Audience::Everyone,
        }
    }

    /// Whether a successful reply is only shown to the invoking member
    pub fn replies_ephemerally(&self) -> bool {
        matches!(
            self,
            Command::SetHosts { .. }
                | Command::SetCategory { .. }
                | Command::SetLogChannel { .. }
                | Command::SetLeaderboardChannel { .. }
                | Command::SetDodgeChannel { .. }
                | Command::ViewHosts
                | Command::StartMatch { .. }
                | Command::SetStreak { .. }
                | Command::ClearStreak { .. }
                | Command::UpdateLeaderboard { .. }
        )
    }

    /// Parse a button's custom id
    pub fn from_button(custom_id: &str) -> Option<Command> {
        let match_type = custom_id.strip_prefix("start_")?.parse().ok()?;
        Some(Command::StartMatch { match_type })
    }
}

/// One inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub guild_id: GuildId,
    /// Channel the command was used in
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub command: Command,
    /// Member roles and permissions delivered with the interaction
    pub access: Option<MemberAccess>,
}

impl Invocation {
    pub fn new(guild_id: &str, channel_id: &str, user_id: &str, command: Command) -> Self {
        Self {
            guild_id: guild_id.to_string(),
            channel_id: channel_id.to_string(),
            user_id: user_id.to_string(),
            command,
            access: None,
        }
    }

    pub fn with_access(mut self, access: Option<MemberAccess>) -> Self {
        self.access = access;
        self
    }

    pub fn requester(&self) -> Requester {
        Requester {
            user_id: self.user_id.clone(),
            access: self.access.clone(),
        }
    }
}
