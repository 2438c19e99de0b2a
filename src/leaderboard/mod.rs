//! ELO leaderboards
//!
//! Standings are computed per mode from the players table and published as
//! one editable panel per mode in the guild's leaderboard channel.

pub mod render;
pub mod standings;
pub mod sync;

pub use render::{leaderboard_panel, position_marker, tier_legend, EMPTY_LEADERBOARD};
pub use standings::{rank_players, standings, Standing, DEFAULT_LEADERBOARD_SIZE};
pub use sync::{LeaderboardSync, PanelAction, PanelUpdateResult};
