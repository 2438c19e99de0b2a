//! Ranked Room - guild-scoped ranked match coordinator for Discord
//!
//! Private match rooms, host-reported outcomes, per-mode ELO tracks with
//! rank tiers, and self-healing leaderboard panels, all persisted to JSON
//! tables and driven through slash commands.

pub mod commands;
pub mod config;
pub mod discord;
pub mod error;
pub mod leaderboard;
pub mod matches;
pub mod metrics;
pub mod platform;
pub mod rating;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankedError, Result};
pub use types::*;

// Re-export key components
pub use commands::{Command, CommandRouter, Invocation, Reply};
pub use platform::Platform;
pub use store::Store;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
