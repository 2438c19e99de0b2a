//! Configuration management for the ranked room service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;

pub use app::{
    validate_config, AppConfig, DiscordSettings, LeaderboardSettings, MatchSettings,
    ServiceSettings, StorageSettings,
};
