//! Main application configuration
//!
//! Defaults, environment variable loading, TOML files and validation for the
//! ranked room service.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub discord: DiscordSettings,
    pub storage: StorageSettings,
    pub matches: MatchSettings,
    pub leaderboard: LeaderboardSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Bind address of the health endpoint
    pub health_host: String,
    /// Port of the health endpoint
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Discord connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Bot token; never logged
    #[serde(skip_serializing)]
    pub token: String,
    /// Register slash commands when the gateway reports ready
    pub register_commands: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding settings.json, matches.json and players.json
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Grace period between closing a match and deleting its room
    pub room_deletion_delay_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Players listed per leaderboard
    pub size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "ranked-room".to_string(),
            log_level: "info".to_string(),
            health_host: "0.0.0.0".to_string(),
            health_port: 5000,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            register_commands: true,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            room_deletion_delay_seconds: 5,
        }
    }
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self { size: 10 }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", name, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Load a TOML file; the token and any set environment variables still apply
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;

        validate_config(&config)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HEALTH_HOST") {
            self.service.health_host = host;
        }
        // HEALTH_PORT takes precedence over PORT
        if let Some(port) = parse_var("PORT")? {
            self.service.health_port = port;
        }
        if let Some(port) = parse_var("HEALTH_PORT")? {
            self.service.health_port = port;
        }
        if let Some(timeout) = parse_var("SHUTDOWN_TIMEOUT_SECONDS")? {
            self.service.shutdown_timeout_seconds = timeout;
        }

        // Discord
        if let Ok(token) = env::var("DISCORD_BOT_TOKEN") {
            self.discord.token = token;
        }
        if let Some(register) = parse_var("REGISTER_COMMANDS")? {
            self.discord.register_commands = register;
        }

        // Storage
        if let Ok(dir) = env::var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        // Matches and leaderboard
        if let Some(delay) = parse_var("ROOM_DELETION_DELAY_SECONDS")? {
            self.matches.room_deletion_delay_seconds = delay;
        }
        if let Some(size) = parse_var("LEADERBOARD_SIZE")? {
            self.leaderboard.size = size;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get room deletion delay as Duration
    pub fn room_deletion_delay(&self) -> Duration {
        Duration::from_secs(self.matches.room_deletion_delay_seconds)
    }

    /// Address the health endpoint binds to
    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.service.health_host, self.service.health_port)
    }
}

/// Validate configuration values
///
/// The bot token is checked separately at startup so that `--dry-run` works
/// without one.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.service.health_host.trim().is_empty() {
        return Err(anyhow!("Health host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(anyhow!("Data directory cannot be empty"));
    }

    if config.matches.room_deletion_delay_seconds > 3600 {
        return Err(anyhow!("Room deletion delay cannot exceed one hour"));
    }

    if config.leaderboard.size == 0 || config.leaderboard.size > 25 {
        return Err(anyhow!("Leaderboard size must be between 1 and 25"));
    }

    Ok(())
}
