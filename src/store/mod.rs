//! Persistent state for guild settings, open match rooms and player records
//!
//! The three tables are loaded once at startup (with migration) and every
//! mutation is written through to the backend before it returns.

pub mod backend;
pub mod migrate;
pub mod table;

pub use backend::{InMemoryBackend, JsonFileBackend, TableBackend, TableName};
pub use migrate::MigrationReport;
pub use table::Table;

use crate::error::Result;
use crate::types::{GuildSettings, MatchRoom, PlayerRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Row counts for health reporting
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreCounts {
    pub guilds: usize,
    pub active_matches: usize,
    pub players: usize,
}

/// The coordinator's durable state
pub struct Store {
    settings: Table<GuildSettings>,
    matches: Table<MatchRoom>,
    players: Table<PlayerRecord>,
    backend_description: String,
}

impl Store {
    /// Load all tables from a backend, normalizing legacy rows
    pub fn load(backend: Arc<dyn TableBackend>) -> Result<Self> {
        let mut report = MigrationReport::default();

        let settings = migrate::migrate_settings(
            backend.read(TableName::Settings)?.as_deref(),
            &mut report,
        )?;
        let matches =
            migrate::migrate_matches(backend.read(TableName::Matches)?.as_deref(), &mut report)?;
        let players =
            migrate::migrate_players(backend.read(TableName::Players)?.as_deref(), &mut report)?;

        info!(
            "Loaded {} guild settings, {} active matches, {} player records from {}",
            settings.len(),
            matches.len(),
            players.len(),
            backend.describe()
        );
        if !report.is_clean() {
            warn!("Normalized persisted state on load: {:?}", report);
        }

        let backend_description = backend.describe();
        Ok(Self {
            settings: Table::new(TableName::Settings, settings, backend.clone()),
            matches: Table::new(TableName::Matches, matches, backend.clone()),
            players: Table::new(TableName::Players, players, backend),
            backend_description,
        })
    }

    /// Empty store over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(InMemoryBackend::new()))
    }

    /// Empty store over the given backend, ignoring whatever it holds
    pub fn with_backend(backend: Arc<dyn TableBackend>) -> Self {
        let backend_description = backend.describe();
        Self {
            settings: Table::new(TableName::Settings, Default::default(), backend.clone()),
            matches: Table::new(TableName::Matches, Default::default(), backend.clone()),
            players: Table::new(TableName::Players, Default::default(), backend),
            backend_description,
        }
    }

    pub fn describe(&self) -> &str {
        &self.backend_description
    }

    // --- players ---

    /// Player record, created with defaults on first lookup
    pub fn player(&self, guild_id: &str, user_id: &str) -> Result<PlayerRecord> {
        self.players
            .get_or_create(&PlayerRecord::key(guild_id, user_id), || {
                PlayerRecord::new(guild_id, user_id)
            })
    }

    /// Mutate a player record (creating it if needed) and persist
    pub fn update_player<R>(
        &self,
        guild_id: &str,
        user_id: &str,
        f: impl FnOnce(&mut PlayerRecord) -> R,
    ) -> Result<(PlayerRecord, R)> {
        self.players.mutate(
            &PlayerRecord::key(guild_id, user_id),
            || PlayerRecord::new(guild_id, user_id),
            f,
        )
    }

    /// All records belonging to one guild, in key order
    pub fn guild_players(&self, guild_id: &str) -> Result<Vec<PlayerRecord>> {
        self.players
            .filter_values(|record| record.guild_id == guild_id)
    }

    // --- settings ---

    /// Guild settings, created empty on first lookup
    pub fn settings(&self, guild_id: &str) -> Result<GuildSettings> {
        self.settings.get_or_create(guild_id, GuildSettings::default)
    }

    pub fn update_settings<R>(
        &self,
        guild_id: &str,
        f: impl FnOnce(&mut GuildSettings) -> R,
    ) -> Result<(GuildSettings, R)> {
        self.settings.mutate(guild_id, GuildSettings::default, f)
    }

    // --- match rooms ---

    pub fn room(&self, room_id: &str) -> Result<Option<MatchRoom>> {
        self.matches.get(room_id)
    }

    pub fn insert_room(&self, room_id: &str, room: MatchRoom) -> Result<()> {
        self.matches.insert(room_id, room)
    }

    pub fn update_room<R>(
        &self,
        room_id: &str,
        f: impl FnOnce(&mut MatchRoom) -> R,
    ) -> Result<Option<(MatchRoom, R)>> {
        self.matches.mutate_existing(room_id, f)
    }

    pub fn remove_room(&self, room_id: &str) -> Result<Option<MatchRoom>> {
        self.matches.remove(room_id)
    }

    pub fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            guilds: self.settings.len()?,
            active_matches: self.matches.len()?,
            players: self.players.len()?,
        })
    }
}
