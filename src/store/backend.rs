//! Durable backends for the three state tables
//!
//! A backend only reads and rewrites whole tables; the in-memory view and
//! write-through policy live in [`crate::store::table::Table`].

use crate::error::{RankedError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::debug;

/// The independent tables the coordinator persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    Settings,
    Matches,
    Players,
}

impl TableName {
    pub fn file_name(&self) -> &'static str {
        match self {
            TableName::Settings => "settings.json",
            TableName::Matches => "matches.json",
            TableName::Players => "players.json",
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Trait for whole-table storage operations
pub trait TableBackend: Send + Sync {
    /// Read the serialized table, `None` if it was never written
    fn read(&self, table: TableName) -> Result<Option<String>>;

    /// Replace the serialized table
    fn write(&self, table: TableName, contents: &str) -> Result<()>;

    /// Short description for startup logging
    fn describe(&self) -> String;
}

/// JSON files in a data directory, rewritten atomically via temp file + rename
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Open (and create if needed) a data directory
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| RankedError::Storage {
            message: format!("Failed to create data directory {}: {}", dir.display(), e),
        })?;
        Ok(Self { dir })
    }

    pub fn path(&self, table: TableName) -> PathBuf {
        self.dir.join(table.file_name())
    }
}

impl TableBackend for JsonFileBackend {
    fn read(&self, table: TableName) -> Result<Option<String>> {
        let path = self.path(table);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|e| RankedError::Storage {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Ok(Some(contents))
    }

    fn write(&self, table: TableName, contents: &str) -> Result<()> {
        let path = self.path(table);
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, contents).map_err(|e| RankedError::Storage {
            message: format!("Failed to write {}: {}", temp_path.display(), e),
        })?;
        fs::rename(&temp_path, &path).map_err(|e| RankedError::Storage {
            message: format!("Failed to replace {}: {}", path.display(), e),
        })?;

        debug!("Persisted {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json files in {}", self.dir.display())
    }
}

/// In-memory backend for tests; records writes and can be told to fail them
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    files: RwLock<HashMap<TableName, String>>,
    writes: RwLock<Vec<TableName>>,
    fail_writes: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset a table's serialized contents (for testing)
    pub fn with_table(self, table: TableName, contents: &str) -> Self {
        if let Ok(mut files) = self.files.write() {
            files.insert(table, contents.to_string());
        }
        self
    }

    /// Current serialized contents of a table
    pub fn contents(&self, table: TableName) -> Option<String> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(&table).cloned())
    }

    /// Number of successful writes to a table
    pub fn write_count(&self, table: TableName) -> usize {
        self.writes
            .read()
            .map(|writes| writes.iter().filter(|t| **t == table).count())
            .unwrap_or(0)
    }

    /// Make every following write fail (for testing rollback)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl TableBackend for InMemoryBackend {
    fn read(&self, table: TableName) -> Result<Option<String>> {
        let files = self.files.read().map_err(|_| RankedError::Internal {
            message: "Failed to acquire backend read lock".to_string(),
        })?;
        Ok(files.get(&table).cloned())
    }

    fn write(&self, table: TableName, contents: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RankedError::Storage {
                message: format!("Simulated write failure for {}", table),
            });
        }

        let mut files = self.files.write().map_err(|_| RankedError::Internal {
            message: "Failed to acquire backend write lock".to_string(),
        })?;
        files.insert(table, contents.to_string());

        if let Ok(mut writes) = self.writes.write() {
            writes.push(table);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory tables".to_string()
    }
}
