//! Write-through in-memory table
//!
//! Every mutation holds the table's write lock across the change and the
//! whole-table rewrite. A failed rewrite restores the previous row, so the
//! in-memory view never runs ahead of durable storage.

use crate::error::{RankedError, Result};
use crate::store::backend::{TableBackend, TableName};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::error;

pub struct Table<T> {
    name: TableName,
    rows: RwLock<BTreeMap<String, T>>,
    backend: Arc<dyn TableBackend>,
}

impl<T> Table<T>
where
    T: Clone + Serialize,
{
    pub fn new(name: TableName, rows: BTreeMap<String, T>, backend: Arc<dyn TableBackend>) -> Self {
        Self {
            name,
            rows: RwLock::new(rows),
            backend,
        }
    }

    fn read_rows(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, T>>> {
        self.rows.read().map_err(|_| RankedError::Internal {
            message: format!("Failed to acquire {} read lock", self.name),
        })
    }

    fn write_rows(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, T>>> {
        self.rows.write().map_err(|_| RankedError::Internal {
            message: format!("Failed to acquire {} write lock", self.name),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<T>> {
        Ok(self.read_rows()?.get(key).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read_rows()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read_rows()?.is_empty())
    }

    /// Rows matching a predicate, in key order
    pub fn filter_values(&self, predicate: impl Fn(&T) -> bool) -> Result<Vec<T>> {
        Ok(self
            .read_rows()?
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect())
    }

    /// Existing row, or a freshly created and persisted one
    pub fn get_or_create(&self, key: &str, create: impl FnOnce() -> T) -> Result<T> {
        if let Some(row) = self.get(key)? {
            return Ok(row);
        }

        let mut rows = self.write_rows()?;
        // Another request may have created it between the two locks
        if let Some(row) = rows.get(key) {
            return Ok(row.clone());
        }
        let row = create();
        rows.insert(key.to_string(), row.clone());
        self.commit(&mut rows, key, None)?;
        Ok(row)
    }

    /// Read-modify-write of one row, creating it first if absent
    pub fn mutate<R>(
        &self,
        key: &str,
        create: impl FnOnce() -> T,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<(T, R)> {
        let mut rows = self.write_rows()?;
        let previous = rows.get(key).cloned();
        let row = rows.entry(key.to_string()).or_insert_with(create);
        let output = f(row);
        let updated = row.clone();
        self.commit(&mut rows, key, previous)?;
        Ok((updated, output))
    }

    /// Read-modify-write of an existing row; `None` if the row is absent
    pub fn mutate_existing<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<(T, R)>> {
        let mut rows = self.write_rows()?;
        let Some(row) = rows.get_mut(key) else {
            return Ok(None);
        };
        let previous = row.clone();
        let output = f(row);
        let updated = row.clone();
        self.commit(&mut rows, key, Some(previous))?;
        Ok(Some((updated, output)))
    }

    pub fn insert(&self, key: &str, value: T) -> Result<()> {
        let mut rows = self.write_rows()?;
        let previous = rows.insert(key.to_string(), value);
        self.commit(&mut rows, key, previous)
    }

    pub fn remove(&self, key: &str) -> Result<Option<T>> {
        let mut rows = self.write_rows()?;
        let Some(removed) = rows.remove(key) else {
            return Ok(None);
        };
        self.commit(&mut rows, key, Some(removed.clone()))?;
        Ok(Some(removed))
    }

    /// Persist the table; on failure put `previous` back under `key`
    fn commit(
        &self,
        rows: &mut BTreeMap<String, T>,
        key: &str,
        previous: Option<T>,
    ) -> Result<()> {
        let result = serde_json::to_string_pretty(&*rows)
            .map_err(RankedError::from)
            .and_then(|json| self.backend.write(self.name, &json));

        if let Err(e) = result {
            error!("Failed to persist {}, reverting row '{}': {}", self.name, key, e);
            match previous {
                Some(row) => {
                    rows.insert(key.to_string(), row);
                }
                None => {
                    rows.remove(key);
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::InMemoryBackend;

    fn create_table() -> (Table<u32>, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let table = Table::new(TableName::Players, BTreeMap::new(), backend.clone());
        (table, backend)
    }

    #[test]
    fn test_get_or_create_persists_once() {
        let (table, backend) = create_table();
        assert_eq!(table.get_or_create("a", || 7).unwrap(), 7);
        assert_eq!(table.get_or_create("a", || 9).unwrap(), 7);
        assert_eq!(backend.write_count(TableName::Players), 1);
    }

    #[test]
    fn test_mutate_writes_whole_table() {
        let (table, backend) = create_table();
        table.insert("a", 1).unwrap();
        let (updated, doubled) = table.mutate("b", || 10, |v| {
            *v += 5;
            *v * 2
        })
        .unwrap();

        assert_eq!(updated, 15);
        assert_eq!(doubled, 30);
        let json: BTreeMap<String, u32> =
            serde_json::from_str(&backend.contents(TableName::Players).unwrap()).unwrap();
        assert_eq!(json.get("a"), Some(&1));
        assert_eq!(json.get("b"), Some(&15));
    }

    #[test]
    fn test_failed_write_reverts_row() {
        let (table, backend) = create_table();
        table.insert("a", 1).unwrap();

        backend.set_fail_writes(true);
        assert!(table.mutate("a", || 0, |v| *v = 99).is_err());
        assert!(table.mutate("new", || 0, |v| *v = 1).is_err());
        assert!(table.remove("a").is_err());

        assert_eq!(table.get("a").unwrap(), Some(1));
        assert_eq!(table.get("new").unwrap(), None);
    }

    #[test]
    fn test_mutate_existing_skips_missing_rows() {
        let (table, backend) = create_table();
        assert!(table.mutate_existing("ghost", |v| *v += 1).unwrap().is_none());
        assert_eq!(backend.write_count(TableName::Players), 0);
    }
}
