//! Storage backends behind the key-value store
//!
//! A backend is a plain synchronous map of string keys to JSON values. The
//! [`KeyValueStore`](super::KeyValueStore) adds the async surface, the shared
//! initialization and the prefix operations on top.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;

use serde_json::Value;
use tracing::{debug, warn};

use super::file_io::{read_json, write_json_atomic};
use crate::error::LedgerError;

/// Raw key-value operations a backend must provide
pub trait StorageBackend: Send + Sync {
    /// Prepare the backend (create files, load state). Called once by the
    /// store before any other method.
    fn open(&self) -> Result<(), LedgerError>;

    fn get(&self, key: &str) -> Result<Option<Value>, LedgerError>;

    /// Insert or overwrite
    fn set(&self, key: &str, value: Value) -> Result<(), LedgerError>;

    /// Remove a key; missing keys are not an error
    fn remove(&self, key: &str) -> Result<(), LedgerError>;

    fn clear(&self) -> Result<(), LedgerError>;

    fn keys(&self) -> Result<Vec<String>, LedgerError>;

    /// Remove several keys and return how many removals succeeded
    ///
    /// The default removes one key at a time, logging and skipping failures.
    fn remove_many(&self, keys: &[String]) -> Result<usize, LedgerError> {
        let mut removed = 0;
        for key in keys {
            match self.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key = key.as_str(), error = %e, "failed to remove key, continuing"),
            }
        }
        Ok(removed)
    }
}

fn lock_poisoned(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(format!("Failed to acquire lock: {}", e))
}

/// Process-local backend, lost on exit
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn open(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, LedgerError> {
        let entries = self.entries.read().map_err(lock_poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, LedgerError> {
        let entries = self.entries.read().map_err(lock_poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

/// Backend persisted as one JSON object in a file
///
/// The whole map is kept in memory and rewritten atomically after every
/// mutation.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), LedgerError> {
        write_json_atomic(&self.path, entries)
    }
}

impl StorageBackend for FileBackend {
    fn open(&self) -> Result<(), LedgerError> {
        let loaded: BTreeMap<String, Value> = read_json(&self.path)?;
        debug!(path = %self.path.display(), keys = loaded.len(), "loaded store file");

        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        *entries = loaded;

        if !self.path.exists() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, LedgerError> {
        let entries = self.entries.read().map_err(lock_poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        let previous = entries.insert(key.to_string(), value);

        if let Err(e) = self.persist(&entries) {
            // Keep memory in line with the file that is still on disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        if let Some(old) = entries.remove(key) {
            if let Err(e) = self.persist(&entries) {
                entries.insert(key.to_string(), old);
                return Err(e);
            }
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        let previous = std::mem::take(&mut *entries);
        if let Err(e) = self.persist(&entries) {
            *entries = previous;
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, LedgerError> {
        let entries = self.entries.read().map_err(lock_poisoned)?;
        Ok(entries.keys().cloned().collect())
    }

    /// All-or-nothing: one file rewrite for the whole batch
    fn remove_many(&self, keys: &[String]) -> Result<usize, LedgerError> {
        let mut entries = self.entries.write().map_err(lock_poisoned)?;
        let removed: Vec<(String, Value)> = keys
            .iter()
            .filter_map(|key| entries.remove_entry(key.as_str()))
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }

        if let Err(e) = self.persist(&entries) {
            entries.extend(removed);
            return Err(e);
        }
        Ok(removed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_memory_backend_crud() {
        let backend = MemoryBackend::new();
        backend.open().unwrap();

        backend.set("a", json!(1)).unwrap();
        backend.set("a", json!(2)).unwrap();
        assert_eq!(backend.get("a").unwrap(), Some(json!(2)));

        backend.remove("a").unwrap();
        backend.remove("a").unwrap();
        assert_eq!(backend.get("a").unwrap(), None);
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_backend_open_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("store.json");
        let backend = FileBackend::new(path.clone());

        backend.open().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_file_backend_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        {
            let backend = FileBackend::new(path.clone());
            backend.open().unwrap();
            backend.set("expenses_1", json!({"amount": 100})).unwrap();
            backend.set("flag", json!(true)).unwrap();
            backend.remove("flag").unwrap();
        }

        let backend = FileBackend::new(path);
        backend.open().unwrap();
        assert_eq!(
            backend.get("expenses_1").unwrap(),
            Some(json!({"amount": 100}))
        );
        assert_eq!(backend.keys().unwrap(), vec!["expenses_1".to_string()]);
    }

    #[test]
    fn test_file_backend_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let backend = FileBackend::new(path);
        assert!(backend.open().is_err());
    }

    /// Swap the store file for a non-empty directory so the rename fails
    fn block_store_file(path: &std::path::Path) {
        std::fs::remove_file(path).unwrap();
        std::fs::create_dir(path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();
    }

    #[test]
    fn test_file_backend_failed_writes_keep_memory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let backend = FileBackend::new(path.clone());
        backend.open().unwrap();
        backend.set("k", json!("v")).unwrap();
        backend.set("j", json!(2)).unwrap();
        block_store_file(&path);

        assert!(backend.remove("k").is_err());
        assert_eq!(backend.get("k").unwrap(), Some(json!("v")));

        assert!(backend.remove_many(&["k".to_string(), "j".to_string()]).is_err());
        assert_eq!(backend.keys().unwrap().len(), 2);

        assert!(backend.clear().is_err());
        assert_eq!(backend.get("j").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_file_backend_remove_many() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let backend = FileBackend::new(path.clone());
        backend.open().unwrap();
        backend.set("budgets_1", json!(1)).unwrap();
        backend.set("budgets_2", json!(2)).unwrap();
        backend.set("expenses_1", json!(3)).unwrap();

        let keys = vec!["budgets_1".to_string(), "budgets_2".to_string(), "nope".to_string()];
        assert_eq!(backend.remove_many(&keys).unwrap(), 2);

        let reopened = FileBackend::new(path);
        reopened.open().unwrap();
        assert_eq!(reopened.keys().unwrap(), vec!["expenses_1".to_string()]);
    }

    #[test]
    fn test_file_backend_clear() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let backend = FileBackend::new(path.clone());
        backend.open().unwrap();
        backend.set("k", json!("v")).unwrap();

        backend.clear().unwrap();

        let reopened = FileBackend::new(path);
        reopened.open().unwrap();
        assert!(reopened.keys().unwrap().is_empty());
    }
}
