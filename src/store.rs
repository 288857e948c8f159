//! Key-value persistence and the local asset index.
//!
//! The index is the tool's memory of which library entries it created. It is
//! a plain ordered list of identifier strings stored as JSON under one fixed
//! key, defaulting to empty when the key has never been written.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Fixed key under which the index lives in the backing store.
const INDEX_KEY: &str = "local_asset_ids";

/// Errors from the key-value store or index (de)serialization.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt store data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Minimal get/set persistence, the shape of a user-defaults style store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// File-backed store: a single JSON object mapping keys to string values.
///
/// Writes go through a temp file and rename so a crash mid-write never leaves
/// a truncated store on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load_map(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    fn save_map(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(map)?;
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.load_map()?;
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    map: std::sync::Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Repository over the persisted identifier list.
///
/// `append` is read-modify-write with no guard against concurrent writers:
/// two in-flight appends can lose one update (last write wins). Callers
/// serialize write intents; the CLI runs one mutation at a time.
#[derive(Clone)]
pub struct LocalIndex {
    store: Arc<dyn KeyValueStore>,
}

impl LocalIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current identifier list, empty when the key was never written.
    pub fn load(&self) -> Result<Vec<String>, StoreError> {
        match self.store.get(INDEX_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub fn save(&self, ids: &[String]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(ids)?;
        self.store.set(INDEX_KEY, &raw)
    }

    /// Append one identifier, preserving order and duplicates.
    pub fn append(&self, id: &str) -> Result<(), StoreError> {
        let mut ids = self.load()?;
        ids.push(id.to_string());
        self.save(&ids)
    }

    /// Overwrite the list with empty. The key is never removed.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.save(&[])
    }
}
