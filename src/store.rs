//! Key-value persistence port for dashboard state
//!
//! Filter selections and named presets are kept behind the [`KeyValueStore`] trait
//! so the shell composing the aggregator decides where they live. Reads and writes
//! through [`load_json`] and [`save_json`] never fail the caller: a broken store
//! logs a warning and behaves as empty.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// Key holding the active [`FilterState`]
pub const FILTERS_KEY: &str = "vizai.filters";

/// Key holding the named [`FilterState`] presets
pub const PRESETS_KEY: &str = "vizai.presets";

/// String key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AggregateError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), AggregateError>;
    fn remove(&mut self, key: &str) -> Result<(), AggregateError>;
}

/// Volatile in-process store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AggregateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AggregateError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AggregateError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file, rewritten on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AggregateError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                AggregateError::StoreError(format!("Cannot read {}: {}", path.display(), e))
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), AggregateError> {
        let serialized = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, serialized).map_err(|e| {
            AggregateError::StoreError(format!("Cannot write {}: {}", self.path.display(), e))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AggregateError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AggregateError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<(), AggregateError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// Read a JSON value, falling back to `T::default()` on any failure
pub fn load_json<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match store.get(key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable value for {key}: {e}");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            log::warn!("store read failed for {key}: {e}");
            T::default()
        }
    }
}

/// Write a JSON value; failures are logged and dropped
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T)
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("cannot serialize value for {key}: {e}");
            return;
        }
    };
    if let Err(e) = store.set(key, &json) {
        log::warn!("store write failed for {key}: {e}");
    }
}

/// Behavior selection applied before aggregation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Behaviors to keep; empty keeps all
    #[serde(default)]
    pub behaviors: BTreeSet<String>,
}

impl FilterState {
    pub fn from_behaviors<I, B>(behaviors: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<String>,
    {
        Self {
            behaviors: behaviors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

/// Named filter presets
pub type FilterPresets = BTreeMap<String, FilterState>;

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AggregateError> {
            Err(AggregateError::StoreError("unavailable".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), AggregateError> {
            Err(AggregateError::StoreError("quota exceeded".to_string()))
        }

        fn remove(&mut self, _key: &str) -> Result<(), AggregateError> {
            Err(AggregateError::StoreError("unavailable".to_string()))
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let filter = FilterState::from_behaviors(["Pacing", "Moving"]);

        save_json(&mut store, FILTERS_KEY, &filter);
        let loaded: FilterState = load_json(&store, FILTERS_KEY);
        assert_eq!(loaded, filter);

        store.remove(FILTERS_KEY).unwrap();
        let cleared: FilterState = load_json(&store, FILTERS_KEY);
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_broken_store_is_silent() {
        let mut store = BrokenStore;

        save_json(&mut store, FILTERS_KEY, &FilterState::from_behaviors(["Pacing"]));
        let loaded: FilterState = load_json(&store, FILTERS_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_corrupt_value_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.set(PRESETS_KEY, "{not json").unwrap();

        let presets: FilterPresets = load_json(&store, PRESETS_KEY);
        assert!(presets.is_empty());
    }

    #[test]
    fn test_json_file_store_persists() {
        let path = std::env::temp_dir().join(format!("vizai-store-{}.json", uuid::Uuid::new_v4()));

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            save_json(&mut store, FILTERS_KEY, &FilterState::from_behaviors(["Scratching"]));
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        let loaded: FilterState = load_json(&reopened, FILTERS_KEY);
        assert!(loaded.behaviors.contains("Scratching"));

        fs::remove_file(&path).unwrap();
    }
}
