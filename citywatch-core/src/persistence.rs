//! Durable watch-list persistence.
//!
//! The watch-list is stored as a JSON array of city names under the
//! [`CITIES_KEY`] key of a string key-value store. Persistence is best effort:
//! load failures fall back to the default cities and save failures are only
//! logged.

use std::{
    collections::HashMap,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

use crate::{
    Config,
    error::{PersistenceError, StorageError},
};

pub const CITIES_KEY: &str = "cities";

/// String key-value storage, e.g. a directory of files.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The configured storage dir, or the platform data dir.
    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        if let Some(dir) = &config.storage_dir {
            return Ok(Self::new(dir));
        }

        let dirs = Config::project_dirs().ok_or(StorageError::Unavailable)?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io { path: path.to_path_buf(), source }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        // Readers never observe a half-written file.
        fs::write(&tmp, value).map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_error(&path))?;
        Ok(())
    }
}

/// In-process storage for embedding shells and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.entries.lock().insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and saves the tracked city names.
#[derive(Debug)]
pub struct PersistenceBridge {
    storage: Box<dyn KeyValueStore>,
    defaults: Vec<String>,
}

impl PersistenceBridge {
    pub fn new(storage: Box<dyn KeyValueStore>, defaults: Vec<String>) -> Self {
        Self { storage, defaults }
    }

    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        let storage = FileStore::from_config(config)?;
        Ok(Self::new(Box::new(storage), config.default_cities.clone()))
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// Persisted list, `None` when nothing was ever saved.
    pub fn try_load_tracked_city_ids(&self) -> Result<Option<Vec<String>>, PersistenceError> {
        let Some(raw) = self.storage.get(CITIES_KEY)? else {
            return Ok(None);
        };

        let ids: Vec<String> = serde_json::from_str(&raw)?;
        Ok(Some(ids))
    }

    /// Persisted list, or the defaults when it is absent or unreadable.
    pub fn load_tracked_city_ids(&self) -> Vec<String> {
        match self.try_load_tracked_city_ids() {
            Ok(Some(ids)) => ids,
            Ok(None) => {
                tracing::debug!("no persisted watch-list, using defaults");
                self.defaults.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding persisted watch-list, using defaults");
                self.defaults.clone()
            }
        }
    }

    pub fn save_tracked_city_ids(&self, ids: &[String]) {
        let json = match serde_json::to_string(ids) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize watch-list");
                return;
            }
        };

        if let Err(e) = self.storage.set(CITIES_KEY, &json) {
            tracing::warn!(error = %e, "failed to persist watch-list");
        }
    }
}
