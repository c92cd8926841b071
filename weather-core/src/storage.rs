//! Persistent key-value collaborator.
//!
//! The client persists only two keys: the serialized cache entry and the theme
//! preference. [`FileStore`] keeps one file per key inside a data directory;
//! [`MemoryStore`] keeps values in a map and is used by tests and embedders that
//! do not want anything on disk.

use std::{
    collections::HashMap,
    fmt::Debug,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

pub const WEATHER_CACHE_KEY: &str = "weather_cache";
pub const THEME_PREFERENCE_KEY: &str = "theme_preference";

#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove every listed key. Missing keys are not an error.
    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io { key: key.to_string(), source }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| io_error(key, e))?;

        // Replaced atomically: write a sibling then rename over.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await.map_err(|e| io_error(key, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| io_error(key, e))?;
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            match tokio::fs::remove_file(self.path_for(key)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(key, e)),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut values = self.values.lock().await;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}
