//! Persisted light/dark preference.
//!
//! [`ThemeSettings`] is constructed once and handed to whatever renders the
//! UI; nothing in the core reads it implicitly.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::storage::{KeyValueStore, THEME_PREFERENCE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemePreference {
    Light,
    Dark,
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, ThemePreference::Dark)
    }

    /// Stored values other than `"dark"` read as light.
    fn from_stored(value: &str) -> Self {
        if value == "dark" { ThemePreference::Dark } else { ThemePreference::Light }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct ThemeSettings {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<ThemePreference>,
}

impl ThemeSettings {
    /// Read the stored preference, or use `system_default` when none is stored.
    pub async fn load(store: Arc<dyn KeyValueStore>, system_default: ThemePreference) -> Self {
        let current = match store.get(THEME_PREFERENCE_KEY).await {
            Ok(Some(value)) => ThemePreference::from_stored(value.trim()),
            Ok(None) => system_default,
            Err(e) => {
                warn!(error = %e, "failed to load theme preference");
                system_default
            }
        };

        Self { store, current: RwLock::new(current) }
    }

    pub async fn current(&self) -> ThemePreference {
        *self.current.read().await
    }

    /// Flip and persist the preference. The in-memory value flips even if
    /// persisting fails.
    pub async fn toggle(&self) -> ThemePreference {
        let next = {
            let mut current = self.current.write().await;
            *current = current.toggled();
            *current
        };

        if let Err(e) = self.store.set(THEME_PREFERENCE_KEY, next.as_str()).await {
            warn!(error = %e, "failed to save theme preference");
        }

        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::StorageError, storage::MemoryStore};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Rejected("read-only".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Rejected("read-only".into()))
        }

        async fn remove(&self, _keys: &[&str]) -> Result<(), StorageError> {
            Err(StorageError::Rejected("read-only".into()))
        }
    }

    #[tokio::test]
    async fn uses_system_default_when_nothing_stored() {
        let settings = ThemeSettings::load(Arc::new(MemoryStore::new()), ThemePreference::Dark).await;
        assert_eq!(settings.current().await, ThemePreference::Dark);
    }

    #[tokio::test]
    async fn stored_preference_wins_over_default() {
        let store = Arc::new(MemoryStore::new());
        store.set(THEME_PREFERENCE_KEY, "light").await.unwrap();

        let settings = ThemeSettings::load(store, ThemePreference::Dark).await;
        assert_eq!(settings.current().await, ThemePreference::Light);
    }

    #[tokio::test]
    async fn toggle_persists() {
        let store = Arc::new(MemoryStore::new());
        let settings = ThemeSettings::load(store.clone(), ThemePreference::Light).await;

        assert_eq!(settings.toggle().await, ThemePreference::Dark);
        assert_eq!(store.get(THEME_PREFERENCE_KEY).await.unwrap().as_deref(), Some("dark"));

        let reloaded = ThemeSettings::load(store, ThemePreference::Light).await;
        assert!(reloaded.current().await.is_dark());
    }

    #[tokio::test]
    async fn storage_failures_are_not_fatal() {
        let settings = ThemeSettings::load(Arc::new(BrokenStore), ThemePreference::Light).await;
        assert_eq!(settings.current().await, ThemePreference::Light);
        assert_eq!(settings.toggle().await, ThemePreference::Dark);
        assert_eq!(settings.current().await, ThemePreference::Dark);
    }
}
