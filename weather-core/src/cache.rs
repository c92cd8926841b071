//! Single-entry weather cache with lazy expiry.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    error::StorageError,
    model::{CacheEntry, WeatherRecord},
    storage::{KeyValueStore, THEME_PREFERENCE_KEY, WEATHER_CACHE_KEY},
};

/// Entries older than this are treated as absent.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    expiry: Duration,
}

/// Cache key for a user-typed city.
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_expiry(store, DEFAULT_EXPIRY)
    }

    pub fn with_expiry(store: Arc<dyn KeyValueStore>, expiry: Duration) -> Self {
        Self { store, expiry }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Replace the cached entry with `record`, keyed by the normalized `city`.
    pub async fn save(&self, city: &str, record: &WeatherRecord) -> Result<CacheEntry, StorageError> {
        let entry = CacheEntry {
            city: normalize_city(city),
            record: record.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };

        let json = serde_json::to_string(&entry)?;
        self.store.set(WEATHER_CACHE_KEY, &json).await?;

        info!(city = %entry.city, "saved weather to cache");
        Ok(entry)
    }

    /// The cached entry, unless missing or expired. Expired entries are removed.
    pub async fn load(&self) -> Result<Option<CacheEntry>, StorageError> {
        self.load_at(Utc::now().timestamp_millis()).await
    }

    async fn load_at(&self, now_ms: i64) -> Result<Option<CacheEntry>, StorageError> {
        let Some(raw) = self.store.get(WEATHER_CACHE_KEY).await? else {
            debug!("weather cache is empty");
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "ignoring undecodable weather cache entry");
                return Ok(None);
            }
        };

        let age_ms = now_ms - entry.timestamp;
        if age_ms > self.expiry.as_millis() as i64 {
            debug!(city = %entry.city, age_ms, "weather cache entry expired");
            self.store.remove(&[WEATHER_CACHE_KEY]).await?;
            return Ok(None);
        }

        debug!(city = %entry.city, age_ms, "weather cache hit");
        Ok(Some(entry))
    }

    pub async fn is_expired(&self) -> bool {
        match self.load().await {
            Ok(entry) => entry.is_none(),
            Err(e) => {
                warn!(error = %e, "failed to read weather cache");
                true
            }
        }
    }

    /// Remove the cache entry and the theme preference.
    pub async fn clear_all(&self) -> Result<(), StorageError> {
        self.store.remove(&[WEATHER_CACHE_KEY, THEME_PREFERENCE_KEY]).await?;
        info!("cleared cached weather and preferences");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeDelta;

    pub(crate) fn record(location: &str) -> WeatherRecord {
        WeatherRecord {
            location: location.to_string(),
            temperature: 21,
            feels_like: 20,
            condition: "Partially cloudy".into(),
            description: "Partly cloudy throughout the day.".into(),
            humidity: 55,
            wind_speed: 11.2,
            pressure: 1012,
            visibility: 24.1,
            uv_index: 5.0,
            icon: "partly-cloudy-day".into(),
            last_updated: "2024-05-01T12:00:00.000Z".into(),
        }
    }

    fn cache() -> (Arc<MemoryStore>, CacheStore) {
        let store = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(store.clone());
        (store, cache)
    }

    #[tokio::test]
    async fn save_then_load_returns_normalized_city() {
        let (_, cache) = cache();
        let r = record("Paris, France");

        cache.save("  PaRis ", &r).await.unwrap();
        let entry = cache.load().await.unwrap().expect("entry must be present");

        assert_eq!(entry.city, "paris");
        assert_eq!(entry.record, r);
    }

    #[tokio::test]
    async fn save_overwrites_regardless_of_city() {
        let (_, cache) = cache();
        cache.save("Paris", &record("Paris")).await.unwrap();
        cache.save("Berlin", &record("Berlin")).await.unwrap();

        let entry = cache.load().await.unwrap().unwrap();
        assert_eq!(entry.city, "berlin");
        assert_eq!(entry.record.location, "Berlin");
    }

    #[tokio::test]
    async fn expired_entry_is_absent_and_deleted() {
        let (store, cache) = cache();
        let stale = CacheEntry {
            city: "paris".into(),
            record: record("Paris"),
            timestamp: Utc::now().timestamp_millis() - TimeDelta::minutes(61).num_milliseconds(),
        };
        store
            .set(WEATHER_CACHE_KEY, &serde_json::to_string(&stale).unwrap())
            .await
            .unwrap();

        assert!(cache.load().await.unwrap().is_none());
        assert_eq!(store.get(WEATHER_CACHE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn entry_within_window_survives() {
        let (_, cache) = cache();
        let entry = cache.save("Oslo", &record("Oslo")).await.unwrap();

        let later = entry.timestamp + TimeDelta::minutes(59).num_milliseconds();
        assert!(cache.load_at(later).await.unwrap().is_some());
        assert!(!cache.is_expired().await);
    }

    #[tokio::test]
    async fn undecodable_entry_is_treated_as_absent() {
        let (store, cache) = cache();
        store.set(WEATHER_CACHE_KEY, "not json").await.unwrap();
        assert!(cache.load().await.unwrap().is_none());
        assert!(cache.is_expired().await);
    }

    #[tokio::test]
    async fn clear_all_removes_cache_and_theme() {
        let (store, cache) = cache();
        cache.save("Rome", &record("Rome")).await.unwrap();
        store.set(THEME_PREFERENCE_KEY, "dark").await.unwrap();

        cache.clear_all().await.unwrap();

        assert!(cache.load().await.unwrap().is_none());
        assert_eq!(store.get(THEME_PREFERENCE_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn stored_json_uses_data_field() {
        let (store, cache) = cache();
        cache.save("Rome", &record("Rome")).await.unwrap();

        let raw = store.get(WEATHER_CACHE_KEY).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["city"], "rome");
        assert_eq!(json["data"]["location"], "Rome");
        assert!(json["timestamp"].is_i64());
    }
}
