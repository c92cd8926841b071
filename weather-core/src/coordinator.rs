//! Retrieval coordinator: the state a weather screen renders.
//!
//! The coordinator owns the observable [`WeatherState`] and drives the
//! provider and the cache behind two entry points, [`Coordinator::search_city`]
//! and [`Coordinator::refresh_weather`].
//!
//! Every executed search, refresh, or cache restore is stamped with a
//! generation number. Only the newest generation may write `current` and
//! `error`; results that arrive after a newer request started are dropped.
//! The `loading` and `is_refreshing` flags are cleared only by the request
//! that set them last.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::{
    sync::watch,
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheStore, normalize_city},
    error::FetchError,
    model::{CacheEntry, WeatherRecord},
    provider::WeatherProvider,
};

/// Quiet period before a search actually runs.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

pub const EMPTY_CITY_MESSAGE: &str = "Please enter a city name";
pub const CACHED_FALLBACK_MESSAGE: &str = "Showing cached data. Check your internet connection.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherState {
    pub current: Option<WeatherRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub is_refreshing: bool,
    pub last_searched_city: Option<String>,
}

/// User-facing text for a fetch failure.
pub fn user_message(err: &FetchError) -> String {
    match err {
        FetchError::InvalidInput => "City name is required".to_string(),
        FetchError::NotFound => "City not found. Please check the spelling and try again.".to_string(),
        FetchError::Unauthorized => {
            "API key is invalid. Please configure a valid VisualCrossing API key.".to_string()
        }
        FetchError::RateLimited => "Too many requests. Please try again later.".to_string(),
        FetchError::Provider { status } => format!("Weather service error: {status}"),
        FetchError::Network(_) => "Network error. Please check your internet connection.".to_string(),
        FetchError::MalformedResponse(_) => "Invalid weather data received".to_string(),
    }
}

#[derive(Debug, Default)]
struct Generations {
    latest: u64,
    loading_owner: u64,
    refreshing_owner: u64,
}

impl Generations {
    fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: WeatherState,
    generations: Generations,
}

#[derive(Debug, Default)]
struct Debouncer {
    seq: u64,
    timer: Option<AbortHandle>,
}

#[derive(Debug)]
pub struct Coordinator {
    provider: Arc<dyn WeatherProvider>,
    cache: CacheStore,
    inner: Mutex<Inner>,
    published: watch::Sender<WeatherState>,
    debouncer: Mutex<Debouncer>,
    debounce: Duration,
}

impl Coordinator {
    pub fn new(provider: Arc<dyn WeatherProvider>, cache: CacheStore) -> Self {
        Self::with_debounce(provider, cache, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(provider: Arc<dyn WeatherProvider>, cache: CacheStore, debounce: Duration) -> Self {
        let (published, _) = watch::channel(WeatherState::default());
        Self {
            provider,
            cache,
            inner: Mutex::new(Inner::default()),
            published,
            debouncer: Mutex::new(Debouncer::default()),
            debounce,
        }
    }

    /// Construct a coordinator and restore the cached record in the background.
    pub fn launch(provider: Arc<dyn WeatherProvider>, cache: CacheStore) -> Arc<Self> {
        let coordinator = Arc::new(Self::new(provider, cache));
        let restoring = Arc::clone(&coordinator);
        tokio::spawn(async move { restoring.restore_cached().await });
        coordinator
    }

    pub fn state(&self) -> WeatherState {
        self.published.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.published.subscribe()
    }

    /// Show the cached record, if any, without touching the network.
    pub async fn restore_cached(&self) {
        let generation = self.update(|_, g| g.issue());

        match self.cache.load().await {
            Ok(Some(entry)) => {
                self.apply(generation, |s| {
                    s.current = Some(entry.record);
                    s.last_searched_city = Some(entry.city);
                });
            }
            Ok(None) => debug!("no cached weather to restore"),
            Err(e) => warn!(error = %e, "failed to restore cached weather"),
        }
    }

    /// Schedule a search for `city` after the debounce window.
    ///
    /// A later call before the window elapses cancels this one. A search
    /// that already started is never cancelled. Dropping the returned handle
    /// does not cancel the search.
    pub fn search_city(self: &Arc<Self>, city: impl Into<String>) -> JoinHandle<()> {
        let city = city.into();
        let mut debouncer = self.debouncer.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(timer) = debouncer.timer.take() {
            timer.abort();
        }
        debouncer.seq += 1;
        let seq = debouncer.seq;

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(this.debounce).await;
            if this.fire(seq) {
                this.run_search(city).await;
            }
        });

        debouncer.timer = Some(handle.abort_handle());
        handle
    }

    fn fire(&self, seq: u64) -> bool {
        let mut debouncer = self.debouncer.lock().unwrap_or_else(PoisonError::into_inner);
        if debouncer.seq != seq {
            return false;
        }
        debouncer.timer = None;
        true
    }

    async fn run_search(&self, city: String) {
        if city.trim().is_empty() {
            self.update(|s, g| {
                g.issue();
                s.error = Some(EMPTY_CITY_MESSAGE.to_string());
            });
            return;
        }

        let generation = self.update(|s, g| {
            let generation = g.issue();
            g.loading_owner = generation;
            s.loading = true;
            s.error = None;
            generation
        });
        info!(%city, generation, "searching");

        match self.provider.fetch(&city).await {
            Ok(record) => {
                let applied = self.apply(generation, |s| {
                    s.current = Some(record.clone());
                    s.last_searched_city = Some(city.clone());
                    s.error = None;
                });
                if applied {
                    self.save_quietly(&city, &record).await;
                }
            }
            Err(err) => {
                warn!(%city, kind = %err.kind(), error = %err, "search failed");

                let fallback = if err.kind().is_network_related() {
                    self.cached_for(&city).await
                } else {
                    None
                };

                self.apply(generation, |s| match fallback {
                    Some(entry) => {
                        s.current = Some(entry.record);
                        s.error = Some(CACHED_FALLBACK_MESSAGE.to_string());
                    }
                    None => {
                        s.current = None;
                        s.error = Some(user_message(&err));
                    }
                });
            }
        }

        self.update(|s, g| {
            if g.loading_owner == generation {
                s.loading = false;
            }
        });
    }

    /// Re-fetch the last searched city, keeping the shown record on failure.
    ///
    /// Without a previous search this only reloads the cache.
    pub async fn refresh_weather(&self) {
        let last_city = self.published.borrow().last_searched_city.clone();

        let Some(city) = last_city else {
            let generation = self.update(|s, g| {
                let generation = g.issue();
                g.refreshing_owner = generation;
                s.is_refreshing = true;
                generation
            });
            self.restore_cached().await;
            self.end_refresh(generation);
            return;
        };

        let generation = self.update(|s, g| {
            let generation = g.issue();
            g.refreshing_owner = generation;
            s.is_refreshing = true;
            s.error = None;
            generation
        });
        info!(%city, generation, "refreshing");

        match self.provider.fetch(&city).await {
            Ok(record) => {
                if self.apply(generation, |s| s.current = Some(record.clone())) {
                    self.save_quietly(&city, &record).await;
                }
            }
            Err(err) => {
                warn!(%city, kind = %err.kind(), error = %err, "refresh failed");
                self.apply(generation, |s| s.error = Some(user_message(&err)));
            }
        }

        self.end_refresh(generation);
    }

    fn end_refresh(&self, generation: u64) {
        self.update(|s, g| {
            if g.refreshing_owner == generation {
                s.is_refreshing = false;
            }
        });
    }

    /// Cached entry for `city`, compared case-insensitively.
    async fn cached_for(&self, city: &str) -> Option<CacheEntry> {
        match self.cache.load().await {
            Ok(Some(entry)) if entry.city == normalize_city(city) => Some(entry),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "failed to read cached weather for fallback");
                None
            }
        }
    }

    async fn save_quietly(&self, city: &str, record: &WeatherRecord) {
        if let Err(e) = self.cache.save(city, record).await {
            warn!(%city, error = %e, "failed to cache weather");
        }
    }

    /// Mutate state and generation bookkeeping together, notifying subscribers.
    fn update<R>(&self, f: impl FnOnce(&mut WeatherState, &mut Generations) -> R) -> R {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Inner { state, generations } = &mut *inner;

        let out = f(state, generations);
        self.published.send_replace(state.clone());
        out
    }

    /// Apply `f` only if `generation` is still the newest request.
    fn apply(&self, generation: u64, f: impl FnOnce(&mut WeatherState)) -> bool {
        self.update(|state, g| {
            if g.latest != generation {
                debug!(generation, latest = g.latest, "discarding stale result");
                return false;
            }
            f(state);
            true
        })
    }
}
