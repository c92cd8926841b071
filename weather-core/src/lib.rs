//! Core library for the `cityweather` client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider client and response normalization
//! - The single-entry weather cache over a pluggable key-value store
//! - The retrieval coordinator that a UI drives and renders
//!
//! It is used by `cityweather-cli`, but can also be embedded by other front ends.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod storage;
pub mod theme;

pub use cache::CacheStore;
pub use config::Config;
pub use coordinator::{Coordinator, WeatherState};
pub use error::{FailureKind, FetchError, StorageError};
pub use model::{CacheEntry, WeatherRecord, icon_glyph};
pub use provider::{WeatherProvider, provider_from_config};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{ThemePreference, ThemeSettings};
