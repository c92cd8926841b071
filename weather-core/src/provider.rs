use crate::{Config, FetchError, WeatherRecord, provider::visualcrossing::VisualCrossingProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod visualcrossing;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for `city`. Implementations never retry.
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError>;
}

/// Construct the weather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = VisualCrossingProvider::with_base_url(api_key.to_owned(), config.base_url().to_owned());

    Ok(Box::new(provider))
}
