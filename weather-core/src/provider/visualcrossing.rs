use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info};

use crate::{
    error::FetchError,
    model::{ProviderResponse, WeatherRecord},
    normalize::normalize,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl VisualCrossingProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    /// `{base}/{city}/today` with the city percent-encoded as one path segment.
    fn timeline_url(&self, city: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::Network(format!("invalid provider base URL: {e}")))?;

        url.path_segments_mut()
            .map_err(|_| FetchError::Network("provider base URL cannot have path segments".into()))?
            .pop_if_empty()
            .push(city)
            .push("today");

        Ok(url)
    }
}

/// Failure for a non-2xx provider status, `None` on success.
pub fn classify_status(status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }

    Some(match status.as_u16() {
        400 => FetchError::NotFound,
        401 => FetchError::Unauthorized,
        429 => FetchError::RateLimited,
        other => FetchError::Provider { status: other },
    })
}

#[async_trait]
impl WeatherProvider for VisualCrossingProvider {
    async fn fetch(&self, city: &str) -> Result<WeatherRecord, FetchError> {
        if city.trim().is_empty() {
            return Err(FetchError::InvalidInput);
        }

        let url = self.timeline_url(city)?;
        info!(%city, "fetching current conditions");

        let res = self
            .http
            .get(url)
            .query(&[
                ("unitGroup", "metric"),
                ("key", self.api_key.as_str()),
                ("include", "current"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = res.status();
        debug!(%city, %status, "provider responded");
        if let Some(err) = classify_status(status) {
            return Err(err);
        }

        let body = res
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read provider response body: {e}")))?;

        let parsed: ProviderResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {e}")))?;

        normalize(&parsed, Utc::now())
    }
}
