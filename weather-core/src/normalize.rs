//! Mapping from the provider schema to [`WeatherRecord`].

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    error::FetchError,
    model::{ProviderResponse, WeatherRecord},
};

/// Normalize a provider response. `now` becomes the record's `last_updated`.
pub fn normalize(response: &ProviderResponse, now: DateTime<Utc>) -> Result<WeatherRecord, FetchError> {
    let current = response.current_conditions.as_ref().ok_or_else(|| {
        FetchError::MalformedResponse("response has no currentConditions block".to_string())
    })?;

    let description = response
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(&current.conditions)
        .to_string();

    let humidity = round_whole(current.humidity.unwrap_or_default()).clamp(0, 100) as u8;

    Ok(WeatherRecord {
        location: response.resolved_address.clone(),
        temperature: round_whole(current.temp.unwrap_or_default()),
        feels_like: round_whole(current.feelslike.unwrap_or_default()),
        condition: current.conditions.clone(),
        description,
        humidity,
        wind_speed: round_tenth(current.windspeed.unwrap_or_default()).max(0.0),
        pressure: round_whole(current.pressure.unwrap_or_default()),
        visibility: round_tenth(current.visibility.unwrap_or_default()),
        uv_index: round_tenth(current.uvindex.unwrap_or_default()),
        icon: current.icon.clone(),
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Halves round toward positive infinity: `-2.5 -> -2`, `2.5 -> 3`.
fn round_whole(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn round_tenth(value: f64) -> f64 {
    ((value * 10.0) + 0.5).floor() / 10.0
}
