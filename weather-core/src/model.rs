use serde::{Deserialize, Serialize};

/// Normalized current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub location: String,
    pub temperature: i64,
    pub feels_like: i64,
    pub condition: String,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub pressure: i64,
    pub visibility: f64,
    pub uv_index: f64,
    pub icon: String,
    /// ISO-8601 time at which the record was normalized.
    pub last_updated: String,
}

/// The single persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Lower-cased, trimmed city key.
    pub city: String,
    #[serde(rename = "data")]
    pub record: WeatherRecord,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

/// Raw payload from the VisualCrossing timeline endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderResponse {
    pub resolved_address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub current_conditions: Option<ProviderConditions>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConditions {
    pub temp: Option<f64>,
    pub conditions: String,
    pub humidity: Option<f64>,
    pub windspeed: Option<f64>,
    pub pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub uvindex: Option<f64>,
    pub feelslike: Option<f64>,
    pub icon: String,
    #[serde(default)]
    pub datetime: Option<String>,
}

/// Display glyph for a provider icon code.
pub fn icon_glyph(code: &str) -> &'static str {
    match code {
        "clear-day" => "☀️",
        "clear-night" => "🌙",
        "partly-cloudy-day" => "⛅",
        "partly-cloudy-night" | "cloudy" => "☁️",
        "rain" => "🌧️",
        "snow" => "❄️",
        "sleet" | "hail" => "🌨️",
        "wind" => "💨",
        "fog" => "🌫️",
        "thunder" | "thunderstorm" => "⛈️",
        _ => "🌤️",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_camel_case() {
        let record = WeatherRecord {
            location: "Paris, France".into(),
            temperature: 18,
            feels_like: 17,
            condition: "Clear".into(),
            description: "Sunny".into(),
            humidity: 40,
            wind_speed: 3.2,
            pressure: 1016,
            visibility: 10.0,
            uv_index: 4.0,
            icon: "clear-day".into(),
            last_updated: "2024-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["feelsLike"], 17);
        assert_eq!(json["windSpeed"], 3.2);
        assert!(json.get("lastUpdated").is_some());
    }

    #[test]
    fn provider_response_without_current_conditions_parses() {
        let raw = r#"{"resolvedAddress":"Nowhere","description":"x"}"#;
        let parsed: ProviderResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.current_conditions.is_none());
    }

    #[test]
    fn unknown_icon_gets_default_glyph() {
        assert_eq!(icon_glyph("clear-night"), "🌙");
        assert_eq!(icon_glyph("volcanic-ash"), "🌤️");
    }
}
