use chrono::{DateTime, Local};
use cityweather_core::{WeatherRecord, icon_glyph};

pub fn print_record(record: &WeatherRecord) {
    println!("{} {}", icon_glyph(&record.icon), record.location);
    println!("  {}°C, feels like {}°C, {}", record.temperature, record.feels_like, record.condition);
    println!("  {}", record.description);
    println!(
        "  humidity {}%  wind {} km/h  pressure {} hPa",
        record.humidity, record.wind_speed, record.pressure
    );
    println!("  visibility {} km  UV {}", record.visibility, record.uv_index);
    println!("  updated {}", updated_at(&record.last_updated));
}

/// Local wall-clock rendering of an ISO-8601 timestamp; unparseable input is shown as-is.
fn updated_at(iso: &str) -> String {
    DateTime::parse_from_rfc3339(iso)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| iso.to_string())
}
