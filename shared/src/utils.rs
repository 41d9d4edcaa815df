// Formatting helpers shared by the signal model and the engine's log lines.
use chrono::{DateTime, Utc};
use chrono_tz::US::Eastern;

/// Prices and ratios are always shown with five decimals.
pub fn format_price(value: f64) -> String {
    format!("{:.5}", value)
}

// The "(EST)" suffix is literal; daylight saving time still shifts the clock value.
pub fn format_eastern_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Eastern).format("%I:%M %p (EST)").to_string()
}
