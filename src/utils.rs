/// Utility functions for time handling and formatting
use log::warn;
use time::format_description::well_known::Rfc3339;
use time::{format_description, OffsetDateTime};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86400;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

fn plural(number: i64, unit: &str) -> String {
    if number == 1 {
        format!("{} {}", number, unit)
    } else {
        format!("{} {}s", number, unit)
    }
}

/// Describe how long ago `observed_at` was, relative to `now`
///
/// `observed_at` must be RFC 3339 (explicit offset). Anything else is returned
/// unchanged so the raw value still shows up on the dashboard.
///
/// Negative ages fall into the "Up to date" band.
pub fn relative_freshness(observed_at: &str, now: OffsetDateTime) -> String {
    let timestamp = match OffsetDateTime::parse(observed_at, &Rfc3339) {
        Ok(timestamp) => timestamp,
        Err(e) => {
            warn!("Unparsable timestamp '{}': {}", observed_at, e);
            return observed_at.to_string();
        }
    };

    let elapsed = now.unix_timestamp() - timestamp.unix_timestamp();
    label_for_elapsed(elapsed)
}

/// Banding of an age in whole seconds
pub fn label_for_elapsed(elapsed_seconds: i64) -> String {
    if elapsed_seconds < SECONDS_PER_MINUTE {
        "Up to date".to_string()
    } else if elapsed_seconds < SECONDS_PER_HOUR {
        format!("{} ago", plural(elapsed_seconds / SECONDS_PER_MINUTE, "Minute"))
    } else if elapsed_seconds < SECONDS_PER_DAY {
        format!("{} ago", plural(elapsed_seconds / SECONDS_PER_HOUR, "Hour"))
    } else {
        plural(elapsed_seconds / SECONDS_PER_DAY, "Day")
    }
}
