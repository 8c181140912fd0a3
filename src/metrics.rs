//! Elapsed time since publication and views-per-hour rate

use crate::error::{Error, Result};
use crate::models::EnrichedVideo;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Floor for elapsed hours: one second
pub const EPSILON_HOURS: f64 = 1.0 / 3600.0;

/// Parse an ISO-8601 / RFC 3339 instant into UTC.
///
/// Strings without an offset are rejected with [`Error::NaiveTimestamp`]
/// instead of being assumed to be UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).is_ok());
    if naive {
        return Err(Error::NaiveTimestamp(trimmed.to_string()));
    }

    Err(Error::Other(format!("Invalid timestamp: '{}'", trimmed)))
}

/// Hours between `published_at` and `now`, never below [`EPSILON_HOURS`]
pub fn elapsed_hours(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = (now - published_at).num_milliseconds() as f64 / 1000.0;
    (seconds / 3600.0).max(EPSILON_HOURS)
}

/// True when the video claims to be published at or after `now`
pub fn is_clock_skewed(published_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    published_at >= now
}

/// Views per hour; zero when elapsed time is not usable
pub fn rate_per_hour(views: u64, elapsed_hours: f64) -> f64 {
    if !elapsed_hours.is_finite() || elapsed_hours < EPSILON_HOURS {
        return 0.0;
    }
    views as f64 / elapsed_hours
}

/// Fill `elapsed_hours`, `rate_per_hour` and `clock_skew` on every row
pub fn derive(mut rows: Vec<EnrichedVideo>, now: DateTime<Utc>) -> Vec<EnrichedVideo> {
    for row in &mut rows {
        let hours = elapsed_hours(row.published_at, now);
        row.elapsed_hours = hours;
        row.rate_per_hour = rate_per_hour(row.views, hours);
        row.clock_skew = is_clock_skewed(row.published_at, now);
    }
    rows
}
