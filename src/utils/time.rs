use chrono::{DateTime, Duration, Utc};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

// Format a timestamp for logging
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

// Convert a unix timestamp (seconds) to a UTC datetime, falling back to the epoch
pub fn from_unix_seconds(timestamp: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default()
}

pub fn format_timestamp(timestamp: i64) -> String {
    format_time(&from_unix_seconds(timestamp))
}

/// `time` shifted by whole days, or `None` past the representable range.
pub fn add_days(time: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    time.checked_add_signed(Duration::days(days))
}

/// Whole days elapsed from a unix timestamp (seconds) until `now`.
pub fn days_since(timestamp: i64, now: DateTime<Utc>) -> i64 {
    now.timestamp().saturating_sub(timestamp).div_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_days_since() {
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp();
        assert_eq!(days_since(start, now), 10);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
        let later = add_days(from_unix_seconds(0), 2).unwrap();
        assert_eq!(format_time(&later), "1970-01-03 00:00:00 UTC");
    }

    #[test]
    fn test_add_days_out_of_range() {
        assert!(add_days(DateTime::<Utc>::MAX_UTC, 1).is_none());
        assert!(add_days(DateTime::<Utc>::MIN_UTC, -1).is_none());
        assert_eq!(add_days(DateTime::<Utc>::MAX_UTC, 0), Some(DateTime::<Utc>::MAX_UTC));
    }
}
