//! Validity window checks for raw timestamps.
//!
//! Callers resolve every endpoint to UTC before building a [`TimeWindow`];
//! no timezone arithmetic happens here.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::TimeWindow;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Unparseable timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Parse an RFC 3339 timestamp into an absolute UTC instant.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, WindowError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| WindowError::InvalidTimestamp(raw.to_string()))
}

/// Check whether `timestamp` falls within `[window.start, window.end)`.
///
/// An out-of-range timestamp is `Ok(false)`; only an unparseable one is an error.
pub fn is_within(timestamp: &str, window: &TimeWindow) -> Result<bool, WindowError> {
    let instant = parse_timestamp(timestamp)?;
    Ok(window.contains(instant))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn week_window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_start_is_inclusive_end_is_exclusive() {
        let w = week_window();
        assert_eq!(is_within("2025-03-04T00:00:00Z", &w), Ok(true));
        assert_eq!(is_within("2025-03-05T00:00:00Z", &w), Ok(false));
        assert_eq!(is_within("2025-03-04T23:59:59Z", &w), Ok(true));
    }

    #[test]
    fn test_offsets_compare_as_absolute_instants() {
        let w = week_window();
        // 2025-03-04T23:30:00-05:00 is 04:30 UTC on the 5th
        assert_eq!(is_within("2025-03-04T23:30:00-05:00", &w), Ok(false));
        // 2025-03-05T00:30:00+01:00 is 23:30 UTC on the 4th
        assert_eq!(is_within("2025-03-05T00:30:00+01:00", &w), Ok(true));
    }

    #[test]
    fn test_out_of_range_is_not_an_error() {
        let w = week_window();
        assert_eq!(is_within("2024-12-31T12:00:00Z", &w), Ok(false));
    }

    #[test]
    fn test_unparseable_timestamp_is_an_error() {
        let w = week_window();
        assert_eq!(
            is_within("last tuesday", &w),
            Err(WindowError::InvalidTimestamp("last tuesday".to_string()))
        );
        assert!(is_within("", &w).is_err());
    }
}
