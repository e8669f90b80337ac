//! Shared utility functions for CTA crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

    /// Naive date-time layouts accepted for observation timestamps, tried in order.
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse an ISO-8601 style date or date-time.
    ///
    /// Accepts a bare date (midnight is assumed), a naive date-time with either
    /// `T` or a space as separator, or an RFC 3339 string. Offsets are dropped
    /// and the local wall-clock time is kept, so the calendar month (and thus
    /// the season) is the one written in the source file.
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DateError("empty timestamp".to_string()).into());
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(date.and_time(NaiveTime::MIN));
        }
        for format in DATE_TIME_FORMATS {
            if let Ok(timestamp) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(timestamp);
            }
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
            return Ok(timestamp.naive_local());
        }
        Err(DateError(format!("unrecognized timestamp '{s}'")).into())
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
