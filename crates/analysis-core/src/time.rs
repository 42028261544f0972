//! Timestamp normalization.
//!
//! Everything in the workspace is compared as `DateTime<Utc>`. Offset-aware
//! inputs are converted, naive inputs are read as UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};

use crate::AnalysisError;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse an as-of date or row timestamp into UTC.
///
/// Accepts RFC 3339 with any offset, naive date-times and plain `YYYY-MM-DD`
/// dates (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, AnalysisError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }

    Err(AnalysisError::InvalidTimestamp(input.to_string()))
}

/// Midnight UTC of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

pub fn is_weekend(ts: &DateTime<Utc>) -> bool {
    matches!(ts.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_plain_date() {
        let ts = parse_timestamp("2024-03-15").unwrap();
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_parse_offset_is_normalized_to_utc() {
        let ts = parse_timestamp("2024-03-15T09:30:00-05:00").unwrap();
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_parse_naive_datetime_is_utc() {
        let a = parse_timestamp("2024-03-15 14:30:00").unwrap();
        let b = parse_timestamp("2024-03-15T14:30:00Z").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("15/03/2024"),
            Err(AnalysisError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_is_weekend() {
        // 2024-03-16 is a Saturday
        assert!(is_weekend(&parse_timestamp("2024-03-16").unwrap()));
        assert!(!is_weekend(&parse_timestamp("2024-03-15").unwrap()));
    }
}
