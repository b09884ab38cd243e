//! Timestamped measurement samples and their tab-separated line form.
//!
//! A sample pairs a local wall-clock timestamp with an optional value. An
//! absent value marks a tick where the configured field could not be
//! extracted from the telemetry record; it is written as `nan` and read
//! back as absent.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Timestamp format used when writing log lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Alternate format accepted when reading (space instead of `T`).
const TIMESTAMP_FORMAT_SPACE: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Text written for an absent value.
pub const SENTINEL_TEXT: &str = "nan";

/// One measurement at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    /// A sample for a tick whose value could not be determined.
    pub fn sentinel(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            value: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.value.is_none()
    }

    /// Formats the sample as `timestamp<TAB>value` without a trailing newline.
    pub fn to_line(&self) -> String {
        let value = match self.value {
            Some(v) if v.is_finite() => v.to_string(),
            _ => SENTINEL_TEXT.to_string(),
        };
        format!("{}\t{}", self.timestamp.format(TIMESTAMP_FORMAT), value)
    }

    /// Parses one `timestamp<TAB>value` line.
    ///
    /// Returns `None` for anything that is not a well-formed record. A `nan`
    /// value parses to a sentinel sample.
    pub fn parse_line(line: &str) -> Option<Sample> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (ts, value) = line.split_once('\t')?;
        let timestamp = parse_timestamp(ts.trim())?;
        let value: f64 = value.trim().parse().ok()?;
        Some(Sample {
            timestamp,
            value: value.is_finite().then_some(value),
        })
    }

    /// Chart point form: milliseconds on a naive (local) time axis.
    pub fn point(&self) -> Point {
        Point {
            x: self.timestamp.and_utc().timestamp_millis(),
            y: self.value,
        }
    }
}

/// A chart point as sent to viewer sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: i64,
    pub y: Option<f64>,
}

/// Parses a log timestamp, accepting either `T` or a space as separator and
/// an optional fractional part.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT_SPACE))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_parse_plain_line() {
        let sample = Sample::parse_line("2024-01-01T00:00:05\t123.4").unwrap();
        assert_eq!(sample.timestamp, ts(0, 0, 5));
        assert_eq!(sample.value, Some(123.4));
    }

    #[test]
    fn test_parse_space_separator_and_fraction() {
        let sample = Sample::parse_line("2024-01-01 12:30:00.250000\t7\n").unwrap();
        assert_eq!(sample.timestamp.format("%H:%M:%S%.3f").to_string(), "12:30:00.250");
        assert_eq!(sample.value, Some(7.0));
    }

    #[test]
    fn test_sentinel_written_as_nan() {
        let line = Sample::sentinel(ts(1, 2, 3)).to_line();
        assert_eq!(line, "2024-01-01T01:02:03\tnan");

        let parsed = Sample::parse_line(&line).unwrap();
        assert!(parsed.is_sentinel());
    }

    #[test]
    fn test_malformed_lines_rejected() {
        assert!(Sample::parse_line("").is_none());
        assert!(Sample::parse_line("2024-01-01T00:00:05").is_none());
        assert!(Sample::parse_line("yesterday\t1.0").is_none());
        assert!(Sample::parse_line("2024-01-01T00:00:05\tabc").is_none());
    }

    #[test]
    fn test_point_uses_naive_millis() {
        let point = Sample::new(ts(0, 0, 1), 2.5).point();
        assert_eq!(point.x, 1_704_067_201_000);
        assert_eq!(point.y, Some(2.5));
    }
}
