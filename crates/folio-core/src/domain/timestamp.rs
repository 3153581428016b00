use std::fmt;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Store-native point in time, seconds and nanoseconds since the Unix epoch.
///
/// Publication times are persisted in this shape rather than as integers or
/// strings, so every read boundary goes through this wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawTimestamp")]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

/// Wire shape as stored; may carry more than a second in `nanos`.
#[derive(Deserialize)]
struct RawTimestamp {
    seconds: i64,
    #[serde(default)]
    nanos: u32,
}

impl From<RawTimestamp> for Timestamp {
    fn from(raw: RawTimestamp) -> Self {
        Self::new(raw.seconds, raw.nanos)
    }
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        // Carry whole seconds out of the nanosecond part.
        Self {
            seconds: seconds + i64::from(nanos / 1_000_000_000),
            nanos: nanos % 1_000_000_000,
        }
    }

    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(seconds, 0)
    }

    /// Convert to a chrono instant. Out-of-range values clamp to the epoch.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.seconds, self.nanos)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Calendar year in UTC.
    pub fn year(&self) -> i32 {
        self.to_datetime().year()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
            nanos: value.timestamp_subsec_nanos(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_nanos() {
        let ts = Timestamp::new(10, 1_500_000_000);
        assert_eq!(ts.seconds, 11);
        assert_eq!(ts.nanos, 500_000_000);
    }

    #[test]
    fn test_deserialize_normalizes_nanos() {
        let ts: Timestamp =
            serde_json::from_str(r#"{"seconds":1,"nanos":1500000000}"#).unwrap();
        assert_eq!(ts, Timestamp::new(2, 500_000_000));
        assert!(ts > Timestamp::new(1, 999_999_999));
        assert_eq!(ts.to_datetime().timestamp(), 2);
    }

    #[test]
    fn test_ordering_and_year() {
        let earlier = Timestamp::from_seconds(1_600_000_000);
        let later = Timestamp::new(1_600_000_000, 1);
        assert!(earlier < later);
        assert_eq!(earlier.year(), 2020);
    }

    #[test]
    fn test_chrono_conversion() {
        let dt = Utc.with_ymd_and_hms(2023, 5, 17, 8, 30, 0).unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(ts.to_datetime(), dt);
        assert_eq!(ts.to_string(), "2023-05-17T08:30:00+00:00");
    }
}
