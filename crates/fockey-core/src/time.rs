//! Time-of-day values and local time derivation
//!
//! Windows are stored as zero-padded 24-hour `"HH:MM"` strings and evaluated
//! as minutes since midnight. Malformed strings are rejected when parsed or
//! deserialized, so evaluation never sees them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::types::TimestampMs;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

// =============================================================================
// ClockTime
// =============================================================================

/// A minute within a day, 00:00 through 23:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: Self = Self(0);
    pub const LAST_MINUTE: Self = Self(MINUTES_PER_DAY - 1);

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour as u16 * 60 + minute as u16))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes < MINUTES_PER_DAY {
            Some(Self(minutes))
        } else {
            None
        }
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(&self) -> u16 {
        self.0
    }

    pub fn hour(&self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(&self) -> u8 {
        (self.0 % 60) as u8
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTime(s.to_string());
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        if !bytes[..2].iter().chain(&bytes[3..]).all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TimeWindow
// =============================================================================

/// One `[start, end)` period within a single day.
///
/// `start <= end` is not enforced here; a window whose start does not strictly
/// precede its end is inert during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub start_time: ClockTime,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub end_time: ClockTime,
}

impl TimeWindow {
    pub fn new(start_time: ClockTime, end_time: ClockTime) -> Self {
        Self { start_time, end_time }
    }

    /// Parse from two `"HH:MM"` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(start.parse()?, end.parse()?))
    }

    /// The all-day sentinel the editor produces: `00:00`–`23:59`.
    pub fn all_day() -> Self {
        Self::new(ClockTime::MIDNIGHT, ClockTime::LAST_MINUTE)
    }

    /// Bounds in minutes since midnight.
    #[inline]
    pub fn bounds(&self) -> (u16, u16) {
        (self.start_time.minutes(), self.end_time.minutes())
    }

    /// Whether the start strictly precedes the end.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.start_time < self.end_time
    }

    /// Half-open membership test. Always false for invalid windows.
    #[inline]
    pub fn contains(&self, minute_of_day: u16) -> bool {
        let (start, end) = self.bounds();
        start <= minute_of_day && minute_of_day < end
    }

    pub fn duration_minutes(&self) -> u16 {
        let (start, end) = self.bounds();
        end.saturating_sub(start)
    }
}

impl FromStr for TimeWindow {
    type Err = Error;

    /// Parse `"HH:MM-HH:MM"`.
    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidTime(s.to_string()))?;
        Self::parse(start.trim(), end.trim())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_time, self.end_time)
    }
}

// =============================================================================
// Local time
// =============================================================================

/// Local wall-clock position of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub weekday: Weekday,
    pub minute_of_day: u16,
}

/// Derive local weekday and minute of day.
///
/// `tz_offset_minutes` is minutes east of UTC (local = UTC + offset). Offsets
/// outside ±24h are treated as UTC.
pub fn local_time(now: TimestampMs, tz_offset_minutes: i32) -> LocalTime {
    let offset = FixedOffset::east_opt(tz_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix());
    let utc = DateTime::from_timestamp_millis(now).unwrap_or_default();
    let local = utc.with_timezone(&offset);

    LocalTime {
        weekday: local.weekday(),
        minute_of_day: (local.hour() * 60 + local.minute()) as u16,
    }
}
