//! Session clock: remaining time, expiry and countdown display.
//!
//! Pure functions over wall-clock timestamps. The UI re-evaluates them every
//! `TICK_INTERVAL_MS`; clock skew is not compensated.

use serde::{Deserialize, Serialize};

use crate::types::TimestampMs;

/// How often the UI re-reads the clock.
pub const TICK_INTERVAL_MS: u64 = 1_000;

/// Remaining time below which the countdown switches to its warning color.
pub const WARNING_THRESHOLD_MS: u64 = 60_000;

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

/// Time left in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "ms")]
pub enum Remaining {
    /// Session without an end time
    Indefinite,
    /// Milliseconds until the end time, never negative
    Finite(u64),
}

impl Remaining {
    pub fn as_ms(&self) -> Option<u64> {
        match self {
            Self::Indefinite => None,
            Self::Finite(ms) => Some(*ms),
        }
    }

    pub fn should_warn(&self) -> bool {
        match self {
            Self::Indefinite => false,
            Self::Finite(ms) => should_warn(*ms),
        }
    }
}

/// `max(0, end - now)`, or `Indefinite` without an end.
pub fn remaining(now: TimestampMs, end: Option<TimestampMs>) -> Remaining {
    match end {
        None => Remaining::Indefinite,
        Some(end) => Remaining::Finite(end.saturating_sub(now).max(0) as u64),
    }
}

/// True iff there is an end time and `now` has reached it.
pub fn is_expired(now: TimestampMs, end: Option<TimestampMs>) -> bool {
    matches!(end, Some(end) if now >= end)
}

/// True while the remaining time is under the warning threshold.
pub fn should_warn(remaining_ms: u64) -> bool {
    remaining_ms < WARNING_THRESHOLD_MS
}

/// Countdown text: `MM:SS` under an hour, `H:MM:SS` otherwise.
pub fn format_countdown(remaining_ms: u64) -> String {
    // Round up so the display never shows 00:00 while time is left.
    let total_secs = remaining_ms.div_ceil(SECOND_MS);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Compact duration text for summaries, e.g. `1d 2h`, `25m`, `45s`.
///
/// Shows at most the two most significant non-zero units.
pub fn format_duration(ms: u64) -> String {
    if ms < SECOND_MS {
        return "0s".to_string();
    }

    let units = [
        (ms / DAY_MS, "d"),
        ((ms % DAY_MS) / HOUR_MS, "h"),
        ((ms % HOUR_MS) / MINUTE_MS, "m"),
        ((ms % MINUTE_MS) / SECOND_MS, "s"),
    ];

    let parts: Vec<String> = units
        .iter()
        .skip_while(|(value, _)| *value == 0)
        .take(2)
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    parts.join(" ")
}
