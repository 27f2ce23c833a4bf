//! Fockey Core Library
//!
//! Platform-independent core of the Fockey focus blocker: recurring schedules,
//! Quick Block sessions, Lock Mode, and the URL/content matching engine the
//! browser extension consults on every navigation.
//!
//! All functions take the current time as a millisecond epoch timestamp and a
//! timezone offset in minutes east of UTC, so nothing here reads a clock.
//!
//! # Modules
//!
//! - `time`: Wall-clock times and half-open time windows
//! - `overlap`: Overlap detection between time windows
//! - `schedule`: Recurring schedules and activity evaluation
//! - `clock`: Remaining-time arithmetic and countdown formatting
//! - `lock`: Lock Mode state machine
//! - `quick_block`: Quick Block session state machine
//! - `matcher`: Core URL and content matching engine
//! - `settings`: Combined settings snapshot with the Lock Mode gate
//! - `store`: Persistence seam and debounced writer
//! - `signal`: Cross-context notification payloads
//! - `types`: Shared type definitions

pub mod clock;
pub mod domain;
pub mod error;
pub mod lock;
pub mod matcher;
pub mod overlap;
pub mod quick_block;
pub mod schedule;
pub mod settings;
pub mod signal;
pub mod store;
pub mod time;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use clock::Remaining;
pub use error::{Error, Result};
pub use lock::{LockModeState, LockState};
pub use matcher::{BlockMatcher, MatchDecision, MatchResult, RuleSource};
pub use overlap::{detect_overlaps, has_overlaps};
pub use quick_block::QuickBlockSession;
pub use schedule::{active_schedules, is_active_now, Schedule, ScheduleIssue, SchedulePatch};
pub use settings::{Settings, SettingsStatus};
pub use signal::Signal;
pub use store::{MemoryStore, SettingsStore, StoreError, WriteBatcher};
pub use time::{ClockTime, TimeWindow};
pub use types::{DayMask, RuleKind, RuleSet, TimestampMs};
