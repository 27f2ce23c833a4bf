//! Error taxonomy shared by every state transition in the core.
//!
//! All errors are local and recoverable: the caller surfaces them to the user
//! and keeps the previous state.

use crate::types::TimestampMs;

/// Error type for core state transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Duration out of range: {duration_ms}ms")]
    InvalidDuration { duration_ms: u64 },
    #[error("No blocking rules configured")]
    NoRulesConfigured,
    #[error("Session has no time limit")]
    NoTimeLimit,
    #[error("Rules cannot be removed while a Quick Block session is active")]
    CannotRemoveWhileActive,
    #[error("Lock Mode is already active until {until}")]
    AlreadyLocked { until: TimestampMs },
    #[error("Lock Mode is not active")]
    NotLocked,
    #[error("Quick Block session is already active")]
    SessionAlreadyActive,
    #[error("Settings are locked until {until}")]
    SettingsLocked { until: TimestampMs },
    #[error("Invalid time of day: {0:?}")]
    InvalidTime(String),
    #[error("Invalid rule: {0:?}")]
    InvalidRule(String),
    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),
}

impl Error {
    /// Stable identifier the UI maps to a localized message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. } => "InvalidDurationError",
            Self::NoRulesConfigured => "NoRulesConfiguredError",
            Self::NoTimeLimit => "NoTimeLimitError",
            Self::CannotRemoveWhileActive => "CannotRemoveWhileActiveError",
            Self::AlreadyLocked { .. } => "AlreadyLockedError",
            Self::NotLocked => "NotLockedError",
            Self::SessionAlreadyActive => "SessionAlreadyActiveError",
            Self::SettingsLocked { .. } => "SettingsLockedError",
            Self::InvalidTime(_) => "InvalidTimeError",
            Self::InvalidRule(_) => "InvalidRuleError",
            Self::ScheduleNotFound(_) => "ScheduleNotFoundError",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
