//! Lock Mode state machine
//!
//! Lock Mode is a commitment device: once locked, settings stay frozen until
//! the end time passes. The end time can only be pushed later; there is no
//! transition back to `Unlocked` other than natural expiry.

use serde::{Deserialize, Serialize};

use crate::clock::{self, Remaining};
use crate::error::{Error, Result};
use crate::types::TimestampMs;

/// Shortest lock (or extension) accepted: one minute.
pub const MIN_LOCK_DURATION_MS: u64 = 60 * 1000;
/// Longest lock (or extension) accepted: 365 days.
pub const MAX_LOCK_DURATION_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Persisted Lock Mode record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LockModeState {
    pub is_locked: bool,
    #[cfg_attr(feature = "ts", ts(type = "number | null"))]
    pub lock_end_time: Option<TimestampMs>,
}

/// In-memory Lock Mode state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked { lock_end_time: TimestampMs },
}

fn check_duration(duration_ms: u64) -> Result<()> {
    if (MIN_LOCK_DURATION_MS..=MAX_LOCK_DURATION_MS).contains(&duration_ms) {
        Ok(())
    } else {
        Err(Error::InvalidDuration { duration_ms })
    }
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    pub fn lock_end_time(&self) -> Option<TimestampMs> {
        match self {
            Self::Unlocked => None,
            Self::Locked { lock_end_time } => Some(*lock_end_time),
        }
    }

    /// Whether settings are frozen at `now`.
    pub fn is_locked_at(&self, now: TimestampMs) -> bool {
        self.tick(now).is_locked()
    }

    /// Lock for `duration_ms` starting at `now`.
    ///
    /// A lock whose end time has already passed counts as unlocked.
    pub fn activate(self, duration_ms: u64, now: TimestampMs) -> Result<Self> {
        check_duration(duration_ms)?;
        if let Self::Locked { lock_end_time } = self.tick(now) {
            return Err(Error::AlreadyLocked { until: lock_end_time });
        }

        let lock_end_time = now.saturating_add(duration_ms as i64);
        log::info!("lock mode activated until {lock_end_time}");
        Ok(Self::Locked { lock_end_time })
    }

    /// Push the end time later by `additional_ms`.
    pub fn extend(self, additional_ms: u64, now: TimestampMs) -> Result<Self> {
        check_duration(additional_ms)?;
        match self.tick(now) {
            Self::Unlocked => Err(Error::NotLocked),
            Self::Locked { lock_end_time } => {
                let lock_end_time = lock_end_time.saturating_add(additional_ms as i64);
                log::info!("lock mode extended until {lock_end_time}");
                Ok(Self::Locked { lock_end_time })
            }
        }
    }

    /// Natural expiry: unlocks once `now >= lock_end_time`.
    pub fn tick(self, now: TimestampMs) -> Self {
        match self {
            Self::Locked { lock_end_time } if now >= lock_end_time => {
                log::debug!("lock mode expired at {now}");
                Self::Unlocked
            }
            state => state,
        }
    }

    pub fn remaining(&self, now: TimestampMs) -> Option<Remaining> {
        self.lock_end_time()
            .map(|end| clock::remaining(now, Some(end)))
    }

    /// Gate for settings changes.
    pub fn guard(&self, now: TimestampMs) -> Result<()> {
        match self.tick(now) {
            Self::Unlocked => Ok(()),
            Self::Locked { lock_end_time } => Err(Error::SettingsLocked { until: lock_end_time }),
        }
    }
}

impl From<LockModeState> for LockState {
    fn from(record: LockModeState) -> Self {
        match (record.is_locked, record.lock_end_time) {
            (true, Some(lock_end_time)) => Self::Locked { lock_end_time },
            _ => Self::Unlocked,
        }
    }
}

impl From<LockState> for LockModeState {
    fn from(state: LockState) -> Self {
        Self {
            is_locked: state.is_locked(),
            lock_end_time: state.lock_end_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    #[test]
    fn test_activate_bounds() {
        let t = 1_000;
        assert_eq!(
            LockState::Unlocked.activate(0, t),
            Err(Error::InvalidDuration { duration_ms: 0 })
        );
        assert_eq!(
            LockState::Unlocked.activate(366 * DAY_MS, t),
            Err(Error::InvalidDuration { duration_ms: 366 * DAY_MS })
        );
        assert_eq!(
            LockState::Unlocked.activate(60_000, t),
            Ok(LockState::Locked { lock_end_time: t + 60_000 })
        );
        assert!(LockState::Unlocked.activate(365 * DAY_MS, t).is_ok());
        assert!(LockState::Unlocked.activate(59_999, t).is_err());
    }

    #[test]
    fn test_activate_extend_round_trip() {
        let t = 10_000;
        let locked = LockState::Unlocked.activate(3_600_000, t).unwrap();
        let extended = locked.extend(600_000, t + 1).unwrap();
        assert_eq!(extended.lock_end_time(), Some(t + 3_600_000 + 600_000));
    }

    #[test]
    fn test_activate_while_locked_fails() {
        let locked = LockState::Unlocked.activate(60_000, 0).unwrap();
        assert_eq!(
            locked.activate(120_000, 1_000),
            Err(Error::AlreadyLocked { until: 60_000 })
        );
    }

    #[test]
    fn test_activate_after_expiry() {
        let locked = LockState::Unlocked.activate(60_000, 0).unwrap();
        let relocked = locked.activate(60_000, 60_000).unwrap();
        assert_eq!(relocked.lock_end_time(), Some(120_000));
    }

    #[test]
    fn test_extend_requires_lock() {
        assert_eq!(LockState::Unlocked.extend(60_000, 0), Err(Error::NotLocked));
        let expired = LockState::Locked { lock_end_time: 100 };
        assert_eq!(expired.extend(60_000, 100), Err(Error::NotLocked));
    }

    #[test]
    fn test_extend_bounds_apply_to_addition() {
        let locked = LockState::Unlocked.activate(300 * DAY_MS, 0).unwrap();
        // total would exceed a year, but the addition itself is in range
        let extended = locked.extend(100 * DAY_MS, 0).unwrap();
        assert_eq!(extended.lock_end_time(), Some((400 * DAY_MS) as i64));
        assert_eq!(
            extended.extend(1_000, 0),
            Err(Error::InvalidDuration { duration_ms: 1_000 })
        );
    }

    #[test]
    fn test_tick() {
        let locked = LockState::Locked { lock_end_time: 5_000 };
        assert_eq!(locked.tick(4_999), locked);
        assert_eq!(locked.tick(5_000), LockState::Unlocked);
        assert_eq!(LockState::Unlocked.tick(5_000), LockState::Unlocked);
    }

    #[test]
    fn test_guard() {
        let locked = LockState::Locked { lock_end_time: 5_000 };
        assert_eq!(locked.guard(1_000), Err(Error::SettingsLocked { until: 5_000 }));
        assert_eq!(locked.guard(5_000), Ok(()));
        assert!(locked.is_locked_at(4_999));
        assert!(!locked.is_locked_at(5_000));
    }

    #[test]
    fn test_remaining() {
        let locked = LockState::Locked { lock_end_time: 5_000 };
        assert_eq!(locked.remaining(1_000), Some(Remaining::Finite(4_000)));
        assert_eq!(LockState::Unlocked.remaining(1_000), None);
    }

    #[test]
    fn test_record_conversion() {
        let record = LockModeState { is_locked: true, lock_end_time: Some(42) };
        let state = LockState::from(record);
        assert_eq!(state, LockState::Locked { lock_end_time: 42 });
        assert_eq!(LockModeState::from(state), record);

        let inconsistent = LockModeState { is_locked: true, lock_end_time: None };
        assert_eq!(LockState::from(inconsistent), LockState::Unlocked);
        assert_eq!(LockModeState::from(LockState::Unlocked), LockModeState::default());
    }

    #[test]
    fn test_record_serde_shape() {
        let record: LockModeState =
            serde_json::from_str(r#"{"isLocked":true,"lockEndTime":1700000000000}"#).unwrap();
        assert_eq!(record.lock_end_time, Some(1_700_000_000_000));
    }

    proptest! {
        #[test]
        fn prop_lock_holds_until_end_time(
            start in 0i64..1_000_000_000_000,
            duration in MIN_LOCK_DURATION_MS..=MAX_LOCK_DURATION_MS,
            elapsed in 0u64..=2 * MAX_LOCK_DURATION_MS,
        ) {
            let locked = LockState::Unlocked.activate(duration, start).unwrap();
            let now = start + elapsed as i64;
            prop_assert_eq!(locked.tick(now).is_locked(), elapsed < duration);
        }
    }
}
