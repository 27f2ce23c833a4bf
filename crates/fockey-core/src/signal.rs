//! Cross-context signals
//!
//! Fire-and-forget notifications the extension broadcasts between its
//! background worker, popup and options page. Only the payloads live here;
//! the transport belongs to the caller.

use serde::{Deserialize, Serialize};

use crate::lock::LockModeState;
use crate::types::TimestampMs;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    #[serde(rename_all = "camelCase")]
    LockStatusChanged {
        is_locked: bool,
        #[cfg_attr(feature = "ts", ts(type = "number | null"))]
        lock_end_time: Option<TimestampMs>,
    },
    QuickBlockExpired,
    #[serde(rename_all = "camelCase")]
    SettingsChanged { key: String },
}

impl Signal {
    pub fn lock_status_changed(state: LockModeState) -> Self {
        Self::LockStatusChanged {
            is_locked: state.is_locked,
            lock_end_time: state.lock_end_time,
        }
    }

    pub fn settings_changed(key: impl Into<String>) -> Self {
        Self::SettingsChanged { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let signal = Signal::lock_status_changed(LockModeState {
            is_locked: true,
            lock_end_time: Some(10),
        });
        assert_eq!(
            serde_json::to_string(&signal).unwrap(),
            r#"{"type":"LOCK_STATUS_CHANGED","isLocked":true,"lockEndTime":10}"#
        );
        assert_eq!(
            serde_json::to_string(&Signal::QuickBlockExpired).unwrap(),
            r#"{"type":"QUICK_BLOCK_EXPIRED"}"#
        );
    }

    #[test]
    fn test_parse() {
        let signal: Signal =
            serde_json::from_str(r#"{"type":"SETTINGS_CHANGED","key":"schedules"}"#).unwrap();
        assert_eq!(signal, Signal::settings_changed("schedules"));
    }
}
