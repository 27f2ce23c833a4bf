//! Quick Block focus sessions
//!
//! A session is either inactive or active with an optional end time (`None`
//! runs until stopped). Rules can be added at any time but only removed while
//! the session is inactive. Stopping keeps the rules for the next session.

use serde::{Deserialize, Serialize};

use crate::clock::{self, Remaining};
use crate::error::{Error, Result};
use crate::types::{RuleKind, RuleSet, TimestampMs};

/// `time + ms`, clamped at the far end of the timeline.
fn offset_by(time: TimestampMs, ms: u64) -> TimestampMs {
    time.saturating_add(i64::try_from(ms).unwrap_or(i64::MAX))
}

/// Persisted Quick Block session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct QuickBlockSession {
    pub is_active: bool,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "number | null"))]
    pub start_time: Option<TimestampMs>,
    /// `None` while active means the session has no time limit.
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "number | null"))]
    pub end_time: Option<TimestampMs>,
    #[serde(flatten)]
    pub rules: RuleSet,
}

impl QuickBlockSession {
    /// Start a new session with `rules`.
    pub fn start(now: TimestampMs, duration_ms: Option<u64>, rules: RuleSet) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::NoRulesConfigured);
        }

        let end_time = duration_ms.map(|ms| offset_by(now, ms));
        log::info!(
            "quick block started with {} rules, ends at {:?}",
            rules.len(),
            end_time
        );

        Ok(Self {
            is_active: true,
            start_time: Some(now),
            end_time,
            rules,
        })
    }

    /// Start again with the rules kept from the previous session.
    pub fn resume(self, now: TimestampMs, duration_ms: Option<u64>) -> Result<Self> {
        if self.is_active {
            return Err(Error::SessionAlreadyActive);
        }
        Self::start(now, duration_ms, self.rules)
    }

    /// Push a timed session's end later.
    pub fn extend(mut self, additional_ms: u64) -> Result<Self> {
        let end_time = match (self.is_active, self.end_time) {
            (true, Some(end_time)) => end_time,
            _ => return Err(Error::NoTimeLimit),
        };

        let end_time = offset_by(end_time, additional_ms);
        log::debug!("quick block extended to {end_time}");
        self.end_time = Some(end_time);
        Ok(self)
    }

    /// End the session, keeping its rules.
    pub fn stop(mut self) -> Self {
        if self.is_active {
            log::info!("quick block stopped");
        }
        self.is_active = false;
        self.start_time = None;
        self.end_time = None;
        self
    }

    /// Add a rule; allowed while active. Duplicates leave the session unchanged.
    pub fn add_rule(mut self, kind: RuleKind, value: &str) -> Result<Self> {
        self.rules.insert(kind, value)?;
        Ok(self)
    }

    /// Remove a rule; only allowed while inactive.
    pub fn remove_rule(mut self, kind: RuleKind, value: &str) -> Result<Self> {
        if self.is_active {
            return Err(Error::CannotRemoveWhileActive);
        }
        self.rules.remove(kind, value);
        Ok(self)
    }

    /// Collapse to the stopped state once the end time has passed.
    pub fn check_expiry(self, now: TimestampMs) -> Self {
        if self.is_active && clock::is_expired(now, self.end_time) {
            log::info!("quick block expired at {now}");
            return self.stop();
        }
        self
    }

    pub fn is_expired(&self, now: TimestampMs) -> bool {
        self.is_active && clock::is_expired(now, self.end_time)
    }

    /// Remaining time, or `None` while inactive.
    pub fn remaining(&self, now: TimestampMs) -> Option<Remaining> {
        if self.is_active {
            Some(clock::remaining(now, self.end_time))
        } else {
            None
        }
    }

    pub fn is_indefinite(&self) -> bool {
        self.is_active && self.end_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        let mut rules = RuleSet::new();
        rules.insert(RuleKind::Domain, "x.com").unwrap();
        rules
    }

    #[test]
    fn test_start_requires_rules() {
        assert_eq!(
            QuickBlockSession::start(0, Some(1_000), RuleSet::new()),
            Err(Error::NoRulesConfigured)
        );

        let mut keywords_only = RuleSet::new();
        keywords_only.insert(RuleKind::ContentKeyword, "news").unwrap();
        assert!(QuickBlockSession::start(0, None, keywords_only).is_ok());
    }

    #[test]
    fn test_timed_session_countdown() {
        let session = QuickBlockSession::start(0, Some(1_500_000), rules()).unwrap();
        assert_eq!(session.end_time, Some(1_500_000));
        assert_eq!(clock::remaining(900_000, session.end_time), Remaining::Finite(600_000));
        assert!(clock::is_expired(1_500_001, session.end_time));
        assert_eq!(session.remaining(900_000), Some(Remaining::Finite(600_000)));
    }

    #[test]
    fn test_indefinite_session() {
        let session = QuickBlockSession::start(0, None, rules()).unwrap();
        assert!(session.is_indefinite());
        assert_eq!(session.remaining(10), Some(Remaining::Indefinite));
        assert_eq!(session.clone().extend(60_000), Err(Error::NoTimeLimit));
        assert_eq!(session.clone().check_expiry(i64::MAX), session);
    }

    #[test]
    fn test_extend() {
        let session = QuickBlockSession::start(0, Some(60_000), rules()).unwrap();
        let extended = session.extend(30_000).unwrap();
        assert_eq!(extended.end_time, Some(90_000));
    }

    #[test]
    fn test_huge_durations_clamp_forward() {
        let session = QuickBlockSession::start(1_000, Some(u64::MAX), rules()).unwrap();
        assert_eq!(session.end_time, Some(i64::MAX));
        assert!(session.clone().check_expiry(1_000).is_active);

        let session = QuickBlockSession::start(1_000, Some(60_000), rules()).unwrap();
        let extended = session.extend(u64::MAX).unwrap();
        assert_eq!(extended.end_time, Some(i64::MAX));
    }

    #[test]
    fn test_extend_inactive_fails() {
        assert_eq!(QuickBlockSession::default().extend(1_000), Err(Error::NoTimeLimit));
    }

    #[test]
    fn test_stop_preserves_rules() {
        let session = QuickBlockSession::start(0, Some(60_000), rules()).unwrap();
        let stopped = session.stop();
        assert!(!stopped.is_active);
        assert_eq!(stopped.end_time, None);
        assert_eq!(stopped.start_time, None);
        assert_eq!(stopped.rules, rules());
    }

    #[test]
    fn test_resume_reuses_rules() {
        let stopped = QuickBlockSession::start(0, None, rules()).unwrap().stop();
        let resumed = stopped.resume(100, Some(1_000)).unwrap();
        assert!(resumed.is_active);
        assert_eq!(resumed.end_time, Some(1_100));
        assert_eq!(resumed.clone().resume(200, None), Err(Error::SessionAlreadyActive));
        assert_eq!(
            QuickBlockSession::default().resume(0, None),
            Err(Error::NoRulesConfigured)
        );
    }

    #[test]
    fn test_add_rule_while_active() {
        let session = QuickBlockSession::start(0, None, rules()).unwrap();
        let session = session.add_rule(RuleKind::UrlKeyword, "shorts").unwrap();
        let session = session.add_rule(RuleKind::Domain, "X.com").unwrap();
        assert_eq!(session.rules.url_keywords, vec!["shorts".to_string()]);
        assert_eq!(session.rules.blocked_domains, vec!["x.com".to_string()]);
    }

    #[test]
    fn test_remove_rule_only_when_inactive() {
        let active = QuickBlockSession::start(0, None, rules()).unwrap();
        assert_eq!(
            active.clone().remove_rule(RuleKind::Domain, "x.com"),
            Err(Error::CannotRemoveWhileActive)
        );

        let stopped = active.stop().remove_rule(RuleKind::Domain, "x.com").unwrap();
        assert!(stopped.rules.is_empty());
    }

    #[test]
    fn test_check_expiry_is_idempotent() {
        let session = QuickBlockSession::start(0, Some(1_000), rules()).unwrap();
        assert!(session.clone().check_expiry(999).is_active);

        let expired = session.check_expiry(1_000);
        assert!(!expired.is_active);
        assert_eq!(expired.rules, rules());
        assert_eq!(expired.clone().check_expiry(5_000), expired);
    }

    #[test]
    fn test_serde_shape() {
        let json = r#"{"isActive":true,"endTime":null,"blockedDomains":["x.com"],"urlKeywords":[],"contentKeywords":[]}"#;
        let session: QuickBlockSession = serde_json::from_str(json).unwrap();
        assert!(session.is_indefinite());
        assert_eq!(session.start_time, None);
    }
}
