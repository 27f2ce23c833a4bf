//! End-to-end behavior of the core through its public API.

use fockey_core::clock::{self, Remaining};
use fockey_core::lock::MAX_LOCK_DURATION_MS;
use fockey_core::store::keys;
use fockey_core::{
    Error, LockState, MemoryStore, QuickBlockSession, RuleKind, RuleSet, Schedule, Settings,
    SettingsStore, Signal, WriteBatcher,
};
use serde_json::json;

// 2024-01-02 (Tuesday) 00:00 UTC
const TUESDAY: i64 = 1_704_153_600_000;
// 2024-01-06 (Saturday) 00:00 UTC
const SATURDAY: i64 = 1_704_499_200_000;
const MINUTE: i64 = 60_000;
const HOUR: i64 = 60 * MINUTE;

fn workday_schedule() -> Schedule {
    serde_json::from_value(json!({
        "id": "work",
        "name": "Work",
        "enabled": true,
        "days": [1, 2, 3, 4, 5],
        "timePeriods": [{ "startTime": "09:00", "endTime": "17:00" }],
        "blockedDomains": ["youtube.com"],
        "createdAt": 0,
        "updatedAt": 0
    }))
    .unwrap()
}

#[test]
fn workday_schedule_activity() {
    let schedule = workday_schedule();
    let at = |day: i64, hours: i64, minutes: i64| day + hours * HOUR + minutes * MINUTE;

    assert!(schedule.is_active_now(at(TUESDAY, 10, 30), 0));
    assert!(!schedule.is_active_now(at(SATURDAY, 10, 30), 0));
    assert!(!schedule.is_active_now(at(TUESDAY, 17, 0), 0));
    assert!(schedule.is_active_now(at(TUESDAY, 16, 59), 0));
}

#[test]
fn schedule_uses_local_offset() {
    let schedule = workday_schedule();
    // 08:30 UTC is 10:30 in UTC+2 and 03:30 in UTC-5
    let now = TUESDAY + 8 * HOUR + 30 * MINUTE;
    assert!(schedule.is_active_now(now, 120));
    assert!(!schedule.is_active_now(now, -300));
    assert!(!schedule.is_active_now(now, 0));
}

#[test]
fn disabled_schedule_is_never_active() {
    let mut schedule = workday_schedule();
    schedule.enabled = false;
    for hour in 0..24 {
        assert!(!schedule.is_active_now(TUESDAY + hour * HOUR, 0));
    }
}

#[test]
fn lock_extend_adds_to_end_time() {
    let t = 5_000;
    let state = LockState::default()
        .activate(10 * MINUTE as u64, t)
        .and_then(|state| state.extend(5 * MINUTE as u64, t + 1))
        .unwrap();
    assert_eq!(state.lock_end_time(), Some(t + 15 * MINUTE));
}

#[test]
fn lock_duration_bounds() {
    assert_eq!(
        LockState::default().activate(0, 0),
        Err(Error::InvalidDuration { duration_ms: 0 })
    );
    let too_long = 366 * 24 * 60 * 60 * 1000;
    assert_eq!(
        LockState::default().activate(too_long, 0),
        Err(Error::InvalidDuration { duration_ms: too_long })
    );
    assert!(LockState::default().activate(60_000, 0).is_ok());
    assert!(LockState::default().activate(MAX_LOCK_DURATION_MS, 0).is_ok());
}

#[test]
fn quick_block_requires_rules() {
    assert_eq!(
        QuickBlockSession::start(0, None, RuleSet::new()),
        Err(Error::NoRulesConfigured)
    );

    let mut rules = RuleSet::new();
    rules.insert(RuleKind::ContentKeyword, "minecraft").unwrap();
    assert!(QuickBlockSession::start(0, None, rules).is_ok());
}

#[test]
fn pomodoro_countdown() {
    let mut rules = RuleSet::new();
    rules.insert(RuleKind::Domain, "x.com").unwrap();
    let session = QuickBlockSession::start(0, Some(1_500_000), rules).unwrap();

    assert_eq!(clock::remaining(900_000, session.end_time), Remaining::Finite(600_000));
    assert_eq!(clock::format_countdown(600_000), "10:00");
    assert!(!clock::is_expired(1_499_999, session.end_time));
    assert!(clock::is_expired(1_500_001, session.end_time));
}

#[test]
fn rules_cannot_be_removed_mid_session() {
    let mut rules = RuleSet::new();
    rules.insert(RuleKind::Domain, "x.com").unwrap();
    let session = QuickBlockSession::start(0, None, rules).unwrap();

    assert_eq!(
        session.clone().remove_rule(RuleKind::Domain, "x.com"),
        Err(Error::CannotRemoveWhileActive)
    );

    let stopped = session.stop().remove_rule(RuleKind::Domain, "x.com").unwrap();
    assert!(stopped.rules.is_empty());
}

#[test]
fn day_in_the_life() {
    let mut store = MemoryStore::new();
    let mut settings = Settings::default();
    let morning = TUESDAY + 10 * HOUR;

    settings.add_schedule(workday_schedule(), morning).unwrap();
    settings.activate_lock(2 * HOUR as u64, morning).unwrap();

    let matcher = settings.matcher(morning, 0);
    assert!(matcher.should_block_url("https://www.youtube.com/watch?v=1"));
    assert!(!matcher.should_block_url("https://docs.rs/"));

    // locked: loosening fails, tightening works
    assert!(matches!(
        settings.set_schedule_enabled("work", false, morning + MINUTE),
        Err(Error::SettingsLocked { .. })
    ));
    settings
        .add_schedule_rule("work", RuleKind::Domain, "reddit.com", morning + MINUTE)
        .unwrap();
    assert!(settings
        .matcher(morning + MINUTE, 0)
        .should_block_url("https://old.reddit.com/"));

    {
        let mut batcher = WriteBatcher::new(&mut store);
        settings.save(&mut batcher, morning).unwrap();
    }
    assert!(store.get(keys::LOCK_MODE).is_some());

    // two hours later the lock lapses on the next tick
    let mut restored = Settings::load(&store).unwrap();
    assert_eq!(restored, settings);
    let signals = restored.tick(morning + 2 * HOUR);
    assert_eq!(
        signals,
        vec![Signal::LockStatusChanged { is_locked: false, lock_end_time: None }]
    );
    restored
        .set_schedule_enabled("work", false, morning + 2 * HOUR)
        .unwrap();
    assert!(restored.matcher(morning + 2 * HOUR, 0).is_empty());
}
