//! WebAssembly bindings for the Fockey extension
//!
//! Records cross the boundary as JSON strings in the same camelCase shape the
//! extension persists. Timestamps and durations are JS numbers (milliseconds).
//! Failures are thrown as `{ code, message }` objects.

use std::cell::RefCell;

use fockey_core::clock;
use fockey_core::{
    BlockMatcher, LockModeState, LockState, QuickBlockSession, RuleKind, RuleSet, Schedule,
    SchedulePatch, Settings, TimeWindow,
};
use fockey_rules::{build_rule_set, optimize_rules, parse_rule_list};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod logger;

thread_local! {
    static MATCHER: RefCell<Option<BlockMatcher>> = const { RefCell::new(None) };
}

#[derive(Debug, thiserror::Error)]
enum BindingError {
    #[error(transparent)]
    Core(#[from] fockey_core::Error),
    #[error("Invalid {what}: {source}")]
    Input {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode result: {0}")]
    Output(#[source] serde_json::Error),
}

impl BindingError {
    fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.code(),
            Self::Input { .. } => "InvalidInputError",
            Self::Output(_) => "InternalError",
        }
    }
}

impl From<BindingError> for JsValue {
    fn from(error: BindingError) -> Self {
        let result = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&result, &"code".into(), &JsValue::from_str(error.code()));
        let _ = js_sys::Reflect::set(&result, &"message".into(), &JsValue::from_str(&error.to_string()));
        result.into()
    }
}

type BindingResult<T> = Result<T, BindingError>;

fn parse<T: DeserializeOwned>(what: &'static str, json: &str) -> BindingResult<T> {
    serde_json::from_str(json).map_err(|source| BindingError::Input { what, source })
}

fn to_json<T: Serialize>(value: &T) -> BindingResult<String> {
    serde_json::to_string(value).map_err(BindingError::Output)
}

fn timestamp(ms: f64) -> i64 {
    ms as i64
}

/// Negative and NaN durations become zero and fail the bounds checks.
fn duration(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        ms as u64
    } else {
        0
    }
}

fn rule_kind(kind: &str) -> BindingResult<RuleKind> {
    Ok(kind.parse()?)
}

// =============================================================================
// Logging
// =============================================================================

/// Route `log` output to the browser console at `level` (`warn` by default).
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) {
    logger::init(logger::parse_level(level.as_deref().unwrap_or("warn")));
}

// =============================================================================
// Time windows and schedules
// =============================================================================

/// Indices of periods that share at least one minute with another period.
#[wasm_bindgen]
pub fn detect_overlaps(windows_json: &str) -> Result<Vec<u32>, JsValue> {
    let windows: Vec<TimeWindow> = parse("time periods", windows_json)?;
    Ok(fockey_core::detect_overlaps(&windows)
        .into_iter()
        .map(|index| index as u32)
        .collect())
}

#[wasm_bindgen]
pub fn is_schedule_active(schedule_json: &str, now: f64, tz_offset_minutes: i32) -> Result<bool, JsValue> {
    let schedule: Schedule = parse("schedule", schedule_json)?;
    Ok(schedule.is_active_now(timestamp(now), tz_offset_minutes))
}

/// Ids of the schedules active at `now`, as a JSON array.
#[wasm_bindgen]
pub fn active_schedule_ids(schedules_json: &str, now: f64, tz_offset_minutes: i32) -> Result<String, JsValue> {
    let schedules: Vec<Schedule> = parse("schedules", schedules_json)?;
    let ids: Vec<&str> = fockey_core::active_schedules(&schedules, timestamp(now), tz_offset_minutes)
        .into_iter()
        .map(|schedule| schedule.id.as_str())
        .collect();
    Ok(to_json(&ids)?)
}

#[wasm_bindgen]
pub fn validate_schedule(schedule_json: &str) -> Result<String, JsValue> {
    let schedule: Schedule = parse("schedule", schedule_json)?;
    Ok(to_json(&schedule.validate())?)
}

// =============================================================================
// Session clock
// =============================================================================

/// `{ "type": "finite", "ms": … }` or `{ "type": "indefinite" }`.
#[wasm_bindgen]
pub fn remaining(now: f64, end_time: Option<f64>) -> Result<String, JsValue> {
    Ok(to_json(&clock::remaining(timestamp(now), end_time.map(timestamp)))?)
}

#[wasm_bindgen]
pub fn is_expired(now: f64, end_time: Option<f64>) -> bool {
    clock::is_expired(timestamp(now), end_time.map(timestamp))
}

#[wasm_bindgen]
pub fn should_warn(remaining_ms: f64) -> bool {
    clock::should_warn(duration(remaining_ms))
}

#[wasm_bindgen]
pub fn format_countdown(remaining_ms: f64) -> String {
    clock::format_countdown(duration(remaining_ms))
}

#[wasm_bindgen]
pub fn format_duration(ms: f64) -> String {
    clock::format_duration(duration(ms))
}

// =============================================================================
// Lock Mode
// =============================================================================

fn lock_state(state_json: &str) -> BindingResult<LockState> {
    let record: LockModeState = parse("lock state", state_json)?;
    Ok(LockState::from(record))
}

fn lock_record(state: LockState) -> BindingResult<String> {
    to_json(&LockModeState::from(state))
}

#[wasm_bindgen]
pub fn lock_activate(state_json: &str, duration_ms: f64, now: f64) -> Result<String, JsValue> {
    let state = lock_state(state_json)?.activate(duration(duration_ms), timestamp(now));
    Ok(lock_record(state.map_err(BindingError::from)?)?)
}

#[wasm_bindgen]
pub fn lock_extend(state_json: &str, additional_ms: f64, now: f64) -> Result<String, JsValue> {
    let state = lock_state(state_json)?.extend(duration(additional_ms), timestamp(now));
    Ok(lock_record(state.map_err(BindingError::from)?)?)
}

#[wasm_bindgen]
pub fn lock_tick(state_json: &str, now: f64) -> Result<String, JsValue> {
    Ok(lock_record(lock_state(state_json)?.tick(timestamp(now)))?)
}

#[wasm_bindgen]
pub fn is_locked(state_json: &str, now: f64) -> Result<bool, JsValue> {
    Ok(lock_state(state_json)?.is_locked_at(timestamp(now)))
}

// =============================================================================
// Quick Block
// =============================================================================

fn session(session_json: &str) -> BindingResult<QuickBlockSession> {
    parse("quick block session", session_json)
}

fn session_result(result: fockey_core::Result<QuickBlockSession>) -> Result<String, JsValue> {
    let session = result.map_err(BindingError::from)?;
    Ok(to_json(&session)?)
}

/// Start a session with `rules_json` (`{ blockedDomains, urlKeywords, contentKeywords }`).
#[wasm_bindgen]
pub fn quick_block_start(rules_json: &str, duration_ms: Option<f64>, now: f64) -> Result<String, JsValue> {
    let rules: RuleSet = parse("rules", rules_json)?;
    session_result(QuickBlockSession::start(timestamp(now), duration_ms.map(duration), rules))
}

#[wasm_bindgen]
pub fn quick_block_resume(session_json: &str, duration_ms: Option<f64>, now: f64) -> Result<String, JsValue> {
    session_result(session(session_json)?.resume(timestamp(now), duration_ms.map(duration)))
}

#[wasm_bindgen]
pub fn quick_block_extend(session_json: &str, additional_ms: f64) -> Result<String, JsValue> {
    session_result(session(session_json)?.extend(duration(additional_ms)))
}

#[wasm_bindgen]
pub fn quick_block_stop(session_json: &str) -> Result<String, JsValue> {
    Ok(to_json(&session(session_json)?.stop())?)
}

#[wasm_bindgen]
pub fn quick_block_check_expiry(session_json: &str, now: f64) -> Result<String, JsValue> {
    Ok(to_json(&session(session_json)?.check_expiry(timestamp(now)))?)
}

#[wasm_bindgen]
pub fn quick_block_add_rule(session_json: &str, kind: &str, value: &str) -> Result<String, JsValue> {
    let kind = rule_kind(kind)?;
    session_result(session(session_json)?.add_rule(kind, value))
}

#[wasm_bindgen]
pub fn quick_block_remove_rule(session_json: &str, kind: &str, value: &str) -> Result<String, JsValue> {
    let kind = rule_kind(kind)?;
    session_result(session(session_json)?.remove_rule(kind, value))
}

// =============================================================================
// Settings and matching
// =============================================================================

/// Rebuild the matcher from a full settings snapshot. Returns the rule count.
#[wasm_bindgen]
pub fn load_settings(settings_json: &str, now: f64, tz_offset_minutes: i32) -> Result<u32, JsValue> {
    let settings: Settings = parse("settings", settings_json)?;
    let matcher = settings.matcher(timestamp(now), tz_offset_minutes);
    let count = matcher.rule_count() as u32;
    MATCHER.with(|cell| *cell.borrow_mut() = Some(matcher));
    Ok(count)
}

#[wasm_bindgen]
pub fn is_loaded() -> bool {
    MATCHER.with(|cell| cell.borrow().is_some())
}

/// Expire lock and session; returns `{ settings, signals }`.
#[wasm_bindgen]
pub fn settings_tick(settings_json: &str, now: f64) -> Result<String, JsValue> {
    #[derive(Serialize)]
    struct Ticked<'a> {
        settings: &'a Settings,
        signals: Vec<fockey_core::Signal>,
    }

    let mut settings: Settings = parse("settings", settings_json)?;
    let signals = settings.tick(timestamp(now));
    Ok(to_json(&Ticked { settings: &settings, signals })?)
}

#[wasm_bindgen]
pub fn settings_status(settings_json: &str, now: f64, tz_offset_minutes: i32) -> Result<String, JsValue> {
    let settings: Settings = parse("settings", settings_json)?;
    Ok(to_json(&settings.status(timestamp(now), tz_offset_minutes))?)
}

/// Throws `SettingsLockedError` while Lock Mode holds at `now`.
#[wasm_bindgen]
pub fn settings_guard(settings_json: &str, now: f64) -> Result<(), JsValue> {
    let settings: Settings = parse("settings", settings_json)?;
    settings
        .lock_state()
        .guard(timestamp(now))
        .map_err(BindingError::from)?;
    Ok(())
}

/// Parse `settings_json`, apply `edit`, and return the updated settings.
fn edit_settings(
    settings_json: &str,
    edit: impl FnOnce(&mut Settings) -> BindingResult<()>,
) -> Result<String, JsValue> {
    let mut settings: Settings = parse("settings", settings_json)?;
    edit(&mut settings)?;
    Ok(to_json(&settings)?)
}

#[wasm_bindgen]
pub fn settings_add_schedule(settings_json: &str, schedule_json: &str, now: f64) -> Result<String, JsValue> {
    let schedule: Schedule = parse("schedule", schedule_json)?;
    edit_settings(settings_json, |settings| {
        Ok(settings.add_schedule(schedule, timestamp(now))?)
    })
}

/// Apply a partial update; `"icon": null` clears the icon.
#[wasm_bindgen]
pub fn settings_update_schedule(
    settings_json: &str,
    id: &str,
    patch_json: &str,
    now: f64,
) -> Result<String, JsValue> {
    let patch: SchedulePatch = parse("schedule patch", patch_json)?;
    edit_settings(settings_json, |settings| {
        Ok(settings.update_schedule(id, patch, timestamp(now))?)
    })
}

#[wasm_bindgen]
pub fn settings_set_schedule_enabled(
    settings_json: &str,
    id: &str,
    enabled: bool,
    now: f64,
) -> Result<String, JsValue> {
    edit_settings(settings_json, |settings| {
        Ok(settings.set_schedule_enabled(id, enabled, timestamp(now))?)
    })
}

#[wasm_bindgen]
pub fn settings_remove_schedule(settings_json: &str, id: &str, now: f64) -> Result<String, JsValue> {
    edit_settings(settings_json, |settings| {
        settings.remove_schedule(id, timestamp(now))?;
        Ok(())
    })
}

/// Allowed during Lock Mode.
#[wasm_bindgen]
pub fn settings_add_schedule_rule(
    settings_json: &str,
    id: &str,
    kind: &str,
    value: &str,
    now: f64,
) -> Result<String, JsValue> {
    let kind = rule_kind(kind)?;
    edit_settings(settings_json, |settings| {
        settings.add_schedule_rule(id, kind, value, timestamp(now))?;
        Ok(())
    })
}

#[wasm_bindgen]
pub fn settings_remove_schedule_rule(
    settings_json: &str,
    id: &str,
    kind: &str,
    value: &str,
    now: f64,
) -> Result<String, JsValue> {
    let kind = rule_kind(kind)?;
    edit_settings(settings_json, |settings| {
        settings.remove_schedule_rule(id, kind, value, timestamp(now))?;
        Ok(())
    })
}

/// Match a URL against the loaded rules. Allows everything before `load_settings`.
#[wasm_bindgen]
pub fn match_url(url: &str) -> Result<String, JsValue> {
    let result = MATCHER.with(|cell| match cell.borrow().as_ref() {
        Some(matcher) => matcher.match_url(url),
        None => Default::default(),
    });
    Ok(to_json(&result)?)
}

#[wasm_bindgen]
pub fn should_block_url(url: &str) -> bool {
    MATCHER.with(|cell| {
        cell.borrow()
            .as_ref()
            .is_some_and(|matcher| matcher.should_block_url(url))
    })
}

#[wasm_bindgen]
pub fn match_content(text: &str) -> Result<String, JsValue> {
    let result = MATCHER.with(|cell| match cell.borrow().as_ref() {
        Some(matcher) => matcher.match_content(text),
        None => Default::default(),
    });
    Ok(to_json(&result)?)
}

// =============================================================================
// Rules
// =============================================================================

/// Canonical form of a rule value, or `undefined` if unusable.
#[wasm_bindgen]
pub fn normalize_rule(kind: &str, value: &str) -> Result<Option<String>, JsValue> {
    Ok(rule_kind(kind)?.normalize(value))
}

/// Parse a pasted blocklist into `{ ruleSet, rejected, stats }`.
#[wasm_bindgen]
pub fn import_rule_list(text: &str) -> Result<String, JsValue> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Imported {
        rule_set: RuleSet,
        rejected: Vec<fockey_rules::Rejected>,
        stats: fockey_rules::OptimizeStats,
    }

    let mut parsed = parse_rule_list(text);
    let stats = optimize_rules(&mut parsed.rules);
    let imported = Imported {
        rule_set: build_rule_set(&parsed.rules),
        rejected: parsed.rejected,
        stats,
    };
    Ok(to_json(&imported)?)
}

/// Current time in milliseconds since the epoch.
#[wasm_bindgen]
pub fn now() -> f64 {
    js_sys::Date::now()
}

/// Minutes east of UTC for the host's current local time.
#[wasm_bindgen]
pub fn local_tz_offset() -> i32 {
    -(js_sys::Date::new_0().get_timezone_offset() as i32)
}
