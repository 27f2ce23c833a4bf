//! Recurring schedules and their activity evaluation.
//!
//! A schedule is active when it is enabled, today's local weekday is one of
//! its days, and the local minute lies inside at least one of its periods.
//! Periods are half-open, so a period ending at 17:00 is inactive at 17:00.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::overlap::detect_overlaps;
use crate::time::{local_time, TimeWindow};
use crate::types::{DayMask, RuleKind, RuleSet, TimestampMs};

/// A recurring blocking rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub enabled: bool,
    #[cfg_attr(feature = "ts", ts(type = "number[]"))]
    pub days: DayMask,
    pub time_periods: Vec<TimeWindow>,
    #[serde(flatten)]
    pub rules: RuleSet,
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub created_at: TimestampMs,
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub updated_at: TimestampMs,
}

/// Problems the schedule editor reports before saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ScheduleIssue {
    EmptyName,
    NoDays,
    NoTimePeriods,
    /// Period start does not precede its end
    InvalidPeriod { index: usize },
    /// Periods sharing at least one minute
    OverlappingPeriods { indices: Vec<usize> },
}

/// Typed partial update for a schedule; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePatch {
    #[serde(default)]
    pub name: Option<String>,
    /// `null` clears the icon; an absent field keeps it.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub days: Option<DayMask>,
    #[serde(default)]
    pub time_periods: Option<Vec<TimeWindow>>,
    #[serde(default)]
    pub rules: Option<RuleSet>,
}

/// Maps any present value, `null` included, to `Some`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl SchedulePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Schedule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        days: DayMask,
        time_periods: Vec<TimeWindow>,
        now: TimestampMs,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
            enabled: true,
            days,
            time_periods,
            rules: RuleSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Whether the schedule is blocking at `now`.
    pub fn is_active_now(&self, now: TimestampMs, tz_offset_minutes: i32) -> bool {
        is_active_now(self, now, tz_offset_minutes)
    }

    /// Editor validation. An empty result means the schedule can be saved.
    pub fn validate(&self) -> Vec<ScheduleIssue> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(ScheduleIssue::EmptyName);
        }
        if self.days.is_empty() {
            issues.push(ScheduleIssue::NoDays);
        }
        if self.time_periods.is_empty() {
            issues.push(ScheduleIssue::NoTimePeriods);
        }
        for (index, period) in self.time_periods.iter().enumerate() {
            if !period.is_valid() {
                issues.push(ScheduleIssue::InvalidPeriod { index });
            }
        }

        let overlaps = detect_overlaps(&self.time_periods);
        if !overlaps.is_empty() {
            issues.push(ScheduleIssue::OverlappingPeriods {
                indices: overlaps.into_iter().collect(),
            });
        }

        issues
    }

    /// Append a rule. Returns whether the list changed.
    pub fn add_rule(&mut self, kind: RuleKind, value: &str, now: TimestampMs) -> Result<bool> {
        let added = self.rules.insert(kind, value)?;
        if added {
            self.updated_at = now;
        }
        Ok(added)
    }

    /// Remove a rule. Returns whether the list changed.
    pub fn remove_rule(&mut self, kind: RuleKind, value: &str, now: TimestampMs) -> bool {
        let removed = self.rules.remove(kind, value);
        if removed {
            self.updated_at = now;
        }
        removed
    }

    /// Apply `patch`. `updated_at` only moves when a field actually changes.
    /// Returns whether anything changed.
    pub fn apply(&mut self, patch: SchedulePatch, now: TimestampMs) -> bool {
        let mut changed = false;
        replace(&mut self.name, patch.name, &mut changed);
        replace(&mut self.icon, patch.icon, &mut changed);
        replace(&mut self.enabled, patch.enabled, &mut changed);
        replace(&mut self.days, patch.days, &mut changed);
        replace(&mut self.time_periods, patch.time_periods, &mut changed);
        replace(&mut self.rules, patch.rules, &mut changed);
        if changed {
            self.updated_at = now;
        }
        changed
    }
}

fn replace<T: PartialEq>(field: &mut T, value: Option<T>, changed: &mut bool) {
    if let Some(value) = value {
        if *field != value {
            *field = value;
            *changed = true;
        }
    }
}

/// Whether `schedule` is active at `now`.
///
/// `tz_offset_minutes` is minutes east of UTC. Overlapping periods are
/// tolerated: membership in any one valid period is enough.
pub fn is_active_now(schedule: &Schedule, now: TimestampMs, tz_offset_minutes: i32) -> bool {
    if !schedule.enabled {
        return false;
    }

    let local = local_time(now, tz_offset_minutes);
    if !schedule.days.contains_weekday(local.weekday) {
        return false;
    }

    schedule
        .time_periods
        .iter()
        .filter(|period| period.is_valid())
        .any(|period| period.contains(local.minute_of_day))
}

/// All schedules active at `now`, in input order.
pub fn active_schedules(
    schedules: &[Schedule],
    now: TimestampMs,
    tz_offset_minutes: i32,
) -> Vec<&Schedule> {
    schedules
        .iter()
        .filter(|schedule| is_active_now(schedule, now, tz_offset_minutes))
        .collect()
}
