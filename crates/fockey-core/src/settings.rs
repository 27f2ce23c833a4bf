//! Settings snapshot
//!
//! Bundles the three persisted sections (schedules, Quick Block session, Lock
//! Mode) so callers can advance them with one `tick`, build the matcher for
//! the current moment, and apply schedule edits behind the Lock Mode gate.

use serde::{Deserialize, Serialize};

use crate::clock::Remaining;
use crate::error::{Error, Result};
use crate::lock::{LockModeState, LockState};
use crate::matcher::{BlockMatcher, RuleSource};
use crate::quick_block::QuickBlockSession;
use crate::schedule::{active_schedules, Schedule, SchedulePatch};
use crate::signal::Signal;
use crate::store::{self, keys, SettingsStore, StoreError, WriteBatcher};
use crate::types::{RuleKind, TimestampMs};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub quick_block: QuickBlockSession,
    #[serde(default)]
    pub lock_mode: LockModeState,
}

/// Summary of what is in force at a given moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsStatus {
    pub is_locked: bool,
    pub lock_end_time: Option<TimestampMs>,
    pub lock_remaining: Option<Remaining>,
    pub quick_block_active: bool,
    pub quick_block_remaining: Option<Remaining>,
    pub active_schedule_ids: Vec<String>,
}

impl Settings {
    /// Read all sections; missing sections fall back to defaults.
    pub fn load<S: SettingsStore + ?Sized>(store: &S) -> std::result::Result<Self, StoreError> {
        Ok(Self {
            schedules: store::load(store, keys::SCHEDULES)?.unwrap_or_default(),
            quick_block: store::load(store, keys::QUICK_BLOCK)?.unwrap_or_default(),
            lock_mode: store::load(store, keys::LOCK_MODE)?.unwrap_or_default(),
        })
    }

    /// Queue all sections for writing.
    pub fn save<S: SettingsStore + ?Sized>(
        &self,
        batcher: &mut WriteBatcher<'_, S>,
        now: TimestampMs,
    ) -> std::result::Result<(), StoreError> {
        batcher.queue(keys::SCHEDULES, &self.schedules, now)?;
        batcher.queue(keys::QUICK_BLOCK, &self.quick_block, now)?;
        batcher.queue(keys::LOCK_MODE, &self.lock_mode, now)?;
        Ok(())
    }

    pub fn lock_state(&self) -> LockState {
        LockState::from(self.lock_mode)
    }

    /// Apply natural expiry to Lock Mode and the Quick Block session.
    pub fn tick(&mut self, now: TimestampMs) -> Vec<Signal> {
        let mut signals = Vec::new();

        let before = self.lock_state();
        let after = before.tick(now);
        if after != before {
            self.lock_mode = after.into();
            signals.push(Signal::lock_status_changed(self.lock_mode));
        }

        if self.quick_block.is_expired(now) {
            self.quick_block = std::mem::take(&mut self.quick_block).check_expiry(now);
            signals.push(Signal::QuickBlockExpired);
        }

        signals
    }

    /// Matcher holding the active Quick Block rules and every active schedule.
    pub fn matcher(&self, now: TimestampMs, tz_offset_minutes: i32) -> BlockMatcher {
        let mut matcher = BlockMatcher::new();

        let quick_block = self.quick_block.clone().check_expiry(now);
        if quick_block.is_active {
            matcher.add_rules(&quick_block.rules, RuleSource::QuickBlock);
        }

        for schedule in active_schedules(&self.schedules, now, tz_offset_minutes) {
            matcher.add_rules(
                &schedule.rules,
                RuleSource::Schedule {
                    id: schedule.id.clone(),
                    name: schedule.name.clone(),
                },
            );
        }

        log::debug!(
            "matcher built with {} rules from {} sources",
            matcher.rule_count(),
            matcher.source_count()
        );
        matcher
    }

    pub fn status(&self, now: TimestampMs, tz_offset_minutes: i32) -> SettingsStatus {
        let lock = self.lock_state().tick(now);
        let quick_block = self.quick_block.clone().check_expiry(now);

        SettingsStatus {
            is_locked: lock.is_locked(),
            lock_end_time: lock.lock_end_time(),
            lock_remaining: lock.remaining(now),
            quick_block_active: quick_block.is_active,
            quick_block_remaining: quick_block.remaining(now),
            active_schedule_ids: active_schedules(&self.schedules, now, tz_offset_minutes)
                .into_iter()
                .map(|schedule| schedule.id.clone())
                .collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Lock Mode
    // -------------------------------------------------------------------------

    pub fn activate_lock(&mut self, duration_ms: u64, now: TimestampMs) -> Result<Signal> {
        let state = self.lock_state().activate(duration_ms, now)?;
        self.lock_mode = state.into();
        Ok(Signal::lock_status_changed(self.lock_mode))
    }

    pub fn extend_lock(&mut self, additional_ms: u64, now: TimestampMs) -> Result<Signal> {
        let state = self.lock_state().extend(additional_ms, now)?;
        self.lock_mode = state.into();
        Ok(Signal::lock_status_changed(self.lock_mode))
    }

    // -------------------------------------------------------------------------
    // Schedules
    // -------------------------------------------------------------------------

    pub fn schedule(&self, id: &str) -> Option<&Schedule> {
        self.schedules.iter().find(|schedule| schedule.id == id)
    }

    fn schedule_mut(&mut self, id: &str) -> Result<&mut Schedule> {
        self.schedules
            .iter_mut()
            .find(|schedule| schedule.id == id)
            .ok_or_else(|| Error::ScheduleNotFound(id.to_string()))
    }

    pub fn add_schedule(&mut self, schedule: Schedule, now: TimestampMs) -> Result<()> {
        self.lock_state().guard(now)?;
        log::info!("schedule {:?} added", schedule.name);
        self.schedules.push(schedule);
        Ok(())
    }

    pub fn update_schedule(&mut self, id: &str, patch: SchedulePatch, now: TimestampMs) -> Result<()> {
        self.lock_state().guard(now)?;
        self.schedule_mut(id)?.apply(patch, now);
        Ok(())
    }

    pub fn set_schedule_enabled(&mut self, id: &str, enabled: bool, now: TimestampMs) -> Result<()> {
        let patch = SchedulePatch {
            enabled: Some(enabled),
            ..SchedulePatch::default()
        };
        self.update_schedule(id, patch, now)
    }

    pub fn remove_schedule(&mut self, id: &str, now: TimestampMs) -> Result<Schedule> {
        self.lock_state().guard(now)?;
        let index = self
            .schedules
            .iter()
            .position(|schedule| schedule.id == id)
            .ok_or_else(|| Error::ScheduleNotFound(id.to_string()))?;
        Ok(self.schedules.remove(index))
    }

    /// Tightening a schedule is allowed even while Lock Mode is active.
    pub fn add_schedule_rule(
        &mut self,
        id: &str,
        kind: RuleKind,
        value: &str,
        now: TimestampMs,
    ) -> Result<bool> {
        self.schedule_mut(id)?.add_rule(kind, value, now)
    }

    pub fn remove_schedule_rule(
        &mut self,
        id: &str,
        kind: RuleKind,
        value: &str,
        now: TimestampMs,
    ) -> Result<bool> {
        self.lock_state().guard(now)?;
        Ok(self.schedule_mut(id)?.remove_rule(kind, value, now))
    }
}
