use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use fockey_core::clock::{self, Remaining};
use fockey_core::{Settings, SettingsStore, Signal, TimestampMs, WriteBatcher};
use serde::Serialize;
use serde_json::Value;

use crate::file_store::FileStore;

pub mod import;
pub mod inspect;
pub mod lock;
pub mod quick;
pub mod schedule;

/// Resolved global options shared by every command.
pub struct Context {
    pub state_path: PathBuf,
    pub now: TimestampMs,
    pub tz_offset: i32,
    pub json: bool,
}

impl Context {
    pub fn open(&self) -> Result<(FileStore, Settings)> {
        let store = FileStore::open(&self.state_path)?;
        let settings = Settings::load(&store)
            .with_context(|| format!("Invalid settings in {}", self.state_path.display()))?;
        Ok((store, settings))
    }

    /// Settings as of `now`, without writing anything.
    pub fn snapshot(&self) -> Result<Settings> {
        let (_, mut settings) = self.open()?;
        for signal in settings.tick(self.now) {
            log_signal(&signal);
        }
        Ok(settings)
    }

    /// Load, expire, apply `f`, and write the result back.
    pub fn update<T>(&self, f: impl FnOnce(&mut Settings) -> Result<T>) -> Result<T> {
        let (mut store, mut settings) = self.open()?;
        store.subscribe(Box::new(|key: &str, _: &Value| {
            log_signal(&Signal::settings_changed(key));
        }));

        for signal in settings.tick(self.now) {
            log_signal(&signal);
        }
        let result = f(&mut settings)?;

        {
            let mut batcher = WriteBatcher::new(&mut store);
            settings.save(&mut batcher, self.now)?;
        }
        store.persist()?;
        Ok(result)
    }

    /// Print `value` as JSON with `--json`, otherwise the text form.
    pub fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    pub fn format_time(&self, ms: TimestampMs) -> String {
        let offset = FixedOffset::east_opt(self.tz_offset.saturating_mul(60)).unwrap_or(Utc.fix());
        match DateTime::from_timestamp_millis(ms) {
            Some(time) => time.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string(),
            None => ms.to_string(),
        }
    }
}

const DAY_MS: u64 = 24 * 60 * 60 * 1000;

pub fn describe_remaining(remaining: Remaining) -> String {
    match remaining {
        Remaining::Indefinite => "no time limit".to_string(),
        Remaining::Finite(ms) if remaining.should_warn() => {
            format!("{} left, ending soon", clock::format_countdown(ms))
        }
        Remaining::Finite(ms) if ms >= DAY_MS => format!("{} left", clock::format_duration(ms)),
        Remaining::Finite(ms) => format!("{} left", clock::format_countdown(ms)),
    }
}

fn log_signal(signal: &Signal) {
    match serde_json::to_string(signal) {
        Ok(json) => log::info!("signal {json}"),
        Err(e) => log::warn!("unencodable signal {signal:?}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> Context {
        Context {
            state_path: dir.path().join("state.json"),
            now: 1_704_191_400_000,
            tz_offset: 0,
            json: false,
        }
    }

    #[test]
    fn test_update_persists() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        ctx.update(|settings| Ok(settings.activate_lock(60_000, ctx.now)?)).unwrap();
        let settings = ctx.snapshot().unwrap();
        assert_eq!(settings.lock_mode.lock_end_time, Some(ctx.now + 60_000));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let err = ctx
            .update(|settings| Ok(settings.extend_lock(60_000, ctx.now)?))
            .unwrap_err();
        assert_eq!(err.to_string(), "Lock Mode is not active");
        assert!(!ctx.state_path.exists());
    }

    #[test]
    fn test_format_time_uses_offset() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(ctx.format_time(ctx.now), "2024-01-02 10:30");
        ctx.tz_offset = -300;
        assert_eq!(ctx.format_time(ctx.now), "2024-01-02 05:30");
    }

    #[test]
    fn test_describe_remaining() {
        assert_eq!(describe_remaining(Remaining::Indefinite), "no time limit");
        assert_eq!(describe_remaining(Remaining::Finite(600_000)), "10:00 left");
        assert_eq!(describe_remaining(Remaining::Finite(30_000)), "00:30 left, ending soon");
        assert_eq!(describe_remaining(Remaining::Finite(DAY_MS + 2 * 3_600_000)), "1d 2h left");
    }
}
