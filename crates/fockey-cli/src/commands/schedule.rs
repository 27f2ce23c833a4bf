use anyhow::{bail, Result};
use clap::Subcommand;
use fockey_core::{DayMask, Error, RuleKind, Schedule, SchedulePatch, Settings, TimeWindow, TimestampMs};

use super::Context;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Create a schedule, e.g. `schedule add Work --days weekdays --period 09:00-17:00 --domain youtube.com`
    Add {
        name: String,

        /// Days: names, numbers (0 = Sunday), `weekdays`, `weekend` or `daily`
        #[arg(long, value_parser = parse_days, default_value = "weekdays")]
        days: DayMask,

        /// Time period `HH:MM-HH:MM` (repeatable)
        #[arg(long = "period", required = true)]
        periods: Vec<TimeWindow>,

        #[arg(long = "domain")]
        domains: Vec<String>,

        #[arg(long = "url")]
        url_keywords: Vec<String>,

        #[arg(long = "content")]
        content_keywords: Vec<String>,

        /// Explicit id (default: derived from the name)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },
    /// Delete a schedule
    Remove { id: String },
    /// Turn a schedule on
    Enable { id: String },
    /// Turn a schedule off
    Disable { id: String },
    /// Change name, days or periods
    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_parser = parse_days)]
        days: Option<DayMask>,

        /// Replace all periods (repeatable)
        #[arg(long = "period")]
        periods: Vec<TimeWindow>,
    },
    /// Add a rule to a schedule (allowed during Lock Mode)
    AddRule { id: String, kind: RuleKind, value: String },
    /// Remove a rule from a schedule
    RemoveRule { id: String, kind: RuleKind, value: String },
}

fn parse_days(text: &str) -> Result<DayMask, String> {
    DayMask::parse_list(text).ok_or_else(|| format!("invalid day list {text:?}"))
}

/// Lower-case slug of `name` plus a time suffix so ids stay unique.
fn derive_id(name: &str, now: TimestampMs) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        format!("schedule-{now}")
    } else {
        format!("{slug}-{now}")
    }
}

fn ensure_valid(schedule: &Schedule) -> Result<()> {
    let issues = schedule.validate();
    if !issues.is_empty() {
        bail!("Schedule is not valid: {}", serde_json::to_string(&issues)?);
    }
    Ok(())
}

/// Reject a patch that would leave the schedule in a state `add` refuses.
fn check_edit(settings: &Settings, id: &str, patch: &SchedulePatch, now: TimestampMs) -> Result<()> {
    let mut edited = settings
        .schedule(id)
        .cloned()
        .ok_or_else(|| Error::ScheduleNotFound(id.to_string()))?;
    edited.apply(patch.clone(), now);
    ensure_valid(&edited)
}

pub fn run(ctx: &Context, action: ScheduleAction) -> Result<()> {
    let now = ctx.now;
    let message = ctx.update(|settings| {
        let message = match action {
            ScheduleAction::Add {
                name,
                days,
                periods,
                domains,
                url_keywords,
                content_keywords,
                id,
                icon,
            } => {
                let id = id.unwrap_or_else(|| derive_id(&name, now));
                if settings.schedule(&id).is_some() {
                    bail!("Schedule {id} already exists");
                }

                let mut schedule = Schedule::new(id.clone(), name, days, periods, now);
                schedule.icon = icon;
                for (kind, values) in [
                    (RuleKind::Domain, domains),
                    (RuleKind::UrlKeyword, url_keywords),
                    (RuleKind::ContentKeyword, content_keywords),
                ] {
                    for value in values {
                        schedule.add_rule(kind, &value, now)?;
                    }
                }

                ensure_valid(&schedule)?;
                settings.add_schedule(schedule, now)?;
                format!("Added schedule {id}")
            }
            ScheduleAction::Remove { id } => {
                let removed = settings.remove_schedule(&id, now)?;
                format!("Removed schedule {} ({})", removed.id, removed.name)
            }
            ScheduleAction::Enable { id } => {
                settings.set_schedule_enabled(&id, true, now)?;
                format!("Enabled {id}")
            }
            ScheduleAction::Disable { id } => {
                settings.set_schedule_enabled(&id, false, now)?;
                format!("Disabled {id}")
            }
            ScheduleAction::Edit { id, name, days, periods } => {
                let patch = SchedulePatch {
                    name,
                    days,
                    time_periods: (!periods.is_empty()).then_some(periods),
                    ..SchedulePatch::default()
                };
                if patch.is_empty() {
                    bail!("Nothing to change");
                }
                check_edit(settings, &id, &patch, now)?;
                settings.update_schedule(&id, patch, now)?;
                format!("Updated {id}")
            }
            ScheduleAction::AddRule { id, kind, value } => {
                if settings.add_schedule_rule(&id, kind, &value, now)? {
                    format!("Added {kind} rule to {id}")
                } else {
                    format!("{id} already has that {kind} rule")
                }
            }
            ScheduleAction::RemoveRule { id, kind, value } => {
                if settings.remove_schedule_rule(&id, kind, &value, now)? {
                    format!("Removed {kind} rule from {id}")
                } else {
                    format!("{id} has no such {kind} rule")
                }
            }
        };
        Ok(message)
    })?;

    ctx.print(&serde_json::json!({ "message": message }), || message.clone())
}
