use anyhow::Result;
use fockey_core::{detect_overlaps, MatchResult, RuleSource, Schedule, TimeWindow};
use serde::Serialize;

use super::{describe_remaining, Context};

pub fn overlaps(ctx: &Context, periods: &[TimeWindow]) -> Result<()> {
    let indices: Vec<usize> = detect_overlaps(periods).into_iter().collect();

    ctx.print(&indices, || {
        if indices.is_empty() {
            return "No overlapping periods".to_string();
        }
        let listed: Vec<String> = indices
            .iter()
            .map(|&i| format!("#{i} {}", periods[i]))
            .collect();
        format!("Overlapping periods: {}", listed.join(", "))
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleLine<'a> {
    id: &'a str,
    name: &'a str,
    enabled: bool,
    active: bool,
    days: Vec<u8>,
    time_periods: Vec<String>,
    rule_count: usize,
}

impl<'a> ScheduleLine<'a> {
    fn new(schedule: &'a Schedule, ctx: &Context) -> Self {
        Self {
            id: &schedule.id,
            name: &schedule.name,
            enabled: schedule.enabled,
            active: schedule.is_active_now(ctx.now, ctx.tz_offset),
            days: schedule.days.indices(),
            time_periods: schedule.time_periods.iter().map(ToString::to_string).collect(),
            rule_count: schedule.rules.len(),
        }
    }

    fn state(&self) -> &'static str {
        match (self.enabled, self.active) {
            (false, _) => "disabled",
            (true, true) => "ACTIVE",
            (true, false) => "idle",
        }
    }
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn schedule_status(ctx: &Context) -> Result<()> {
    let settings = ctx.snapshot()?;
    let lines: Vec<ScheduleLine<'_>> = settings
        .schedules
        .iter()
        .map(|schedule| ScheduleLine::new(schedule, ctx))
        .collect();

    ctx.print(&lines, || {
        if lines.is_empty() {
            return "No schedules".to_string();
        }
        lines
            .iter()
            .map(|line| {
                let days: Vec<&str> = line.days.iter().map(|&d| DAY_NAMES[d as usize % 7]).collect();
                format!(
                    "{:<8} {} ({})  {}  {}  {} rules",
                    line.state(),
                    line.name,
                    line.id,
                    days.join(","),
                    line.time_periods.join(" "),
                    line.rule_count
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

pub fn status(ctx: &Context) -> Result<()> {
    let settings = ctx.snapshot()?;
    let status = settings.status(ctx.now, ctx.tz_offset);

    ctx.print(&status, || {
        let lock = match (status.lock_end_time, status.lock_remaining) {
            (Some(end), Some(remaining)) => format!(
                "locked until {} ({})",
                ctx.format_time(end),
                describe_remaining(remaining)
            ),
            _ => "off".to_string(),
        };
        let quick = match status.quick_block_remaining {
            Some(remaining) => format!("active ({})", describe_remaining(remaining)),
            None => format!("inactive, {} rules saved", settings.quick_block.rules.len()),
        };
        let active: Vec<&str> = settings
            .schedules
            .iter()
            .filter(|s| status.active_schedule_ids.contains(&s.id))
            .map(|s| s.name.as_str())
            .collect();
        let schedules = if active.is_empty() {
            "none active".to_string()
        } else {
            active.join(", ")
        };

        format!(
            "Time:        {}\nLock Mode:   {lock}\nQuick Block: {quick}\nSchedules:   {schedules}",
            ctx.format_time(ctx.now)
        )
    })
}

pub fn check(ctx: &Context, url: Option<&str>, content: Option<&str>) -> Result<()> {
    let settings = ctx.snapshot()?;
    let matcher = settings.matcher(ctx.now, ctx.tz_offset);
    let result = match (url, content) {
        (_, Some(text)) => matcher.match_content(text),
        (Some(url), None) => matcher.match_url(url),
        (None, None) => MatchResult::default(),
    };

    ctx.print(&result, || describe_match(&result))
}

fn describe_match(result: &MatchResult) -> String {
    if !result.is_blocked() {
        return "ALLOW".to_string();
    }
    let kind = result.kind.map(|k| k.to_string()).unwrap_or_default();
    let rule = result.rule.as_deref().unwrap_or_default();
    let source = match &result.source {
        Some(RuleSource::QuickBlock) => "Quick Block".to_string(),
        Some(RuleSource::Schedule { name, .. }) => format!("schedule {name}"),
        None => "unknown source".to_string(),
    };
    format!("BLOCK by {kind} rule {rule:?} from {source}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use fockey_core::{MatchDecision, RuleKind};

    #[test]
    fn test_describe_match() {
        assert_eq!(describe_match(&MatchResult::default()), "ALLOW");

        let result = MatchResult {
            decision: MatchDecision::Block,
            kind: Some(RuleKind::Domain),
            rule: Some("youtube.com".to_string()),
            source: Some(RuleSource::Schedule { id: "w".to_string(), name: "Work".to_string() }),
        };
        assert_eq!(
            describe_match(&result),
            r#"BLOCK by domain rule "youtube.com" from schedule Work"#
        );
    }
}
