use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use fockey_rules::{merge_into, optimize_rules, parse_rule_list, OptimizeStats, Rejected};
use serde::Serialize;

use super::Context;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportReport {
    target: String,
    stats: OptimizeStats,
    added: usize,
    rejected: Vec<Rejected>,
    dry_run: bool,
}

fn read_input(file: &Path) -> Result<String> {
    if file.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read blocklist from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(file).with_context(|| format!("Failed to read '{}'", file.display()))
}

pub fn run(ctx: &Context, file: &Path, schedule: Option<&str>, dry_run: bool) -> Result<()> {
    let text = read_input(file)?;
    let mut parsed = parse_rule_list(&text);
    let stats = optimize_rules(&mut parsed.rules);
    for rejected in &parsed.rejected {
        log::warn!("line {}: {} ({:?})", rejected.line, rejected.reason, rejected.text);
    }

    let target = match schedule {
        Some(id) => format!("schedule {id}"),
        None => "Quick Block".to_string(),
    };

    let added = if dry_run {
        0
    } else {
        ctx.update(|settings| match schedule {
            Some(id) => {
                let mut added = 0;
                for rule in &parsed.rules {
                    if settings.add_schedule_rule(id, rule.kind, &rule.value, ctx.now)? {
                        added += 1;
                    }
                }
                Ok(added)
            }
            None => Ok(merge_into(&mut settings.quick_block.rules, &parsed.rules)),
        })?
    };

    let report = ImportReport {
        target,
        stats,
        added,
        rejected: parsed.rejected,
        dry_run,
    };
    ctx.print(&report, || {
        format!(
            "{}: {} rules parsed, {} duplicates, {} covered by broader domains, {} added, {} lines rejected",
            report.target,
            report.stats.before,
            report.stats.deduped,
            report.stats.covered,
            if report.dry_run { "none".to_string() } else { report.added.to_string() },
            report.rejected.len()
        )
    })
}
