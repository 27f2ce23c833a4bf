use anyhow::Result;
use clap::Subcommand;
use fockey_core::{RuleKind, Settings};

use super::{describe_remaining, Context};
use crate::duration::parse_duration_ms;

#[derive(Subcommand)]
pub enum QuickAction {
    /// Start a session with the saved Quick Block rules
    Start {
        /// Session length, e.g. `25m`; omit for no time limit
        #[arg(long, value_parser = parse_duration_ms)]
        duration: Option<u64>,
    },
    /// Add time to a timed session
    Extend {
        #[arg(value_parser = parse_duration_ms)]
        duration: u64,
    },
    /// End the session and keep its rules
    Stop,
    /// Add a rule (allowed during a session)
    Add { kind: RuleKind, value: String },
    /// Remove a rule (only between sessions)
    Remove { kind: RuleKind, value: String },
    /// Show the session and its rules
    Show,
}

pub fn run(ctx: &Context, action: QuickAction) -> Result<()> {
    let settings = match action {
        QuickAction::Show => ctx.snapshot()?,
        action => ctx.update(|settings| {
            let session = settings.quick_block.clone();
            settings.quick_block = match action {
                QuickAction::Start { duration } => session.resume(ctx.now, duration)?,
                QuickAction::Extend { duration } => session.extend(duration)?,
                QuickAction::Stop => session.stop(),
                QuickAction::Add { kind, value } => session.add_rule(kind, &value)?,
                QuickAction::Remove { kind, value } => session.remove_rule(kind, &value)?,
                QuickAction::Show => session,
            };
            Ok(settings.clone())
        })?,
    };

    ctx.print(&settings.quick_block, || describe(ctx, &settings))
}

fn describe(ctx: &Context, settings: &Settings) -> String {
    let session = &settings.quick_block;
    let mut lines = vec![match session.remaining(ctx.now) {
        Some(remaining) => format!("Quick Block active ({})", describe_remaining(remaining)),
        None => "Quick Block inactive".to_string(),
    }];

    for kind in [RuleKind::Domain, RuleKind::UrlKeyword, RuleKind::ContentKeyword] {
        let rules = session.rules.list(kind);
        if !rules.is_empty() {
            lines.push(format!("  {kind}: {}", rules.join(", ")));
        }
    }
    if session.rules.is_empty() {
        lines.push("  no rules saved".to_string());
    }
    lines.join("\n")
}
