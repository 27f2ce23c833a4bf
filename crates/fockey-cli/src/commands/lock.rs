use anyhow::Result;
use clap::Subcommand;

use super::{describe_remaining, Context};
use crate::duration::parse_duration_ms;

#[derive(Subcommand)]
pub enum LockAction {
    /// Freeze settings for a duration (1m to 365d), e.g. `lock activate 2h`
    Activate {
        #[arg(value_parser = parse_duration_ms)]
        duration: u64,
    },
    /// Push the end of an active lock later
    Extend {
        #[arg(value_parser = parse_duration_ms)]
        duration: u64,
    },
}

pub fn run(ctx: &Context, action: LockAction) -> Result<()> {
    let (signal, lock) = ctx.update(|settings| {
        let signal = match action {
            LockAction::Activate { duration } => settings.activate_lock(duration, ctx.now)?,
            LockAction::Extend { duration } => settings.extend_lock(duration, ctx.now)?,
        };
        Ok((signal, settings.lock_state()))
    })?;

    ctx.print(&signal, || match (lock.lock_end_time(), lock.remaining(ctx.now)) {
        (Some(end), Some(remaining)) => format!(
            "Locked until {} ({})",
            ctx.format_time(end),
            describe_remaining(remaining)
        ),
        _ => "Not locked".to_string(),
    })
}
