//! Fockey CLI
//!
//! Inspect and edit a Fockey state file: schedules, Quick Block, Lock Mode,
//! blocklist imports, and URL checks against whatever is active right now.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use clap::{ArgAction, Parser, Subcommand};
use fockey_core::{TimeWindow, TimestampMs};

mod commands;
mod duration;
mod file_store;

use commands::Context;

#[derive(Parser)]
#[command(name = "fockey", version)]
#[command(about = "Fockey focus blocker state and rule tools")]
struct Cli {
    /// State file holding schedules, Quick Block and Lock Mode
    #[arg(long, global = true, env = "FOCKEY_STATE", default_value = "fockey-state.json")]
    state: PathBuf,

    /// Timezone offset in minutes east of UTC (default: local offset)
    #[arg(long, global = true, env = "FOCKEY_TZ_OFFSET", allow_negative_numbers = true)]
    tz_offset: Option<i32>,

    /// Evaluate at this time instead of now (RFC 3339 or epoch milliseconds)
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<TimestampMs>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report overlapping time periods, e.g. `overlaps 09:00-12:00 11:00-13:00`
    Overlaps {
        #[arg(required = true)]
        periods: Vec<TimeWindow>,
    },

    /// Show every schedule and whether it is active
    ScheduleStatus,

    /// Show Lock Mode, Quick Block and active schedules
    Status,

    /// Check a URL (or page text) against the active rules
    Check {
        /// URL to check
        #[arg(required_unless_present = "content")]
        url: Option<String>,

        /// Check page text against content keywords instead
        #[arg(long, conflicts_with = "url")]
        content: Option<String>,
    },

    /// Lock Mode
    Lock {
        #[command(subcommand)]
        action: commands::lock::LockAction,
    },

    /// Quick Block session
    Quick {
        #[command(subcommand)]
        action: commands::quick::QuickAction,
    },

    /// Schedule management
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },

    /// Import a blocklist file (`-` for stdin) into Quick Block or a schedule
    Import {
        file: PathBuf,

        /// Target schedule id (default: Quick Block)
        #[arg(long)]
        schedule: Option<String>,

        /// Only report what would be imported
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_now(text: &str) -> Result<TimestampMs, String> {
    if let Ok(ms) = text.parse::<TimestampMs>() {
        return Ok(ms);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|time| time.timestamp_millis())
        .map_err(|e| format!("expected RFC 3339 time or epoch milliseconds: {e}"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context {
        state_path: cli.state,
        now: cli.now.unwrap_or_else(|| Utc::now().timestamp_millis()),
        tz_offset: cli
            .tz_offset
            .unwrap_or_else(|| Local::now().offset().local_minus_utc() / 60),
        json: cli.json,
    };
    log::debug!("now={} tz_offset={}", ctx.now, ctx.tz_offset);

    let result = match cli.command {
        Commands::Overlaps { periods } => commands::inspect::overlaps(&ctx, &periods),
        Commands::ScheduleStatus => commands::inspect::schedule_status(&ctx),
        Commands::Status => commands::inspect::status(&ctx),
        Commands::Check { url, content } => commands::inspect::check(&ctx, url.as_deref(), content.as_deref()),
        Commands::Lock { action } => commands::lock::run(&ctx, action),
        Commands::Quick { action } => commands::quick::run(&ctx, action),
        Commands::Schedule { action } => commands::schedule::run(&ctx, action),
        Commands::Import { file, schedule, dry_run } => {
            commands::import::run(&ctx, &file, schedule.as_deref(), dry_run)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_now() {
        assert_eq!(parse_now("1704191400000"), Ok(1_704_191_400_000));
        assert_eq!(parse_now("2024-01-02T10:30:00Z"), Ok(1_704_191_400_000));
        assert_eq!(parse_now("2024-01-02T12:30:00+02:00"), Ok(1_704_191_400_000));
        assert!(parse_now("yesterday").is_err());
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::try_parse_from(["fockey", "status", "--tz-offset", "-300", "--json"]).unwrap();
        assert_eq!(cli.tz_offset, Some(-300));
        assert!(cli.json);
    }
}
