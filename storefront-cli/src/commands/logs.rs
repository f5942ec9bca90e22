//! Logs command - what happened in past shop sessions

use anyhow::Result;
use chrono::{Local, TimeZone};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use storefront_core::services::logging::now_ms;
use storefront_core::{LogEntry, LogQuery, LoggingService};

use super::get_shop_dir;
use crate::output;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// List recorded events, newest first
    List {
        /// Only this event, e.g. checkout_completed or login_failed
        #[arg(long)]
        event: Option<String>,
        /// Only events that led to this view, e.g. login or order_detail
        #[arg(long)]
        route: Option<String>,
        /// Only failed or unauthorized actions
        #[arg(long)]
        failures: bool,
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete events older than N days
    Clear {
        #[arg(long, default_value = "30")]
        older_than_days: u32,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count events per action
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open_log() -> Result<LoggingService> {
    let shop_dir = get_shop_dir()?;
    std::fs::create_dir_all(&shop_dir)?;
    LoggingService::new(&shop_dir, env!("CARGO_PKG_VERSION"))
}

fn local_time(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    let log = open_log()?;

    match command {
        LogsCommands::List {
            event,
            route,
            failures,
            limit,
            json,
        } => {
            let entries = log.entries(&LogQuery {
                event,
                route,
                failures_only: failures,
                limit,
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                output::info("Nothing recorded yet");
            } else {
                print_entries(&entries);
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let cutoff = now_ms() - i64::from(older_than_days) * DAY_MS;

            let confirmed = force
                || json
                || Confirm::new()
                    .with_prompt(format!(
                        "Delete events recorded more than {} days ago?",
                        older_than_days
                    ))
                    .default(false)
                    .interact()?;
            if !confirmed {
                output::info("Kept the event log");
                return Ok(());
            }

            let deleted = log.prune_before(cutoff)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} events", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let counts = log.event_counts()?;
            let total = log.total()?;
            let failures = log.failure_count()?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "total": total,
                        "failures": failures,
                        "events": counts,
                        "database_path": log.db_path().to_string_lossy(),
                    }))?
                );
                return Ok(());
            }

            println!("{}", "Event log".bold());
            println!("  Events: {}", total);
            println!("  Failures: {}", failures);
            println!("  Database: {}", log.db_path().display());
            if counts.is_empty() {
                return Ok(());
            }

            println!();
            let mut table = output::create_table();
            table.set_header(vec!["Event", "Count", "Last seen"]);
            for count in &counts {
                table.add_row(vec![
                    count.event.clone(),
                    count.total.to_string(),
                    local_time(count.last_recorded_at),
                ]);
            }
            println!("{}", table);
        }
    }

    Ok(())
}

fn print_entries(entries: &[LogEntry]) {
    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Command", "View", "Message"]);
    for entry in entries {
        let event = if entry.failure.is_some() {
            entry.event.red().to_string()
        } else {
            entry.event.clone()
        };
        table.add_row(vec![
            local_time(entry.recorded_at),
            event,
            entry.command.clone().unwrap_or_default(),
            entry.route.clone().unwrap_or_default(),
            entry.failure.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
}
