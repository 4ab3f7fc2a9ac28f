//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use warden_core::{AccountId, Event, Timestamp, WardenConfig};

use crate::script::{Replay, Script, StepRecord};

/// Warden - M-of-N authority and swap replay tool
#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Replay scripted calls against an M-of-N authority and swap engine")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configuration file commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Replay a script against a fresh authority
    Replay {
        /// Configuration file
        #[arg(short, long, env = "WARDEN_CONFIG")]
        config: PathBuf,

        /// Script file
        #[arg(short, long)]
        script: PathBuf,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration
    Init {
        /// Output path
        #[arg(short, long, default_value = "warden.json")]
        output: PathBuf,
    },

    /// Load and validate a configuration
    Check {
        /// Configuration file
        #[arg(short, long, env = "WARDEN_CONFIG")]
        config: PathBuf,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Config(ConfigCommands::Init { output }) => {
            if output.exists() {
                anyhow::bail!("{} already exists", output.display());
            }
            WardenConfig::default().save(&output)?;
            println!("✓ Default configuration written to {}", output.display());
        }

        Commands::Config(ConfigCommands::Check { config }) => {
            let config = load_config(&config)?;
            print_config(&config);
        }

        Commands::Replay {
            config,
            script,
            json,
        } => {
            let config = load_config(&config)?;
            let script = Script::load(&script)
                .with_context(|| format!("loading script {}", script.display()))?;

            let mut replay = Replay::new(&config, &script)?;
            info!(steps = script.steps.len(), "replaying script");
            let records = replay.run(&script.steps);

            for record in &records {
                if json {
                    print_record_json(record)?;
                } else {
                    print_record(&replay, record);
                }
            }
            if !json {
                print_summary(&replay);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<WardenConfig> {
    WardenConfig::load(path).with_context(|| format!("loading config {}", path.display()))
}

/// RFC 3339 rendering of a clock reading
pub fn format_time(at: Timestamp) -> String {
    i64::try_from(at)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| at.to_string())
}

fn print_config(config: &WardenConfig) {
    let authority = &config.authority;
    let swap = &config.swap;

    println!("Configuration OK");
    println!("  Creator: {}", authority.creator);
    for owner in &authority.owners {
        println!("  Owner: {}", owner);
    }
    println!("  Required: {}", authority.required);
    println!("  Daily limit: {}", authority.daily_limit);
    println!("\nSwap:");
    println!("  Cap: {}", swap.cap);
    println!("  Bonus rate: {} for {}s", swap.bonus_rate, swap.bonus_phase_secs);
    println!("  Base rate: {}", swap.base_rate);
    println!("  Window: {}s", swap.window_secs);
    if let Some(reserve) = &swap.reserve {
        println!("  Reserve: {} to {}", reserve.amount, reserve.holder);
    }
}

fn print_record(replay: &Replay, record: &StepRecord) {
    println!(
        "[{}] #{} {}",
        format_time(record.at),
        record.index,
        record.kind
    );
    if let Some(error) = &record.error {
        println!("  ✗ {}", error);
    }
    for event in &record.events {
        println!("  {}", describe(replay, event));
    }
}

fn print_record_json(record: &StepRecord) -> anyhow::Result<()> {
    let at = format_time(record.at);
    if let Some(error) = &record.error {
        let line = JsonLine {
            step: record.index,
            kind: record.kind,
            at: &at,
            error: Some(error.as_str()),
            event: None,
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    for event in &record.events {
        let line = JsonLine {
            step: record.index,
            kind: record.kind,
            at: &at,
            error: None,
            event: Some(event),
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

/// One `--json` output line
///
/// Serialized directly; `serde_json::Value` cannot hold 128-bit amounts.
#[derive(Serialize)]
struct JsonLine<'a> {
    step: usize,
    kind: &'a str,
    at: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a Event>,
}

/// One-line human description of an event
fn describe(replay: &Replay, event: &Event) -> String {
    let name = |account: &AccountId| replay.name_of(account);
    match event {
        Event::Deposit { from, value } => format!("Deposit {} from {}", value, name(from)),
        Event::SimpleExecuted { owner, value, to, .. } => {
            format!("SimpleExecuted {} to {} by {}", value, name(to), name(owner))
        }
        Event::ConfirmationRequired {
            operation,
            initiator,
            value,
            to,
            ..
        } => format!(
            "ConfirmationRequired {} {} to {} by {}",
            operation.short(),
            value,
            name(to),
            name(initiator)
        ),
        Event::Confirmed { owner, operation } => {
            format!("Confirmed {} by {}", operation.short(), name(owner))
        }
        Event::Executed {
            owner,
            operation,
            value,
            to,
            ..
        } => format!(
            "Executed {} {} to {} by {}",
            operation.short(),
            value,
            name(to),
            name(owner)
        ),
        Event::Revoked { owner, operation } => {
            format!("Revoked {} by {}", operation.short(), name(owner))
        }
        Event::OwnerAdded { new_owner } => format!("OwnerAdded {}", name(new_owner)),
        Event::OwnerRemoved { old_owner } => format!("OwnerRemoved {}", name(old_owner)),
        Event::OwnerChanged {
            old_owner,
            new_owner,
        } => format!("OwnerChanged {} -> {}", name(old_owner), name(new_owner)),
        Event::Decommissioned { destination, value } => {
            format!("Decommissioned {} to {}", value, name(destination))
        }
        Event::Minted { holder, amount } => format!("Minted {} to {}", amount, name(holder)),
        Event::Transfer { from, to, value } => {
            format!("Transfer {} from {} to {}", value, name(from), name(to))
        }
        Event::Approval {
            owner,
            spender,
            value,
        } => format!("Approval {} from {} to {}", value, name(owner), name(spender)),
        Event::RequirementChanged { new_requirement } => {
            format!("RequirementChanged {}", new_requirement)
        }
        Event::DailyLimitChanged { new_limit } => format!("DailyLimitChanged {}", new_limit),
        Event::SwapStarted { at } => format!("SwapStarted at {}", format_time(*at)),
        Event::SwapClosed { total_issued } => format!("SwapClosed total issued {}", total_issued),
        Event::SpentTodayReset | Event::EmergencyStopActivated | Event::SwapStopped => {
            event.name().to_string()
        }
    }
}

fn print_summary(replay: &Replay) {
    let authority = replay.authority();

    println!("\nFinal state:");
    println!("  Address: {}", authority.address());
    let owners: Vec<_> = authority
        .owners()
        .iter()
        .map(|owner| replay.name_of(owner))
        .collect();
    println!("  Owners: {}", owners.join(", "));
    println!("  Required: {}", authority.required());
    println!(
        "  Daily limit: {} (spent today {})",
        authority.daily_limit(),
        authority.spent_today()
    );
    println!("  Held value: {}", authority.held_value());
    println!("  Total issued: {}", authority.total_issued());
    println!("  Transfers locked: {}", authority.transfer_locked());
    println!(
        "  Pending: {} operations, {} mutations",
        authority.pending_operations(),
        authority.pending_mutations()
    );
    if authority.emergency_stop_active() {
        println!("  ⚠️  Emergency stop active");
    }
    if authority.is_decommissioned() {
        println!("  ⚠️  Decommissioned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_rfc3339() {
        assert_eq!(format_time(1_497_074_400), "2017-06-10T06:00:00+00:00");
        assert_eq!(format_time(u64::MAX), u64::MAX.to_string());
    }

    #[test]
    fn test_cli_parses_replay() {
        let cli = Cli::try_parse_from([
            "warden", "replay", "--config", "w.json", "--script", "s.json", "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Replay { json: true, .. }));
    }
}
