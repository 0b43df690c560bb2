//! ew - wait for a filtered event on a scripted event bus
//!
//! CLI entry point: plays a YAML event script onto a fresh bus while waiting
//! for a matching event.

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use eventwait::cli::{Cli, Command, build_predicate};
use eventwait::config::Config;
use eventwait::events::create_event_bus;
use eventwait::script::Script;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (WARN)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") | None => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", other);
            tracing::Level::WARN
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(default_timeout_ms = config.default_timeout_ms, "ew loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Wait {
            event,
            script,
            conditions,
            timeout_ms,
        } => {
            let timeout = timeout_ms.map(Duration::from_millis).unwrap_or_else(|| config.default_timeout());
            cmd_wait(&event, &script, &conditions, timeout).await
        }
    }
}

async fn cmd_wait(event: &str, script_path: &Path, conditions: &[String], timeout: Duration) -> Result<()> {
    debug!(%event, ?script_path, ?conditions, ?timeout, "cmd_wait: called");
    let script = Script::load(script_path)?;
    let predicate = build_predicate(conditions).map_err(|e| eyre::eyre!(e))?;

    let bus = create_event_bus();
    let waiter = bus.waiter_for(event);

    // The wait is polled first so its listeners exist before the first step plays
    let wait = waiter.wait(predicate, timeout);
    let play = script.play(&bus);
    tokio::pin!(wait, play);

    let outcome = tokio::select! {
        biased;
        outcome = &mut wait => outcome,
        delivered = &mut play => {
            debug!(delivered, "cmd_wait: script exhausted, still waiting");
            wait.await
        }
    };

    match outcome {
        Ok(()) => {
            println!("{} {} matched", "✓".green(), event.cyan());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            Err(e).with_context(|| format!("Wait for {} failed", event))
        }
    }
}
