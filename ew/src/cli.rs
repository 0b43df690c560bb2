//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::wait::predicate::{self, FieldEquals, Predicate};

/// ew - wait for a filtered event on a scripted event bus
#[derive(Parser, Debug)]
#[command(name = "ew", author, version, about = "Wait for a filtered event on a scripted event bus", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play a script onto a fresh bus and wait for a matching event
    Wait {
        /// Event name to wait for
        #[arg(required = true)]
        event: String,

        /// YAML script of events to emit
        #[arg(short, long, required = true)]
        script: PathBuf,

        /// Match condition POINTER=VALUE (JSON pointer, JSON or string value); repeatable
        #[arg(short = 'w', long = "where", value_name = "POINTER=VALUE")]
        conditions: Vec<String>,

        /// Deadline in milliseconds (default: from config)
        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },
}

/// Parse a `POINTER=VALUE` condition
///
/// The value is read as JSON when it parses (`true`, `3`, `"X"`), else taken
/// as a plain string. The pointer gets a leading `/` if it lacks one.
pub fn parse_condition(condition: &str) -> Result<FieldEquals, String> {
    debug!(%condition, "parse_condition: called");
    let (pointer, raw) = condition
        .split_once('=')
        .ok_or_else(|| format!("condition '{}' is not POINTER=VALUE", condition))?;
    if pointer.is_empty() {
        return Err(format!("condition '{}' has an empty pointer", condition));
    }
    let pointer = if pointer.starts_with('/') {
        pointer.to_string()
    } else {
        format!("/{}", pointer)
    };
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok(predicate::field_equals(pointer, value))
}

/// Build the predicate for a list of conditions; all must hold
pub fn build_predicate(conditions: &[String]) -> Result<Box<dyn Predicate>, String> {
    let terms = conditions
        .iter()
        .map(|c| parse_condition(c).map(|p| Box::new(p) as Box<dyn Predicate>))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(terms = terms.len(), "build_predicate: built");
    Ok(Box::new(predicate::all_of(terms)))
}
