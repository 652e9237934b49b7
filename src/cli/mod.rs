//! CLI command definitions for followup-engine
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod cart;
pub mod filter;

use crate::format::OutputFormat;
use crate::types::TaskKind;
use cart::CartArgs;
use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand, ValueEnum};
use filter::FilterArgs;

/// Task vocabulary of the input listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Follow-up calls (hot/warm/cold)
    Followup,
    /// CRM tasks (low/medium/high/urgent)
    Crm,
}

impl From<Kind> for TaskKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Followup => TaskKind::Followup,
            Kind::Crm => TaskKind::Crm,
        }
    }
}

/// Output format flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Markdown,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => OutputFormat::Json,
            Format::Markdown => OutputFormat::Markdown,
        }
    }
}

/// Follow-up task filtering and date bucketing
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Filter a task listing and print the matches with status counts
    Filter(FilterArgs),

    /// Print the date window every range resolves to
    Buckets(BucketsArgs),

    /// Inspect or edit the persisted cart
    Cart(CartArgs),
}

/// Arguments for the buckets subcommand
#[derive(Args, Debug)]
pub struct BucketsArgs {
    /// Reference time (RFC 3339); defaults to the local clock
    #[arg(long, value_name = "RFC3339", value_parser = parse_now)]
    pub now: Option<DateTime<FixedOffset>>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,
}

/// Parse a `--now` value. A bare date is taken as midnight UTC.
pub fn parse_now(s: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| format!("'{}' is not an RFC 3339 timestamp or YYYY-MM-DD date", s))
}
