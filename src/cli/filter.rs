//! Filter subcommand arguments.

use super::{Format, Kind, parse_now};
use crate::buckets::DateRange;
use crate::engine::FilterQuery;
use crate::error::{FollowUpError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the filter subcommand
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Task listing JSON file, or `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Vocabulary of the listing (overrides config)
    #[arg(short, long, value_enum)]
    pub kind: Option<Kind>,

    /// Case-insensitive substring over name, phone and reason/title fields
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Exact priority, e.g. hot or urgent
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Exact status, e.g. pending or in_progress
    #[arg(long)]
    pub status: Option<String>,

    /// today, tomorrow, this_week, next_week, this_month, next_month, overdue or all
    #[arg(short, long, value_name = "RANGE")]
    pub date_range: Option<String>,

    /// Only tasks anchored on this calendar date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Reference time (RFC 3339); defaults to the local clock
    #[arg(long, value_name = "RFC3339", value_parser = parse_now)]
    pub now: Option<DateTime<FixedOffset>>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Reject unknown priority or status values in records and in filter flags
    #[arg(long)]
    pub strict: bool,
}

impl FilterArgs {
    /// Build the engine query from the flags.
    pub fn query(&self) -> Result<FilterQuery> {
        let date_range = match self.date_range.as_deref() {
            Some(raw) => DateRange::parse_filter(raw)
                .map_err(|reason| FollowUpError::invalid_value("dateRange", reason))?,
            None => None,
        };
        Ok(FilterQuery {
            search_term: self.search.clone(),
            priority: self.priority.clone(),
            status: self.status.clone(),
            date_range,
            specific_date: self.date,
        })
    }

    /// Whether the listing should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}
