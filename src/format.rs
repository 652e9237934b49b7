//! Output formatting utilities for markdown and JSON.

use crate::buckets::{DateRange, DateWindow, WeekStart};
use crate::engine::{FilterOutcome, ListOutcome};
use crate::types::{TaskRecord, Vocabulary};
use chrono::{FixedOffset, NaiveDate};
use heck::ToTitleCase;
use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Format an engine result for either vocabulary.
pub fn format_list_markdown(outcome: &ListOutcome<'_>, offset: &FixedOffset) -> String {
    match outcome {
        ListOutcome::FollowUps(o) => format_outcome_markdown(o, offset),
        ListOutcome::Crm(o) => format_outcome_markdown(o, offset),
    }
}

/// Format a filtered list as markdown, grouped by status in vocabulary
/// order. Tasks with an unrecognized status are listed last.
pub fn format_outcome_markdown<T: TaskRecord>(
    outcome: &FilterOutcome<'_, T>,
    offset: &FixedOffset,
) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Tasks ({})\n\n", outcome.counts.total()));

    let summary: Vec<String> = outcome
        .counts
        .iter()
        .map(|(status, n)| format!("{}: {}", format_state_name(status.as_str()), n))
        .collect();
    md.push_str(&summary.join(" | "));
    md.push_str("\n\n");

    for status in T::Status::variants() {
        let tasks: Vec<&T> = outcome
            .filtered
            .iter()
            .copied()
            .filter(|t| t.status().is(*status))
            .collect();
        if tasks.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", format_state_name(status.as_str())));
        for task in tasks {
            md.push_str(&format_task_short(task, offset));
        }
        md.push('\n');
    }

    let other: Vec<&T> = outcome
        .filtered
        .iter()
        .copied()
        .filter(|t| t.status().known().is_none())
        .collect();
    if !other.is_empty() {
        md.push_str("## Other\n\n");
        for task in other {
            md.push_str(&format_task_short(task, offset));
        }
        md.push('\n');
    }

    md
}

/// Format a state name for display (`in_progress` -> `In Progress`).
fn format_state_name(state: &str) -> String {
    state.to_title_case()
}

/// Format a task in short form for lists.
fn format_task_short<T: TaskRecord>(task: &T, offset: &FixedOffset) -> String {
    let priority = task.priority().as_str();
    let priority = if priority.is_empty() {
        String::new()
    } else {
        format!("[{}] ", priority)
    };

    let anchor = task
        .schedule()
        .anchor_date(offset)
        .map(|d| format!(" ({})", d))
        .unwrap_or_default();

    let contact = task.customer();
    let customer = match (contact.name.as_deref(), contact.phone.as_deref()) {
        (Some(name), Some(phone)) => format!(" - {} ({})", name, phone),
        (Some(name), None) => format!(" - {}", name),
        (None, Some(phone)) => format!(" - {}", phone),
        (None, None) => String::new(),
    };

    format!(
        "- {}{} `{}`{}{}\n",
        priority,
        task.headline().unwrap_or("(untitled)"),
        task.id(),
        anchor,
        customer,
    )
}

/// Format the resolved window of every date range.
pub fn format_buckets_markdown(today: NaiveDate, week_start: WeekStart) -> String {
    let mut md = String::new();
    md.push_str(&format!(
        "# Date ranges for {} ({}-start weeks)\n\n",
        today,
        match week_start {
            WeekStart::Sunday => "Sunday",
            WeekStart::Monday => "Monday",
        }
    ));
    md.push_str("| range | from | to |\n|---|---|---|\n");
    for range in DateRange::ALL {
        let (from, to) = window_bounds(range.window(today, week_start));
        md.push_str(&format!("| {} | {} | {} |\n", range, from, to));
    }
    md
}

/// JSON rows for the bucket table.
pub fn buckets_json(today: NaiveDate, week_start: WeekStart) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = DateRange::ALL
        .iter()
        .map(|range| {
            let window = range.window(today, week_start);
            serde_json::json!({
                "range": range.as_str(),
                "from": window.and_then(|w| w.start),
                "to": window.and_then(|w| w.end),
            })
        })
        .collect();
    serde_json::json!({
        "today": today,
        "weekStart": week_start,
        "ranges": rows,
    })
}

fn window_bounds(window: Option<DateWindow>) -> (String, String) {
    let show = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "*".into());
    match window {
        Some(w) => (show(w.start), show(w.end)),
        None => ("*".into(), "*".into()),
    }
}
