//! Date-range buckets.
//!
//! Each named range resolves, relative to a reference calendar date, to an
//! inclusive window of dates. A task falls in the bucket when its anchor date
//! lies inside the window.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First day of the week for `this_week` / `next_week` arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    /// Day-of-week 0 is Sunday.
    #[default]
    Sunday,
    /// Day-of-week 0 is Monday.
    Monday,
}

impl WeekStart {
    /// Days elapsed since the start of the week containing `date`.
    pub fn day_of_week(&self, date: NaiveDate) -> u64 {
        let weekday = date.weekday();
        u64::from(match self {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        })
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sunday" | "sun" => Some(WeekStart::Sunday),
            "monday" | "mon" => Some(WeekStart::Monday),
            _ => None,
        }
    }
}

/// A named date-range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    ThisMonth,
    NextMonth,
    Overdue,
    All,
}

impl DateRange {
    pub const ALL: [DateRange; 8] = [
        DateRange::Today,
        DateRange::Tomorrow,
        DateRange::ThisWeek,
        DateRange::NextWeek,
        DateRange::ThisMonth,
        DateRange::NextMonth,
        DateRange::Overdue,
        DateRange::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Today => "today",
            DateRange::Tomorrow => "tomorrow",
            DateRange::ThisWeek => "this_week",
            DateRange::NextWeek => "next_week",
            DateRange::ThisMonth => "this_month",
            DateRange::NextMonth => "next_month",
            DateRange::Overdue => "overdue",
            DateRange::All => "all",
        }
    }

    /// Parse a filter value. The empty string means "no date-range filter"
    /// and yields `Ok(None)`.
    pub fn parse_filter(s: &str) -> Result<Option<Self>, String> {
        let normalized = crate::types::normalize_label(s);
        if normalized.is_empty() {
            return Ok(None);
        }
        DateRange::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .map(Some)
            .ok_or_else(|| format!("invalid date range '{}'", s))
    }

    /// Inclusive window for this range, or `None` when the range places no
    /// restriction (`all`).
    pub fn window(&self, today: NaiveDate, week_start: WeekStart) -> Option<DateWindow> {
        let window = match self {
            DateRange::All => return None,
            DateRange::Today => DateWindow::single(today),
            DateRange::Tomorrow => DateWindow::single(add_days(today, 1)),
            DateRange::ThisWeek => DateWindow::between(today, end_of_week(today, week_start)),
            DateRange::NextWeek => {
                let end = end_of_week(today, week_start);
                DateWindow::between(add_days(end, 1), add_days(end, 7))
            }
            DateRange::ThisMonth => {
                let first = first_of_month(today);
                DateWindow::between(first, last_of_month(first))
            }
            DateRange::NextMonth => {
                let first = first_of_next_month(today);
                DateWindow::between(first, last_of_month(first))
            }
            DateRange::Overdue => DateWindow {
                start: None,
                end: today.pred_opt(),
            },
        };
        Some(window)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateRange::parse_filter(s)?.ok_or_else(|| "date range must not be empty".to_string())
    }
}

/// Inclusive date window; an open side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn single(date: NaiveDate) -> Self {
        Self::between(date, date)
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// Inclusive end of the current week: `today + (7 - day_of_week)`.
fn end_of_week(today: NaiveDate, week_start: WeekStart) -> NaiveDate {
    add_days(today, 7 - week_start.day_of_week(today))
}

// Saturates at the chrono maximum instead of panicking.
fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    first_of_next_month(first).pred_opt().unwrap_or(first)
}
