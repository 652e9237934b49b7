//! Anchor date resolution.
//!
//! A task's anchor is the single calendar date used to place it into a
//! date-range bucket. It comes from the first populated field in the order
//! `taskDate`, `scheduledTime`/`dueDate`, `createdAt`. If that field does not
//! parse, the task has no anchor; later fields are not consulted.

use crate::types::{RawDate, Schedule};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Which schedule field supplied the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorField {
    TaskDate,
    ScheduledTime,
    DueDate,
    CreatedAt,
}

impl AnchorField {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorField::TaskDate => "taskDate",
            AnchorField::ScheduledTime => "scheduledTime",
            AnchorField::DueDate => "dueDate",
            AnchorField::CreatedAt => "createdAt",
        }
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl Schedule {
    /// The authoritative field per the fallback order, if any is populated.
    pub fn authoritative(&self) -> Option<(AnchorField, &RawDate)> {
        if let Some(ref d) = self.task_date {
            return Some((AnchorField::TaskDate, d));
        }
        if let Some(ref d) = self.scheduled_time {
            return Some((AnchorField::ScheduledTime, d));
        }
        if let Some(ref d) = self.due_date {
            return Some((AnchorField::DueDate, d));
        }
        self.created_at
            .as_ref()
            .map(|d| (AnchorField::CreatedAt, d))
    }

    /// Resolve the anchor date in the given local offset.
    pub fn anchor_date(&self, offset: &FixedOffset) -> Option<NaiveDate> {
        self.authoritative()
            .and_then(|(_, raw)| parse_calendar_date(raw, offset))
    }
}

/// Parse a raw date or timestamp down to a calendar date.
///
/// Timestamps carrying an offset are converted to `offset` before the time is
/// dropped; naive timestamps are taken as local wall-clock time. Returns
/// `None` for anything unparseable.
pub fn parse_calendar_date(raw: &RawDate, offset: &FixedOffset) -> Option<NaiveDate> {
    match raw {
        RawDate::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms)
            .map(|utc| utc.with_timezone(offset).date_naive()),
        RawDate::Text(text) => parse_text(text.trim(), offset),
    }
}

fn parse_text(text: &str, offset: &FixedOffset) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(offset).date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn text(s: &str) -> Option<RawDate> {
        Some(RawDate::Text(s.to_string()))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_date() {
        let raw = RawDate::Text("2024-01-10".into());
        assert_eq!(parse_calendar_date(&raw, &utc()), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn test_rfc3339_converted_to_reference_offset() {
        // 22:30 UTC on the 9th is already the 10th in UTC+6.
        let raw = RawDate::Text("2024-01-09T22:30:00Z".into());
        let dhaka = FixedOffset::east_opt(6 * 3600).unwrap();
        assert_eq!(parse_calendar_date(&raw, &utc()), Some(ymd(2024, 1, 9)));
        assert_eq!(parse_calendar_date(&raw, &dhaka), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn test_naive_timestamps_are_local() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        for s in ["2024-03-01T23:59:59", "2024-03-01 23:59", "2024-03-01T23:59:59.250"] {
            let raw = RawDate::Text(s.into());
            assert_eq!(parse_calendar_date(&raw, &offset), Some(ymd(2024, 3, 1)), "{}", s);
        }
    }

    #[test]
    fn test_epoch_millis() {
        // 2024-01-10T00:00:00Z
        let raw = RawDate::EpochMillis(1_704_844_800_000);
        assert_eq!(parse_calendar_date(&raw, &utc()), Some(ymd(2024, 1, 10)));
    }

    #[test]
    fn test_garbage_is_none() {
        for s in ["not-a-date", "2024-13-01", "10/01/2024", ""] {
            let raw = RawDate::Text(s.into());
            assert_eq!(parse_calendar_date(&raw, &utc()), None, "{}", s);
        }
    }

    #[test]
    fn test_fallback_order() {
        let schedule = Schedule {
            task_date: None,
            scheduled_time: text("2024-02-02T10:00:00Z"),
            due_date: text("2024-03-03"),
            created_at: text("2024-01-01"),
        };
        let (field, _) = schedule.authoritative().unwrap();
        assert_eq!(field, AnchorField::ScheduledTime);
        assert_eq!(schedule.anchor_date(&utc()), Some(ymd(2024, 2, 2)));

        let created_only = Schedule {
            created_at: text("2024-01-01T08:00:00Z"),
            ..Default::default()
        };
        assert_eq!(created_only.anchor_date(&utc()), Some(ymd(2024, 1, 1)));
    }

    #[test]
    fn test_unparseable_authoritative_field_does_not_fall_through() {
        let schedule = Schedule {
            task_date: text("not-a-date"),
            created_at: text("2024-01-10"),
            ..Default::default()
        };
        assert_eq!(schedule.anchor_date(&utc()), None);
    }

    #[test]
    fn test_empty_schedule_has_no_anchor() {
        assert_eq!(Schedule::default().anchor_date(&utc()), None);
    }
}
