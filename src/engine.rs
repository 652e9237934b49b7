//! Follow-up filter engine.
//!
//! A pure function of a task list, a filter configuration and a reference
//! "now". Every active filter is ANDed; the output keeps input order and is
//! accompanied by per-status counts over the filtered subset.

use crate::buckets::{DateRange, DateWindow, WeekStart};
use crate::error::{FollowUpError, Result};
use crate::types::{
    CrmPriority, CrmStatus, CrmTask, FollowUpPriority, FollowUpStatus, FollowUpTask, TaskKind,
    TaskList, TaskRecord, Vocab, Vocabulary,
};
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use heck::ToLowerCamelCase;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Typed filter configuration for one task vocabulary.
///
/// Empty fields are inactive. `date_range` and `specific_date` are
/// independent conditions; when both are set a task must satisfy both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilters<P, S> {
    pub search_term: String,
    pub priority: Option<P>,
    pub status: Option<S>,
    pub date_range: Option<DateRange>,
    pub specific_date: Option<NaiveDate>,
}

impl<P, S> Default for TaskFilters<P, S> {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            priority: None,
            status: None,
            date_range: None,
            specific_date: None,
        }
    }
}

impl<P, S> TaskFilters<P, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_priority(mut self, priority: P) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: S) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_specific_date(mut self, date: NaiveDate) -> Self {
        self.specific_date = Some(date);
        self
    }

    /// True when no filter is active.
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && self.priority.is_none()
            && self.status.is_none()
            && matches!(self.date_range, None | Some(DateRange::All))
            && self.specific_date.is_none()
    }
}

pub type FollowUpFilters = TaskFilters<FollowUpPriority, FollowUpStatus>;
pub type CrmFilters = TaskFilters<CrmPriority, CrmStatus>;

/// Per-status tallies over a filtered list.
///
/// Statuses outside the vocabulary contribute to `total` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts<S> {
    total: usize,
    per_status: Vec<(S, usize)>,
}

impl<S: Vocabulary> StatusCounts<S> {
    pub fn tally<'a, I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = &'a Vocab<S>>,
    {
        let mut per_status: Vec<(S, usize)> = S::variants().iter().map(|s| (*s, 0)).collect();
        let mut total = 0;
        for status in statuses {
            total += 1;
            if let Some(known) = status.known()
                && let Some(slot) = per_status.iter_mut().find(|(s, _)| *s == known)
            {
                slot.1 += 1;
            }
        }
        Self { total, per_status }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn get(&self, status: S) -> usize {
        self.per_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (S, usize)> + '_ {
        self.per_status.iter().copied()
    }
}

impl<S: Vocabulary> Serialize for StatusCounts<S> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> std::result::Result<Se::Ok, Se::Error> {
        let mut map = serializer.serialize_map(Some(self.per_status.len() + 1))?;
        map.serialize_entry("total", &self.total)?;
        for (status, n) in &self.per_status {
            map.serialize_entry(&status.as_str().to_lower_camel_case(), n)?;
        }
        map.end()
    }
}

/// Result of one engine run, borrowing from the input slice.
#[derive(Debug, serde::Serialize)]
#[serde(bound(serialize = "T: serde::Serialize"))]
pub struct FilterOutcome<'a, T: TaskRecord> {
    pub filtered: Vec<&'a T>,
    pub counts: StatusCounts<T::Status>,
}

/// The filter engine. Holds only the week-boundary convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine {
    week_start: WeekStart,
}

impl FilterEngine {
    pub fn new(week_start: WeekStart) -> Self {
        Self { week_start }
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Filter `tasks` against `filters`, taking "today" from `now`.
    pub fn apply<'a, T: TaskRecord>(
        &self,
        tasks: &'a [T],
        filters: &TaskFilters<T::Priority, T::Status>,
        now: &DateTime<FixedOffset>,
    ) -> FilterOutcome<'a, T> {
        let today = now.date_naive();
        let predicate = Predicate {
            needle: filters.search_term.to_lowercase(),
            priority: filters.priority,
            status: filters.status,
            window: filters
                .date_range
                .and_then(|range| range.window(today, self.week_start)),
            specific_date: filters.specific_date,
            offset: *now.offset(),
        };

        let filtered: Vec<&T> = tasks.iter().filter(|t| predicate.matches(*t)).collect();
        let counts = StatusCounts::tally(filtered.iter().map(|t| t.status()));

        debug!(
            total = tasks.len(),
            matched = filtered.len(),
            today = %today,
            date_range = ?filters.date_range,
            "Applied task filters"
        );

        FilterOutcome { filtered, counts }
    }

    /// [`apply`](Self::apply) with the system clock as reference.
    pub fn apply_now<'a, T: TaskRecord>(
        &self,
        tasks: &'a [T],
        filters: &TaskFilters<T::Priority, T::Status>,
    ) -> FilterOutcome<'a, T> {
        self.apply(tasks, filters, &Local::now().fixed_offset())
    }

    /// Filter an untyped-vocabulary listing with a string-valued query.
    ///
    /// A priority or status label outside the listing's vocabulary can never
    /// match, so the outcome is empty. Use [`FilterQuery::check`] to reject
    /// such labels up front instead.
    pub fn apply_list<'a>(
        &self,
        list: &'a TaskList,
        query: &FilterQuery,
        now: &DateTime<FixedOffset>,
    ) -> ListOutcome<'a> {
        match list {
            TaskList::FollowUps(tasks) => {
                ListOutcome::FollowUps(self.apply_query(tasks, query, now))
            }
            TaskList::Crm(tasks) => ListOutcome::Crm(self.apply_query(tasks, query, now)),
        }
    }

    fn apply_query<'a, T: TaskRecord>(
        &self,
        tasks: &'a [T],
        query: &FilterQuery,
        now: &DateTime<FixedOffset>,
    ) -> FilterOutcome<'a, T> {
        match query.typed::<T::Priority, T::Status>() {
            Ok(filters) => self.apply(tasks, &filters, now),
            Err(err) => {
                debug!(
                    field = err.field.as_deref().unwrap_or_default(),
                    total = tasks.len(),
                    "Filter label outside the listing vocabulary; nothing matches"
                );
                FilterOutcome {
                    filtered: Vec::new(),
                    counts: StatusCounts::tally(std::iter::empty::<&Vocab<T::Status>>()),
                }
            }
        }
    }
}

struct Predicate<P, S> {
    needle: String,
    priority: Option<P>,
    status: Option<S>,
    window: Option<DateWindow>,
    specific_date: Option<NaiveDate>,
    offset: FixedOffset,
}

impl<P: Vocabulary, S: Vocabulary> Predicate<P, S> {
    fn matches<T: TaskRecord<Priority = P, Status = S>>(&self, task: &T) -> bool {
        if !self.needle.is_empty()
            && !task
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&self.needle))
        {
            return false;
        }
        if let Some(p) = self.priority
            && !task.priority().is(p)
        {
            return false;
        }
        if let Some(s) = self.status
            && !task.status().is(s)
        {
            return false;
        }
        if self.window.is_none() && self.specific_date.is_none() {
            return true;
        }

        let Some(anchor) = task.schedule().anchor_date(&self.offset) else {
            return false;
        };
        self.window.is_none_or(|w| w.contains(anchor))
            && self.specific_date.is_none_or(|d| d == anchor)
    }
}

/// String-valued filter state as a UI or CLI holds it, before the task
/// vocabulary is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search_term: String,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub date_range: Option<DateRange>,
    pub specific_date: Option<NaiveDate>,
}

impl FilterQuery {
    /// Fail when a priority or status label does not belong to `kind`'s
    /// vocabulary.
    pub fn check(&self, kind: TaskKind) -> Result<()> {
        match kind {
            TaskKind::Followup => self.typed::<FollowUpPriority, FollowUpStatus>().map(|_| ()),
            TaskKind::Crm => self.typed::<CrmPriority, CrmStatus>().map(|_| ()),
        }
    }

    /// Resolve priority and status labels against a vocabulary.
    pub fn typed<P: Vocabulary, S: Vocabulary>(&self) -> Result<TaskFilters<P, S>> {
        Ok(TaskFilters {
            search_term: self.search_term.clone(),
            priority: resolve_label::<P>(self.priority.as_deref())?,
            status: resolve_label::<S>(self.status.as_deref())?,
            date_range: self.date_range,
            specific_date: self.specific_date,
        })
    }
}

fn resolve_label<V: Vocabulary>(label: Option<&str>) -> Result<Option<V>> {
    match label.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => V::parse_loose(raw).map(Some).ok_or_else(|| {
            let allowed: Vec<&str> = V::variants().iter().map(|v| v.as_str()).collect();
            FollowUpError::invalid_value(
                V::FIELD,
                format!("'{}' is not a valid {} here", raw, V::FIELD),
            )
            .with_details(format!("expected one of: {}", allowed.join(", ")))
        }),
    }
}

/// Engine output for a [`TaskList`], tagged by vocabulary.
#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum ListOutcome<'a> {
    FollowUps(FilterOutcome<'a, FollowUpTask>),
    Crm(FilterOutcome<'a, CrmTask>),
}

impl ListOutcome<'_> {
    pub fn matched(&self) -> usize {
        match self {
            ListOutcome::FollowUps(o) => o.filtered.len(),
            ListOutcome::Crm(o) => o.filtered.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customer, OpaqueId, RawDate, Schedule};
    use serde_json::json;

    fn now(date: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("{}T09:00:00+00:00", date)).unwrap()
    }

    fn followup(id: i64, status: FollowUpStatus, task_date: Option<&str>) -> FollowUpTask {
        FollowUpTask {
            id: OpaqueId::Number(id),
            customer: Customer::default(),
            priority: Vocab::Known(FollowUpPriority::Warm),
            status: Vocab::Known(status),
            call_reason: None,
            notes: None,
            schedule: Schedule {
                task_date: task_date.map(|d| RawDate::Text(d.to_string())),
                ..Default::default()
            },
            assigned_agent_id: None,
        }
    }

    #[test]
    fn test_counts_serialize_camel_case() {
        let tasks = vec![
            followup(1, FollowUpStatus::InProgress, None),
            followup(2, FollowUpStatus::Failed, None),
        ];
        let out = FilterEngine::default().apply(&tasks, &FollowUpFilters::new(), &now("2024-01-10"));
        assert_eq!(
            serde_json::to_value(&out.counts).unwrap(),
            json!({"total": 2, "pending": 0, "inProgress": 1, "completed": 0, "failed": 1})
        );
    }

    #[test]
    fn test_unknown_status_counts_in_total_only() {
        let mut odd = followup(3, FollowUpStatus::Pending, None);
        odd.status = Vocab::Unknown("on_hold".into());
        let tasks = vec![odd, followup(4, FollowUpStatus::Pending, None)];
        let out = FilterEngine::default().apply(&tasks, &FollowUpFilters::new(), &now("2024-01-10"));
        assert_eq!(out.counts.total(), 2);
        assert_eq!(out.counts.get(FollowUpStatus::Pending), 1);
        let sum: usize = out.counts.iter().map(|(_, n)| n).sum();
        assert_eq!(sum, 1);
    }

    #[test]
    fn test_date_range_and_specific_date_are_anded() {
        let tasks = vec![
            followup(1, FollowUpStatus::Pending, Some("2024-01-10")),
            followup(2, FollowUpStatus::Pending, Some("2024-01-11")),
        ];
        let filters = FollowUpFilters::new()
            .with_date_range(DateRange::ThisWeek)
            .with_specific_date(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        let out = FilterEngine::default().apply(&tasks, &filters, &now("2024-01-10"));
        assert_eq!(out.filtered.len(), 1);
        assert_eq!(out.filtered[0].id, OpaqueId::Number(2));

        let disjoint = FollowUpFilters::new()
            .with_date_range(DateRange::Today)
            .with_specific_date(NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        let out = FilterEngine::default().apply(&tasks, &disjoint, &now("2024-01-10"));
        assert!(out.filtered.is_empty());
    }

    #[test]
    fn test_all_range_keeps_undated_tasks() {
        let tasks = vec![followup(1, FollowUpStatus::Pending, None)];
        let filters = FollowUpFilters::new().with_date_range(DateRange::All);
        assert!(filters.is_empty());
        let out = FilterEngine::default().apply(&tasks, &filters, &now("2024-01-10"));
        assert_eq!(out.filtered.len(), 1);
    }

    #[test]
    fn test_week_start_changes_boundary() {
        // Wednesday 2024-01-10: Sunday-start ends the 14th, Monday-start the 15th.
        let tasks = vec![followup(1, FollowUpStatus::Pending, Some("2024-01-15"))];
        let filters = FollowUpFilters::new().with_date_range(DateRange::ThisWeek);
        let sunday = FilterEngine::new(WeekStart::Sunday).apply(&tasks, &filters, &now("2024-01-10"));
        let monday = FilterEngine::new(WeekStart::Monday).apply(&tasks, &filters, &now("2024-01-10"));
        assert!(sunday.filtered.is_empty());
        assert_eq!(monday.filtered.len(), 1);
    }

    #[test]
    fn test_query_rejects_foreign_vocabulary() {
        let query = FilterQuery {
            priority: Some("hot".into()),
            ..Default::default()
        };
        let err = query.typed::<CrmPriority, CrmStatus>().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("priority"));

        let ok = query.typed::<FollowUpPriority, FollowUpStatus>().unwrap();
        assert_eq!(ok.priority, Some(FollowUpPriority::Hot));
    }

    #[test]
    fn test_foreign_label_yields_empty_outcome() {
        let list = TaskList::Crm(Vec::new());
        let query = FilterQuery {
            status: Some("failed".into()),
            ..Default::default()
        };
        assert!(query.check(TaskKind::Crm).is_err());
        assert!(query.check(TaskKind::Followup).is_ok());

        let out = FilterEngine::default().apply_list(&list, &query, &now("2024-01-10"));
        assert_eq!(out.matched(), 0);
    }

    #[test]
    fn test_query_blank_labels_are_inactive() {
        let query = FilterQuery {
            status: Some("  ".into()),
            ..Default::default()
        };
        let filters = query.typed::<CrmPriority, CrmStatus>().unwrap();
        assert!(filters.is_empty());
    }
}
