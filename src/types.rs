//! Core types for follow-up and CRM task lists.
//!
//! Two task vocabularies exist side by side: telephony follow-ups rank by
//! temperature (`hot`/`warm`/`cold`) and may `fail`, while CRM tasks rank by
//! urgency and may be `cancelled`. They are kept as separate types that share
//! the [`TaskRecord`] capability so the filter engine never mixes them.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A closed set of string labels for a task field.
pub trait Vocabulary: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Name of the task field this vocabulary describes.
    const FIELD: &'static str;

    /// All labels, in display order.
    fn variants() -> &'static [Self];

    /// Wire label, e.g. `in_progress`.
    fn as_str(&self) -> &'static str;

    /// Exact match against the wire label.
    fn parse(s: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.as_str() == s)
    }

    /// Match after normalizing case, whitespace and separators.
    fn parse_loose(s: &str) -> Option<Self> {
        Self::parse(&normalize_label(s))
    }
}

/// Normalize a free-form label: trim, lowercase, `-` and spaces become `_`.
pub fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl Vocabulary for $name {
            const FIELD: &'static str = $field;

            fn variants() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as Vocabulary>::parse_loose(s).ok_or_else(|| {
                    let allowed: Vec<&str> = <$name as Vocabulary>::variants()
                        .iter()
                        .map(|v| v.as_str())
                        .collect();
                    format!("invalid {} '{}' (expected one of: {})", $field, s, allowed.join(", "))
                })
            }
        }
    };
}

vocabulary! {
    /// Temperature-based priority used by telephony follow-ups.
    FollowUpPriority, "priority" {
        Hot => "hot",
        Warm => "warm",
        Cold => "cold",
    }
}

vocabulary! {
    /// Lifecycle of a telephony follow-up.
    FollowUpStatus, "status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
    }
}

vocabulary! {
    /// Urgency-based priority used by general CRM tasks.
    CrmPriority, "priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

vocabulary! {
    /// Lifecycle of a CRM task.
    CrmStatus, "status" {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// A vocabulary value as received: either recognized or kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vocab<T> {
    Known(T),
    Unknown(String),
}

impl<T: Vocabulary> Vocab<T> {
    pub fn known(&self) -> Option<T> {
        match self {
            Vocab::Known(v) => Some(*v),
            Vocab::Unknown(_) => None,
        }
    }

    pub fn is(&self, value: T) -> bool {
        self.known() == Some(value)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Vocab::Known(v) => v.as_str(),
            Vocab::Unknown(raw) => raw,
        }
    }
}

impl<T: Vocabulary> Serialize for Vocab<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<T: Vocabulary> fmt::Display for Vocab<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque identifier as the backend sends it (string or integer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpaqueId {
    Text(String),
    Number(i64),
}

impl OpaqueId {
    /// The identifier when it is textual; numeric ids are not searchable.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OpaqueId::Text(s) => Some(s),
            OpaqueId::Number(_) => None,
        }
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpaqueId::Text(s) => f.write_str(s),
            OpaqueId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A date or timestamp field before parsing.
///
/// Parsing is deferred to anchor resolution so a malformed value degrades to
/// "no anchor" instead of rejecting the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawDate {
    Text(String),
    EpochMillis(i64),
}

/// The temporal fields of a task. Only populated fields are `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_date: Option<RawDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<RawDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<RawDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<RawDate>,
}

/// Contact fields shared by both task kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "customerId", skip_serializing_if = "Option::is_none")]
    pub id: Option<OpaqueId>,
    #[serde(rename = "customerName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "customerPhone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "customerEmail", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A telephony follow-up (scheduled call back to a customer).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTask {
    pub id: OpaqueId,
    #[serde(flatten)]
    pub customer: Customer,
    pub priority: Vocab<FollowUpPriority>,
    pub status: Vocab<FollowUpStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<OpaqueId>,
}

/// A general CRM task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmTask {
    pub id: OpaqueId,
    #[serde(flatten)]
    pub customer: Customer,
    pub priority: Vocab<CrmPriority>,
    pub status: Vocab<CrmStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub schedule: Schedule,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<OpaqueId>,
}

/// Capability shared by every task kind the engine can filter:
/// a priority and status from a closed vocabulary, a schedule to resolve an
/// anchor date from, and the free-text fields search looks at.
pub trait TaskRecord {
    type Priority: Vocabulary;
    type Status: Vocabulary;

    fn id(&self) -> &OpaqueId;
    fn priority(&self) -> &Vocab<Self::Priority>;
    fn status(&self) -> &Vocab<Self::Status>;
    fn schedule(&self) -> &Schedule;
    fn customer(&self) -> &Customer;

    /// Short human label (call reason or title).
    fn headline(&self) -> Option<&str>;

    /// Fields matched by the search term.
    fn search_fields(&self) -> Vec<&str>;
}

fn customer_search_fields(customer: &Customer) -> impl Iterator<Item = &str> {
    [
        customer.name.as_deref(),
        customer.phone.as_deref(),
        customer.id.as_ref().and_then(OpaqueId::as_text),
    ]
    .into_iter()
    .flatten()
}

impl TaskRecord for FollowUpTask {
    type Priority = FollowUpPriority;
    type Status = FollowUpStatus;

    fn id(&self) -> &OpaqueId {
        &self.id
    }

    fn priority(&self) -> &Vocab<FollowUpPriority> {
        &self.priority
    }

    fn status(&self) -> &Vocab<FollowUpStatus> {
        &self.status
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn customer(&self) -> &Customer {
        &self.customer
    }

    fn headline(&self) -> Option<&str> {
        self.call_reason.as_deref()
    }

    fn search_fields(&self) -> Vec<&str> {
        customer_search_fields(&self.customer)
            .chain(self.call_reason.as_deref())
            .chain(self.notes.as_deref())
            .collect()
    }
}

impl TaskRecord for CrmTask {
    type Priority = CrmPriority;
    type Status = CrmStatus;

    fn id(&self) -> &OpaqueId {
        &self.id
    }

    fn priority(&self) -> &Vocab<CrmPriority> {
        &self.priority
    }

    fn status(&self) -> &Vocab<CrmStatus> {
        &self.status
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn customer(&self) -> &Customer {
        &self.customer
    }

    fn headline(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn search_fields(&self) -> Vec<&str> {
        customer_search_fields(&self.customer)
            .chain(self.title.as_deref())
            .chain(self.description.as_deref())
            .collect()
    }
}

/// Which vocabulary a task listing uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    #[default]
    #[serde(alias = "follow_up", alias = "followups")]
    Followup,
    Crm,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Followup => "followup",
            TaskKind::Crm => "crm",
        }
    }
}

/// A typed task listing; the discriminant fixes the vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskList {
    FollowUps(Vec<FollowUpTask>),
    Crm(Vec<CrmTask>),
}

impl TaskList {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskList::FollowUps(_) => TaskKind::Followup,
            TaskList::Crm(_) => TaskKind::Crm,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TaskList::FollowUps(tasks) => tasks.len(),
            TaskList::Crm(tasks) => tasks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
