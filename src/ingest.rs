//! Ingestion boundary: loosely-typed JSON listings to typed tasks.
//!
//! Backend listing endpoints return arrays of records whose field names and
//! value shapes drift (camelCase vs snake_case, numeric vs string ids, nested
//! customer objects). Everything is normalized here so the filter engine only
//! ever sees [`FollowUpTask`] or [`CrmTask`].

use crate::error::{FollowUpError, Result};
use crate::types::{
    CrmTask, Customer, FollowUpTask, OpaqueId, RawDate, Schedule, TaskKind, TaskList, Vocab,
    Vocabulary, normalize_label,
};
use serde::{Deserialize, Serialize};
use heck::ToLowerCamelCase;
use serde_json::{Map, Value};
use std::io::Read;
use tracing::{debug, warn};

/// Envelope keys under which listing endpoints nest the record array.
const ENVELOPE_KEYS: &[&str] = &["data", "tasks", "items", "followups"];

/// Alternate spellings that are not plain snake_case of a record field.
const FIELD_ALIASES: &[(&str, &str)] = &[("_id", "id"), ("agentId", "assignedAgentId")];

/// How strictly vocabulary values are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Normalize labels; keep unrecognized values as [`Vocab::Unknown`].
    #[default]
    Lenient,
    /// Reject records with a missing or unrecognized priority/status.
    Strict,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRecord {
    id: Option<Value>,
    customer_id: Option<Value>,
    customer_name: Option<Value>,
    customer_phone: Option<Value>,
    customer_email: Option<Value>,
    customer: Option<Value>,
    priority: Option<Value>,
    status: Option<Value>,
    call_reason: Option<Value>,
    title: Option<Value>,
    notes: Option<Value>,
    description: Option<Value>,
    task_date: Option<Value>,
    scheduled_time: Option<Value>,
    due_date: Option<Value>,
    created_at: Option<Value>,
    assigned_agent_id: Option<Value>,
}

/// Converts listing documents into typed task lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ingestor {
    mode: IngestMode,
}

impl Ingestor {
    pub fn new(mode: IngestMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> IngestMode {
        self.mode
    }

    /// Read a listing document and ingest it as `kind`.
    pub fn read(&self, kind: TaskKind, reader: impl Read) -> Result<TaskList> {
        let doc: Value = serde_json::from_reader(reader)?;
        self.task_list(kind, doc)
    }

    pub fn task_list(&self, kind: TaskKind, doc: Value) -> Result<TaskList> {
        Ok(match kind {
            TaskKind::Followup => TaskList::FollowUps(self.followups(doc)?),
            TaskKind::Crm => TaskList::Crm(self.crm_tasks(doc)?),
        })
    }

    pub fn followups(&self, doc: Value) -> Result<Vec<FollowUpTask>> {
        let tasks = records(doc)?
            .into_iter()
            .enumerate()
            .map(|(index, value)| self.followup(index, value))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = tasks.len(), mode = ?self.mode, "Ingested follow-up tasks");
        Ok(tasks)
    }

    pub fn crm_tasks(&self, doc: Value) -> Result<Vec<CrmTask>> {
        let tasks = records(doc)?
            .into_iter()
            .enumerate()
            .map(|(index, value)| self.crm_task(index, value))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = tasks.len(), mode = ?self.mode, "Ingested CRM tasks");
        Ok(tasks)
    }

    fn followup(&self, index: usize, value: Value) -> Result<FollowUpTask> {
        let raw = raw_record(index, value)?;
        Ok(FollowUpTask {
            id: self.record_id(index, raw.id)?,
            customer: customer(
                raw.customer.as_ref(),
                raw.customer_id,
                raw.customer_name,
                raw.customer_phone,
                raw.customer_email,
            ),
            priority: self.vocab(index, raw.priority)?,
            status: self.vocab(index, raw.status)?,
            call_reason: text(raw.call_reason).or_else(|| text(raw.title)),
            notes: text(raw.notes).or_else(|| text(raw.description)),
            schedule: schedule(raw.task_date, raw.scheduled_time, raw.due_date, raw.created_at),
            assigned_agent_id: opaque_id(raw.assigned_agent_id),
        })
    }

    fn crm_task(&self, index: usize, value: Value) -> Result<CrmTask> {
        let raw = raw_record(index, value)?;
        Ok(CrmTask {
            id: self.record_id(index, raw.id)?,
            customer: customer(
                raw.customer.as_ref(),
                raw.customer_id,
                raw.customer_name,
                raw.customer_phone,
                raw.customer_email,
            ),
            priority: self.vocab(index, raw.priority)?,
            status: self.vocab(index, raw.status)?,
            title: text(raw.title).or_else(|| text(raw.call_reason)),
            description: text(raw.description).or_else(|| text(raw.notes)),
            schedule: schedule(raw.task_date, raw.scheduled_time, raw.due_date, raw.created_at),
            assigned_agent_id: opaque_id(raw.assigned_agent_id),
        })
    }

    fn record_id(&self, index: usize, value: Option<Value>) -> Result<OpaqueId> {
        match opaque_id(value) {
            Some(id) => Ok(id),
            None if self.mode == IngestMode::Strict => {
                Err(FollowUpError::missing_field("id").with_details(format!("record {}", index)))
            }
            None => {
                warn!(record = index, "Task record has no id; using its position");
                Ok(OpaqueId::Text(format!("#{}", index)))
            }
        }
    }

    fn vocab<V: Vocabulary>(&self, index: usize, value: Option<Value>) -> Result<Vocab<V>> {
        let Some(label) = text(value) else {
            return match self.mode {
                IngestMode::Strict => Err(FollowUpError::missing_field(V::FIELD)
                    .with_details(format!("record {}", index))),
                IngestMode::Lenient => Ok(Vocab::Unknown(String::new())),
            };
        };
        if let Some(known) = V::parse(&normalize_label(&label)) {
            return Ok(Vocab::Known(known));
        }
        match self.mode {
            IngestMode::Strict => Err(FollowUpError::invalid_value(
                V::FIELD,
                format!("unrecognized {} '{}'", V::FIELD, label),
            )
            .with_details(format!("record {}", index))),
            IngestMode::Lenient => {
                warn!(record = index, field = V::FIELD, value = %label, "Keeping unrecognized value");
                Ok(Vocab::Unknown(label))
            }
        }
    }
}

/// Unwrap a listing document to its record array.
fn records(doc: Value) -> Result<Vec<Value>> {
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return Ok(items),
                    // Paginated responses nest once more: { data: { data: [...] } }
                    Some(inner @ Value::Object(_)) => return records(inner),
                    _ => {}
                }
            }
            Err(FollowUpError::invalid_document(format!(
                "expected an array of tasks or an object with one of: {}",
                ENVELOPE_KEYS.join(", ")
            )))
        }
        other => Err(FollowUpError::invalid_document(format!(
            "expected an array of tasks, got {}",
            json_kind(&other)
        ))),
    }
}

fn raw_record(index: usize, value: Value) -> Result<RawRecord> {
    if !value.is_object() {
        return Err(FollowUpError::invalid_document(format!(
            "record {} is {}, expected an object",
            index,
            json_kind(&value)
        )));
    }
    Ok(serde_json::from_value(canonical_keys(value))?)
}

/// Rewrite record keys to their camelCase spelling. When a record carries
/// both spellings of a field, the camelCase one wins unless it is null.
fn canonical_keys(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let (canonical, variant): (Vec<_>, Vec<_>) = map
        .into_iter()
        .partition(|(key, _)| canonical_key(key) == *key);

    let mut out: Map<String, Value> = canonical.into_iter().collect();
    for (key, value) in variant {
        let name = canonical_key(&key);
        match out.get(&name) {
            Some(existing) if !existing.is_null() => {
                debug!(field = %name, alias = %key, "Ignoring duplicate field spelling");
            }
            _ => {
                out.insert(name, value);
            }
        }
    }
    Value::Object(out)
}

fn canonical_key(key: &str) -> String {
    FIELD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| key.to_lower_camel_case())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Non-blank text; numbers are rendered so phone numbers survive.
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opaque_id(value: Option<Value>) -> Option<OpaqueId> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(OpaqueId::Text(s.trim().to_string())),
        Value::Number(n) => n.as_i64().map(OpaqueId::Number),
        _ => None,
    }
}

/// Any non-null, non-blank value counts as populated; shapes other than a
/// string or integer are kept as text so they fail to parse later.
fn raw_date(value: Option<Value>) -> Option<RawDate> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(RawDate::Text(s)),
        Value::Number(n) => Some(match n.as_i64() {
            Some(ms) => RawDate::EpochMillis(ms),
            None => RawDate::Text(n.to_string()),
        }),
        other => Some(RawDate::Text(other.to_string())),
    }
}

fn schedule(
    task_date: Option<Value>,
    scheduled_time: Option<Value>,
    due_date: Option<Value>,
    created_at: Option<Value>,
) -> Schedule {
    Schedule {
        task_date: raw_date(task_date),
        scheduled_time: raw_date(scheduled_time),
        due_date: raw_date(due_date),
        created_at: raw_date(created_at),
    }
}

/// Flat `customer*` fields win over a nested `customer` object.
fn customer(
    nested: Option<&Value>,
    id: Option<Value>,
    name: Option<Value>,
    phone: Option<Value>,
    email: Option<Value>,
) -> Customer {
    let from_nested = |key: &str| nested.and_then(|c| c.get(key)).cloned();
    Customer {
        id: opaque_id(id).or_else(|| opaque_id(from_nested("id"))),
        name: text(name).or_else(|| text(from_nested("name"))),
        phone: text(phone).or_else(|| text(from_nested("phone"))),
        email: text(email).or_else(|| text(from_nested("email"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{CrmPriority, FollowUpPriority, FollowUpStatus};
    use serde_json::json;

    #[test]
    fn test_bare_array_and_envelopes() {
        let ingestor = Ingestor::default();
        let record = json!({"id": 1, "status": "pending", "priority": "hot"});
        for doc in [
            json!([record.clone()]),
            json!({"data": [record.clone()]}),
            json!({"followups": [record.clone()]}),
            json!({"data": {"data": [record.clone()], "total": 1}}),
        ] {
            assert_eq!(ingestor.followups(doc).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_rejects_non_listing_documents() {
        let ingestor = Ingestor::default();
        let err = ingestor.followups(json!({"message": "ok"})).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDocument);
        let err = ingestor.followups(json!([1, 2])).unwrap_err();
        assert!(err.message.contains("record 0"));
    }

    #[test]
    fn test_snake_and_camel_case_fields() {
        let tasks = Ingestor::default()
            .followups(json!([
                {"id": "a", "customer_name": "Alice", "task_date": "2024-01-10", "status": "pending", "priority": "warm"},
                {"id": "b", "customerName": "Bob", "taskDate": "2024-01-11", "status": "pending", "priority": "warm"}
            ]))
            .unwrap();
        assert_eq!(tasks[0].customer.name.as_deref(), Some("Alice"));
        assert_eq!(tasks[1].customer.name.as_deref(), Some("Bob"));
        assert_eq!(tasks[0].schedule.task_date, Some(RawDate::Text("2024-01-10".into())));
    }

    #[test]
    fn test_both_spellings_of_a_field() {
        let tasks = Ingestor::default()
            .followups(json!([
                {"id": "a", "customerName": "Alice", "customer_name": "Alicia", "status": "pending"},
                {"id": "b", "taskDate": null, "task_date": "2024-01-11", "_id": "ignored"},
                {"_id": "c", "agentId": 4, "assigned_agent_id": 5}
            ]))
            .unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].customer.name.as_deref(), Some("Alice"));
        assert_eq!(tasks[1].id, OpaqueId::Text("b".into()));
        assert_eq!(tasks[1].schedule.task_date, Some(RawDate::Text("2024-01-11".into())));
        assert_eq!(tasks[2].id, OpaqueId::Text("c".into()));
        assert!(tasks[2].assigned_agent_id.is_some());
    }

    #[test]
    fn test_nested_customer_object() {
        let tasks = Ingestor::default()
            .followups(json!([{
                "id": 7,
                "customer": {"id": "C-9", "name": "Nested Name", "phone": 1711000000},
                "status": "pending",
                "priority": "cold"
            }]))
            .unwrap();
        let customer = &tasks[0].customer;
        assert_eq!(customer.id, Some(OpaqueId::Text("C-9".into())));
        assert_eq!(customer.name.as_deref(), Some("Nested Name"));
        assert_eq!(customer.phone.as_deref(), Some("1711000000"));
    }

    #[test]
    fn test_lenient_normalizes_and_keeps_unknown() {
        let tasks = Ingestor::new(IngestMode::Lenient)
            .followups(json!([
                {"id": 1, "status": "In Progress", "priority": "HOT"},
                {"id": 2, "status": "archived", "priority": "urgent"},
                {"id": 3}
            ]))
            .unwrap();
        assert!(tasks[0].status.is(FollowUpStatus::InProgress));
        assert!(tasks[0].priority.is(FollowUpPriority::Hot));
        assert_eq!(tasks[1].status, Vocab::Unknown("archived".into()));
        // "urgent" belongs to the CRM vocabulary, not follow-ups.
        assert_eq!(tasks[1].priority, Vocab::Unknown("urgent".into()));
        assert_eq!(tasks[2].status, Vocab::Unknown(String::new()));
    }

    #[test]
    fn test_strict_rejects_unknown_and_missing() {
        let strict = Ingestor::new(IngestMode::Strict);
        let err = strict
            .crm_tasks(json!([{"id": 1, "status": "pending", "priority": "hot"}]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldValue);
        assert_eq!(err.field.as_deref(), Some("priority"));

        let err = strict
            .crm_tasks(json!([{"id": 1, "priority": "low"}]))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingRequiredField);

        let err = strict
            .crm_tasks(json!([{"status": "pending", "priority": "low"}]))
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("id"));

        let ok = strict
            .crm_tasks(json!([{"id": 1, "status": "cancelled", "priority": "Urgent"}]))
            .unwrap();
        assert!(ok[0].priority.is(CrmPriority::Urgent));
    }

    #[test]
    fn test_date_shapes() {
        let tasks = Ingestor::default()
            .crm_tasks(json!([
                {"id": 1, "dueDate": "  ", "createdAt": 1704844800000i64, "status": "pending", "priority": "low"},
                {"id": 2, "taskDate": null, "dueDate": {"weird": true}, "status": "pending", "priority": "low"}
            ]))
            .unwrap();
        assert_eq!(tasks[0].schedule.due_date, None);
        assert_eq!(tasks[0].schedule.created_at, Some(RawDate::EpochMillis(1_704_844_800_000)));
        assert_eq!(tasks[1].schedule.task_date, None);
        assert!(matches!(tasks[1].schedule.due_date, Some(RawDate::Text(_))));
    }

    #[test]
    fn test_missing_id_uses_position_when_lenient() {
        let tasks = Ingestor::default()
            .followups(json!([{"status": "pending"}, {"status": "pending"}]))
            .unwrap();
        assert_eq!(tasks[1].id, OpaqueId::Text("#1".into()));
    }
}
