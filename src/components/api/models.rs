use crate::utils::schedule::{fix_schedule_time_formats, WeeklySchedule};
use crate::utils::time::{parse_time_range_with_date, TimeSlot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A reminder as stored by the remote API.
///
/// Decoding never fails: entries come from a loosely typed store, so ids may
/// arrive as `_id`, `id` or both, times as numbers and flags as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `YYYY-MM-DD`, or a full ISO timestamp whose date part is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Loosely formatted time or time range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scalar field as text; numbers keep their decimal form
fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<Value> for Reminder {
    fn from(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return Self::default();
        };

        // `_id` wins when both ids are present
        let object_id = text(fields.remove("_id")).filter(|id| !id.is_empty());
        let id = text(fields.remove("id")).filter(|id| !id.is_empty());

        Self {
            id: object_id.or(id).unwrap_or_default(),
            title: text(fields.remove("title")).unwrap_or_default(),
            description: text(fields.remove("description")),
            due_date: text(fields.remove("dueDate")),
            time: text(fields.remove("time")),
            completed: matches!(fields.remove("completed"), Some(Value::Bool(true))),
            extra: fields,
        }
    }
}

impl Reminder {
    /// The date part of `due_date`
    pub fn due_day(&self) -> Option<&str> {
        let due = self.due_date.as_deref()?;
        Some(due.get(..10).unwrap_or(due))
    }

    /// Start and end of the reminder, `None` when it cannot be scheduled
    pub fn time_slot(&self) -> Option<TimeSlot> {
        let day = self.due_day()?;
        parse_time_range_with_date(day, self.time.as_deref().unwrap_or_default())
    }
}

/// Fields sent when creating or updating a reminder
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// A PDF to upload, parse or generate a schedule from
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// A schedule returned by schedule generation, with task times repaired
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratedSchedule {
    pub schedule: WeeklySchedule,
    /// Everything else in the response
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GeneratedSchedule {
    /// Build from a raw response: either the week list itself or an object
    /// carrying it under `schedule`
    pub fn from_response(response: Value) -> Self {
        match response {
            Value::Array(_) => Self {
                schedule: fix_schedule_time_formats(&response),
                extra: Map::new(),
            },
            Value::Object(mut fields) => {
                let raw = fields.remove("schedule").unwrap_or(Value::Null);
                Self {
                    schedule: fix_schedule_time_formats(&raw),
                    extra: fields,
                }
            }
            _ => Self::default(),
        }
    }
}
