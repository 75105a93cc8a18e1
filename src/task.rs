//! Task records and the normalizer.
//!
//! Stored tasks come in several historical shapes (`name` instead of
//! `title`, a `completed` flag or a `progress` percentage instead of
//! `status`, `id` instead of `_id`). `normalize` maps all of them onto one
//! canonical record and keeps every other field untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::{self, keys, KvStore};

pub const UNTITLED: &str = "Untitled";

/// Progress value at or above which a task counts as complete
pub const COMPLETE_PROGRESS: f64 = 100.0;

const CANONICAL_FIELDS: [&str; 4] = ["_id", "title", "description", "status"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Complete,
    Incomplete,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Complete => "complete",
            TaskStatus::Incomplete => "incomplete",
        }
    }

    fn from_progress(progress: f64) -> Self {
        if progress >= COMPLETE_PROGRESS {
            TaskStatus::Complete
        } else {
            TaskStatus::Incomplete
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "complete" => Ok(TaskStatus::Complete),
            "incomplete" => Ok(TaskStatus::Incomplete),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status '{}': must be complete or incomplete",
                s
            ))),
        }
    }
}

/// A normalized task.
///
/// Serializes back to the stored shape: the canonical fields plus every
/// passthrough field in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Progress as a number; numeric strings such as `"80"` are accepted
    pub fn progress(&self) -> Option<f64> {
        match self.extra.get("progress")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<&str> {
        self.extra.get("deadline").and_then(Value::as_str)
    }

    pub fn priority(&self) -> Option<&str> {
        self.extra.get("priority").and_then(Value::as_str)
    }
}

/// Normalize a stored task list.
///
/// Anything other than a JSON array is treated as an empty list.
pub fn normalize(raw: &Value) -> Vec<Task> {
    match raw {
        Value::Array(records) => records.iter().map(normalize_record).collect(),
        Value::Null => Vec::new(),
        other => {
            warn!(kind = json_kind(other), "task list is not an array; treating as empty");
            Vec::new()
        }
    }
}

/// Normalize one stored record. Non-object records take all defaults.
pub fn normalize_record(raw: &Value) -> Task {
    let empty = Map::new();
    let fields = match raw {
        Value::Object(fields) => fields,
        other => {
            debug!(kind = json_kind(other), "task record is not an object");
            &empty
        }
    };

    let id = first_present(fields, &["_id", "id"], true)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let title = first_present(fields, &["title", "name"], false)
        .unwrap_or_else(|| UNTITLED.to_string());
    let description = first_present(fields, &["description"], false).unwrap_or_default();
    let status = resolve_status(fields);

    let extra = fields
        .iter()
        .filter(|(key, _)| !CANONICAL_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Task {
        id,
        title,
        description,
        status,
        extra,
    }
}

/// First field in `chain` that is present and not null, rendered as text.
/// With `skip_falsy`, `false`, `0` and `""` are passed over as well.
fn first_present(fields: &Map<String, Value>, chain: &[&str], skip_falsy: bool) -> Option<String> {
    chain.iter().find_map(|key| {
        let value = fields.get(*key)?;
        if value.is_null() || (skip_falsy && !is_truthy(value)) {
            return None;
        }
        Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    })
}

fn resolve_status(fields: &Map<String, Value>) -> TaskStatus {
    if let Some(value) = fields.get("status").filter(|value| is_truthy(value)) {
        match value.as_str().map(str::parse::<TaskStatus>) {
            Some(Ok(status)) => return status,
            _ => debug!(status = %value, "unrecognized task status; deriving from other fields"),
        }
    }

    if let Some(completed) = fields.get("completed").and_then(Value::as_bool) {
        return if completed {
            TaskStatus::Complete
        } else {
            TaskStatus::Incomplete
        };
    }

    if let Some(progress) = fields.get("progress").and_then(Value::as_f64) {
        return TaskStatus::from_progress(progress);
    }

    TaskStatus::Incomplete
}

/// JSON value that a loosely typed client would treat as true
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Load and normalize the task list from the store.
pub fn load_tasks<S: KvStore + ?Sized>(store: &S) -> Vec<Task> {
    let raw: Value = storage::read_json_or(store, keys::TASKS, || Value::Null);
    normalize(&raw)
}

/// Persist a task list in canonical shape.
pub fn save_tasks<S: KvStore + ?Sized>(store: &S, tasks: &[Task]) -> Result<()> {
    storage::write_json(store, keys::TASKS, tasks)
}

/// Fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<String>,
    pub progress: Option<f64>,
    pub deadline: Option<String>,
}

/// Append a task to the stored list and return it.
///
/// Status defaults from progress the same way the normalizer derives it.
pub fn add_task<S: KvStore + ?Sized>(store: &S, new: NewTask) -> Result<Task> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }
    if let Some(progress) = new.progress {
        if !(0.0..=100.0).contains(&progress) {
            return Err(Error::InvalidArgument(format!(
                "progress must be between 0 and 100, got {progress}"
            )));
        }
    }
    if let Some(deadline) = new.deadline.as_deref() {
        chrono::NaiveDate::parse_from_str(deadline, "%Y-%m-%d").map_err(|_| {
            Error::InvalidArgument(format!("deadline must be YYYY-MM-DD, got '{deadline}'"))
        })?;
    }

    let mut extra = Map::new();
    if let Some(priority) = new.priority {
        extra.insert("priority".to_string(), Value::String(priority));
    }
    if let Some(progress) = new.progress {
        extra.insert("progress".to_string(), serde_json::json!(progress));
    }
    if let Some(deadline) = new.deadline {
        extra.insert("deadline".to_string(), Value::String(deadline));
    }

    let status = new.status.unwrap_or_else(|| {
        new.progress
            .map(TaskStatus::from_progress)
            .unwrap_or(TaskStatus::Incomplete)
    });

    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        description: new.description.unwrap_or_default(),
        status,
        extra,
    };

    let mut tasks = load_tasks(store);
    tasks.push(task.clone());
    save_tasks(store, &tasks)?;
    debug!(id = %task.id, "task added");
    Ok(task)
}
