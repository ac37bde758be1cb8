//! Task wire types shared by the job engine and the orchestrator.
//!
//! The engine speaks two JSON bodies: a creation request `{type, data}` answered
//! with `{task_id}`, and a status body polled by task id. Everything the
//! orchestrator hands back to its caller is an [`AnnotatedTask`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Caller-facing types ───────────────────────────────────────────────────────

/// What job to run and with what input.
///
/// Fields other than `type` and `params` are carried through untouched so the
/// annotated copy handed back to the caller keeps its labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(default)]
    pub params: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDescriptor {
    pub fn new(task_type: impl Into<String>, params: Value) -> Self {
        Self {
            task_type: task_type.into(),
            params,
            extra: Map::new(),
        }
    }

    /// Attach an extra caller field (label, device name, ...).
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Uniform success/result/error record attached to every processed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Backend payload kept alongside a failure (failed result body, error text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl TaskOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            detail: None,
        }
    }

    pub fn failure_with_detail(error: impl Into<String>, detail: Option<Value>) -> Self {
        Self {
            detail,
            ..Self::failure(error)
        }
    }

    /// Build an outcome from a finished job's result payload.
    ///
    /// Job results are themselves outcome-shaped (`{"success": .., "error": ..}`),
    /// so `success` and `error` are lifted from the payload when present.
    /// A payload without a boolean `success` counts as a success.
    pub fn from_result(value: Value) -> Self {
        let success = value
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            success,
            result: (!value.is_null()).then_some(value),
            error,
            detail: None,
        }
    }
}

/// A copy of the caller's descriptor plus its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedTask {
    #[serde(flatten)]
    pub task: TaskDescriptor,
    pub result: TaskOutcome,
}

impl AnnotatedTask {
    pub fn new(task: &TaskDescriptor, outcome: TaskOutcome) -> Self {
        let mut task = task.clone();
        // `result` is ours; a caller field with that name would serialize twice.
        task.extra.remove("result");
        Self {
            task,
            result: outcome,
        }
    }
}

// ── Engine wire types ─────────────────────────────────────────────────────────

/// Opaque identifier returned by the engine on job creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a job as reported by the engine.
///
/// Only `Success` and `Failure` are terminal. Statuses this client does not
/// know decode to `Other` and keep the poller waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
    #[serde(other)]
    Other,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Started => "STARTED",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failure => "FAILURE",
            TaskStatus::Other => "UNKNOWN",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// POST body for job creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    pub data: Value,
}

/// Job creation reply. `task_id` is absent when the engine refused the job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// Status body returned for a polled job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
