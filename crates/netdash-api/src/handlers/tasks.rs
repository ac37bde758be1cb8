//! /tasks handlers: job creation and status.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use netdash_core::{CreateTaskResponse, TaskStatus, TaskStatusResponse};
use netdash_services::{JobKind, StoredTask};

use super::{api_error, ApiError, ApiState};

// ── /tasks/ (POST) ────────────────────────────────────────────────────────────

/// Lenient creation body so missing fields get a JSON error, not a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskPayload {
    #[serde(rename = "type")]
    pub task_type: Option<String>,
    pub data: Option<Value>,
}

pub async fn handle_create_task(
    State(state): State<ApiState>,
    Json(req): Json<CreateTaskPayload>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiError> {
    let (Some(task_type), Some(data)) = (req.task_type, req.data) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing task type or data",
        ));
    };

    let Some(kind) = JobKind::parse(&task_type) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("Unknown task type: {}", task_type),
        ));
    };

    let task_id = state.store.submit(kind.as_str(), data);

    if state.queue.send(task_id.clone()).is_err() {
        state.store.fail(&task_id, "task executor unavailable");
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "task executor unavailable",
        ));
    }

    tracing::info!(
        task_id = &task_id[..16.min(task_id.len())],
        task_type = kind.as_str(),
        "task submitted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateTaskResponse {
            task_id: Some(task_id),
        }),
    ))
}

// ── /tasks/{task_id} (GET) ────────────────────────────────────────────────────

pub async fn handle_get_task(
    State(state): State<ApiState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    state
        .store
        .get_task(&task_id)
        .map(|t| Json(task_to_status(t)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown task: {}", task_id)))
}

// ── /tasks (GET) ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskStatusResponse>,
}

pub async fn handle_list_tasks(State(state): State<ApiState>) -> Json<TaskListResponse> {
    let tasks = state
        .store
        .all_tasks()
        .into_iter()
        .map(task_to_status)
        .collect();

    Json(TaskListResponse { tasks })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn task_to_status(t: StoredTask) -> TaskStatusResponse {
    let succeeded = t.status == TaskStatus::Success;
    TaskStatusResponse {
        ready: t.is_ready(),
        task_id: Some(t.task_id),
        status: t.status,
        success: succeeded,
        result: if succeeded { t.result } else { None },
        error: t.error,
    }
}
