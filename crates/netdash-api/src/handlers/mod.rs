//! HTTP API handlers: exposes the job engine as JSON.

pub mod tasks;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use netdash_services::{TaskQueue, TaskStore};

#[derive(Clone)]
pub struct ApiState {
    pub store: TaskStore,
    /// Executor queue; accepted task ids are pushed here.
    pub queue: TaskQueue,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
}

// Re-export handler functions for use in router setup.
pub use tasks::{handle_create_task, handle_get_task, handle_list_tasks};
