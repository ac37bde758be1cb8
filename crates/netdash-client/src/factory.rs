//! Task handle factory: asks the engine to create one job.

use serde_json::Value;

use netdash_core::{CreateTaskRequest, CreateTaskResponse, TaskHandle};

use crate::transport::Transport;

/// POST `{type, data}` to `endpoint` and return the engine's task id.
///
/// Every way of not getting an id (request error, undecodable reply, missing
/// or empty `task_id`) folds into `None`; callers treat it as "task creation
/// failed". Exactly one request is made.
pub async fn create_task(
    transport: &dyn Transport,
    endpoint: &str,
    task_type: &str,
    data: &Value,
) -> Option<TaskHandle> {
    let request = CreateTaskRequest {
        task_type: task_type.to_string(),
        data: data.clone(),
    };
    let body = match serde_json::to_value(&request) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(task_type, error = %e, "task creation failed: unencodable request");
            return None;
        }
    };

    let reply = match transport.post(endpoint, &[], &body).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(task_type, error = %e, "task creation failed");
            return None;
        }
    };

    let created: CreateTaskResponse = match serde_json::from_value(reply) {
        Ok(created) => created,
        Err(e) => {
            tracing::warn!(task_type, error = %e, "task creation failed: unexpected reply");
            return None;
        }
    };

    match created.task_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            tracing::debug!(task_type, task_id = %id, "task created");
            Some(TaskHandle::from(id))
        }
        None => {
            tracing::warn!(task_type, "task creation failed: reply carried no task_id");
            None
        }
    }
}
