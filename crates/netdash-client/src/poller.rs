//! Poller: checks a job's status at a fixed interval until it is terminal.
//!
//! The loop sleeps first and checks second, so the first status request goes
//! out one interval after the call. Everything the loop waits on lives inside
//! the returned future: once it settles, nothing else is scheduled.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use netdash_core::config::{ClientConfig, TASK_ID_PLACEHOLDER};
use netdash_core::{TaskHandle, TaskStatus, TaskStatusResponse};

use crate::error::PollError;
use crate::transport::Transport;

/// How long and how often to poll one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay before every status check.
    pub interval: Duration,
    /// Upper bound for the whole poll, in-flight requests included.
    pub timeout: Option<Duration>,
    /// Status checks allowed before giving up. At least one is always made.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
            max_attempts: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Zero values in the config mean "no limit".
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.poll_interval_ms),
            timeout: (config.poll_timeout_ms > 0)
                .then(|| Duration::from_millis(config.poll_timeout_ms)),
            max_attempts: (config.max_poll_attempts > 0).then_some(config.max_poll_attempts),
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Substitute the task id into a status URL template, percent-encoded as a
/// single path segment.
pub fn status_url(template: &str, task_id: &TaskHandle) -> String {
    template.replace(TASK_ID_PLACEHOLDER, &urlencoding::encode(task_id.as_str()))
}

/// Poll `task_id` until the engine reports a terminal status.
///
/// Resolves with the job's result (`null` when it has none) on SUCCESS with
/// `success: true`. FAILURE, or SUCCESS with `success: false`, is
/// [`PollError::TaskFailed`] carrying whatever the engine reported. A failed
/// status request ends polling immediately.
pub async fn poll_task(
    transport: &dyn Transport,
    endpoint_template: &str,
    task_id: &TaskHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Value, PollError> {
    let url = status_url(endpoint_template, task_id);
    let polling = poll_loop(transport, &url, task_id, policy, cancel);

    match policy.timeout {
        Some(limit) => match tokio::time::timeout(limit, polling).await {
            Ok(settled) => settled,
            Err(_) => {
                tracing::warn!(task_id = %task_id, ?limit, "task polling timed out");
                Err(PollError::TimedOut(limit))
            }
        },
        None => polling.await,
    }
}

async fn poll_loop(
    transport: &dyn Transport,
    url: &str,
    task_id: &TaskHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Value, PollError> {
    let mut attempts: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = tokio::time::sleep(policy.interval) => {}
        }

        attempts += 1;
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            reply = transport.get(url, &[]) => reply,
        };
        let reply = reply.map_err(|e| {
            tracing::warn!(task_id = %task_id, attempts, error = %e, "task status check failed");
            PollError::Transport(e)
        })?;
        let status: TaskStatusResponse = serde_json::from_value(reply)?;

        match status.status {
            TaskStatus::Success if status.success => {
                tracing::debug!(task_id = %task_id, attempts, "task succeeded");
                return Ok(status.result.unwrap_or(Value::Null));
            }
            TaskStatus::Success | TaskStatus::Failure => {
                tracing::debug!(task_id = %task_id, attempts, status = ?status.status, "task failed");
                return Err(PollError::TaskFailed {
                    detail: failure_detail(status),
                });
            }
            _ => {
                tracing::trace!(task_id = %task_id, attempts, status = ?status.status, "task not finished");
            }
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            tracing::warn!(task_id = %task_id, attempts, "task still pending, giving up");
            return Err(PollError::AttemptsExhausted(attempts));
        }
    }
}

/// The engine's result body if it sent one, else its error text.
fn failure_detail(status: TaskStatusResponse) -> Option<Value> {
    status
        .result
        .filter(|v| !v.is_null())
        .or_else(|| status.error.map(Value::String))
}
