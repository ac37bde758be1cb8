//! Batch orchestrator: creates and polls a list of tasks.
//!
//! Per-item isolation is the contract: every descriptor gets exactly one
//! outcome, in input order, and a failing item never fails the batch. The two
//! batch calls therefore return a plain `Vec`, not a `Result`.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use netdash_core::config::ClientConfig;
use netdash_core::{AnnotatedTask, TaskDescriptor, TaskHandle, TaskOutcome};

use crate::error::{PollError, TransportError};
use crate::factory;
use crate::poller::{self, PollPolicy};
use crate::transport::{HttpTransport, Transport};

/// Outcome error for a descriptor whose job was never created.
pub const TASK_CREATION_FAILED: &str = "Task creation failed";

/// Outcome error for a descriptor reached after the runner was cancelled.
pub const TASK_CANCELLED: &str = "Task cancelled before creation";

/// Where jobs are created and polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEndpoints {
    pub create_url: String,
    /// Status URL containing `{task_id}`.
    pub status_url_template: String,
}

impl TaskEndpoints {
    pub fn new(create_url: impl Into<String>, status_url_template: impl Into<String>) -> Self {
        Self {
            create_url: create_url.into(),
            status_url_template: status_url_template.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.create_url(), config.status_url_template())
    }
}

#[derive(Clone)]
pub struct TaskRunner {
    transport: Arc<dyn Transport>,
    endpoints: TaskEndpoints,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl TaskRunner {
    pub fn new(transport: Arc<dyn Transport>, endpoints: TaskEndpoints, policy: PollPolicy) -> Self {
        Self {
            transport,
            endpoints,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// HTTP runner for the engine named in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let timeout =
            (config.request_timeout_ms > 0).then(|| Duration::from_millis(config.request_timeout_ms));
        let transport = HttpTransport::new(timeout)?;
        Ok(Self::new(
            Arc::new(transport),
            TaskEndpoints::from_config(config),
            PollPolicy::from_config(config),
        ))
    }

    /// Use `cancel` to stop in-flight polls. Cancelled polls settle as
    /// failed outcomes; nothing already created on the engine is undone.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn endpoints(&self) -> &TaskEndpoints {
        &self.endpoints
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub async fn create_task(&self, task_type: &str, data: &Value) -> Option<TaskHandle> {
        factory::create_task(
            self.transport.as_ref(),
            &self.endpoints.create_url,
            task_type,
            data,
        )
        .await
    }

    pub async fn poll_task(&self, task_id: &TaskHandle) -> Result<Value, PollError> {
        poller::poll_task(
            self.transport.as_ref(),
            &self.endpoints.status_url_template,
            task_id,
            &self.policy,
            &self.cancel,
        )
        .await
    }

    /// Create, poll and annotate one descriptor. Never fails.
    ///
    /// Once the runner is cancelled no further jobs are created.
    pub async fn run_task(&self, task: &TaskDescriptor) -> AnnotatedTask {
        if self.cancel.is_cancelled() {
            tracing::debug!(task_type = %task.task_type, "runner cancelled, task not created");
            return AnnotatedTask::new(task, TaskOutcome::failure(TASK_CANCELLED));
        }

        let outcome = match self.create_task(&task.task_type, &task.params).await {
            None => TaskOutcome::failure(TASK_CREATION_FAILED),
            Some(handle) => match self.poll_task(&handle).await {
                Ok(result) => TaskOutcome::from_result(result),
                Err(e) => TaskOutcome::failure_with_detail(e.to_string(), e.detail()),
            },
        };
        AnnotatedTask::new(task, outcome)
    }

    /// One task at a time, in input order. Item N+1 is not created until item
    /// N has its outcome.
    pub async fn run_tasks_seq(&self, tasks: &[TaskDescriptor]) -> Vec<AnnotatedTask> {
        tracing::info!(tasks = tasks.len(), "running task batch sequentially");
        let mut annotated = Vec::with_capacity(tasks.len());
        for task in tasks {
            annotated.push(self.run_task(task).await);
        }
        log_summary(&annotated);
        annotated
    }

    /// All tasks at once. Waits for every item; results come back in input
    /// order regardless of completion order.
    pub async fn run_tasks(&self, tasks: &[TaskDescriptor]) -> Vec<AnnotatedTask> {
        tracing::info!(tasks = tasks.len(), "running task batch in parallel");
        let annotated = join_all(tasks.iter().map(|task| self.run_task(task))).await;
        log_summary(&annotated);
        annotated
    }
}

fn log_summary(annotated: &[AnnotatedTask]) {
    let succeeded = annotated.iter().filter(|t| t.result.success).count();
    tracing::info!(
        succeeded,
        failed = annotated.len() - succeeded,
        "task batch finished"
    );
}
