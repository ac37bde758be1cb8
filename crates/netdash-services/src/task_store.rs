use dashmap::DashMap;
use netdash_core::TaskStatus;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Full state of a job.
#[derive(Debug, Clone)]
pub struct StoredTask {
    pub task_id: String,
    pub task_type: String,
    /// Submitted payload.
    pub data: Value,
    pub status: TaskStatus,
    /// Job output, populated on SUCCESS.
    pub result: Option<Value>,
    /// Failure reason, populated on FAILURE.
    pub error: Option<String>,
    /// Unix ms when the job was submitted.
    pub submitted_at: u64,
    /// Unix ms when the status last changed.
    pub updated_at: u64,
    /// Monotonic completion time, used for result expiry.
    pub finished_at: Option<Instant>,
}

impl StoredTask {
    pub fn is_ready(&self) -> bool {
        self.status.is_terminal()
    }
}

/// In-memory store for jobs.
#[derive(Clone, Default)]
pub struct TaskStore {
    /// task_id → StoredTask
    tasks: Arc<DashMap<String, StoredTask>>,
    /// Mixed into task ids so identical submissions in the same ms differ.
    seq: Arc<AtomicU64>,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Store a new PENDING job and return its id.
    pub fn submit(&self, task_type: &str, data: Value) -> String {
        let submitted_at = now_ms();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        let task_id = {
            let mut h = blake3::Hasher::new();
            h.update(task_type.as_bytes());
            h.update(data.to_string().as_bytes());
            h.update(&submitted_at.to_le_bytes());
            h.update(&seq.to_le_bytes());
            hex::encode(h.finalize().as_bytes())
        };

        self.tasks
            .entry(task_id.clone())
            .or_insert_with(|| StoredTask {
                task_id: task_id.clone(),
                task_type: task_type.to_string(),
                data,
                status: TaskStatus::Pending,
                result: None,
                error: None,
                submitted_at,
                updated_at: submitted_at,
                finished_at: None,
            });
        task_id
    }

    /// Mark a PENDING job as STARTED. Returns false if it is not pending.
    pub fn start(&self, task_id: &str) -> bool {
        match self.tasks.get_mut(task_id) {
            Some(mut task) if task.status == TaskStatus::Pending => {
                task.status = TaskStatus::Started;
                task.updated_at = now_ms();
                true
            }
            _ => false,
        }
    }

    /// Store a job's output and mark it SUCCESS.
    pub fn complete(&self, task_id: &str, result: Value) {
        if let Some(mut task) = self.tasks.get_mut(task_id) {
            task.status = TaskStatus::Success;
            task.result = Some(result);
            task.updated_at = now_ms();
            task.finished_at = Some(Instant::now());
        }
    }

    /// Mark a job FAILURE with a reason.
    pub fn fail(&self, task_id: &str, error: impl Into<String>) {
        if let Some(mut task) = self.tasks.get_mut(task_id) {
            task.status = TaskStatus::Failure;
            task.error = Some(error.into());
            task.updated_at = now_ms();
            task.finished_at = Some(Instant::now());
        }
    }

    /// Look up a job by id.
    pub fn get_task(&self, task_id: &str) -> Option<StoredTask> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    /// All jobs, oldest first.
    pub fn all_tasks(&self) -> Vec<StoredTask> {
        let mut tasks: Vec<StoredTask> = self.tasks.iter().map(|t| t.clone()).collect();
        tasks.sort_by_key(|t| t.submitted_at);
        tasks
    }

    /// Drop finished jobs whose result is older than `max_age` at `now`.
    /// Returns how many were removed.
    pub fn purge_expired(&self, max_age: Duration, now: Instant) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| match task.finished_at {
            Some(finished) => now.saturating_duration_since(finished) < max_age,
            None => true,
        });
        before - self.tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
