//! Task executor: runs queued jobs and records their outcome.
//!
//! The API stores a job as PENDING and pushes its id onto the queue. The
//! executor marks it STARTED, runs it under the concurrency bound, and stores
//! SUCCESS or FAILURE.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;

use netdash_core::config::ServerConfig;

use crate::jobs::{self, JobKind};
use crate::task_store::TaskStore;

/// Runs until the queue's senders are all dropped.
pub async fn run(store: TaskStore, config: ServerConfig, mut queue: mpsc::UnboundedReceiver<String>) {
    let max_tasks = if config.max_concurrent_tasks == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        config.max_concurrent_tasks as usize
    };

    let semaphore = Arc::new(Semaphore::new(max_tasks));
    let config = Arc::new(config);

    tracing::info!(max_concurrent = max_tasks, "task executor started");

    while let Some(task_id) = queue.recv().await {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(p) => p,
            Err(_) => break, // semaphore closed
        };

        let Some(task) = store.get_task(&task_id) else {
            tracing::debug!(task_id = short(&task_id), "queued task vanished before start");
            continue;
        };
        if !store.start(&task_id) {
            continue;
        }

        let config = config.clone();
        let task_type = task.task_type;
        let data = task.data;
        let kind = JobKind::parse(&task_type);
        let job = {
            let task_type = task_type.clone();
            async move {
                match kind {
                    Some(kind) => jobs::execute(kind, &data, &config).await,
                    None => Err(format!("unknown task type '{}'", task_type)),
                }
            }
        };

        let store = store.clone();
        tokio::spawn(async move {
            run_job(&store, &task_id, &task_type, job).await;
            drop(permit);
        });
    }

    tracing::info!("task queue closed, executor stopping");
}

/// Run one job on its own task and record SUCCESS or FAILURE. A job that
/// panics is recorded as FAILURE.
pub async fn run_job<F>(store: &TaskStore, task_id: &str, task_type: &str, job: F)
where
    F: Future<Output = Result<Value, String>> + Send + 'static,
{
    let start = Instant::now();
    let outcome = match tokio::spawn(job).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err("job panicked".to_string()),
        Err(_) => Err("job cancelled".to_string()),
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            store.complete(task_id, result);
            tracing::info!(
                task_id = short(task_id),
                task_type,
                elapsed_ms,
                "task finished"
            );
        }
        Err(error) => {
            tracing::warn!(
                task_id = short(task_id),
                task_type,
                elapsed_ms,
                %error,
                "task failed"
            );
            store.fail(task_id, error);
        }
    }
}

/// Periodically forget finished jobs older than `max_age`.
pub async fn expiry_loop(store: TaskStore, max_age: Duration) {
    let check_interval = Duration::from_secs(1).max(max_age / 10).min(Duration::from_secs(30));
    let mut interval = tokio::time::interval(check_interval);

    loop {
        interval.tick().await;

        let removed = store.purge_expired(max_age, Instant::now());
        if removed > 0 {
            tracing::debug!(removed, "expired finished tasks");
        }
    }
}

fn short(task_id: &str) -> &str {
    &task_id[..16.min(task_id.len())]
}
