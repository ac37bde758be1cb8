//! Engine outages, slow jobs and expiry.

use std::time::{Duration, Instant};

use serde_json::json;

use netdash_client::{PollPolicy, TaskDescriptor, Transport, TASK_CANCELLED};
use netdash_core::config::ServerConfig;

use crate::*;

/// Write an executable that sleeps for `secs` and prints its arguments.
#[cfg(unix)]
fn slow_ssh(name: &str, secs: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = std::env::temp_dir().join(format!("netdash-{}-{}", name, std::process::id()));
    std::fs::write(&path, format!("#!/bin/sh\nsleep {secs}\necho \"$@\"\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn ssh_task(host: &str) -> TaskDescriptor {
    TaskDescriptor::new("ssh_cmd", json!({ "ip_address": host, "cmd": "show clock" }))
}

#[tokio::test]
async fn test_engine_down_every_item_fails_creation() {
    let runner = runner_for(&dead_url().await);

    let tasks = vec![
        TaskDescriptor::new("hello", json!({ "world": 1 })),
        TaskDescriptor::new("hello", json!({ "world": 2 })),
    ];

    for annotated in [runner.run_tasks(&tasks).await, runner.run_tasks_seq(&tasks).await] {
        assert_eq!(annotated.len(), 2);
        for t in &annotated {
            assert!(!t.result.success);
            assert_eq!(t.result.error.as_deref(), Some("Task creation failed"));
        }
    }
}

#[tokio::test]
async fn test_cancelled_runner_creates_nothing() {
    let engine = default_engine().await.unwrap();
    let runner = runner_for(&engine.base_url);
    runner.cancellation_token().cancel();

    let annotated = runner
        .run_tasks(&[TaskDescriptor::new("hello", json!({ "world": 1 }))])
        .await;

    assert_eq!(annotated[0].result.error.as_deref(), Some(TASK_CANCELLED));
    assert!(engine.store.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_poll_timeout_on_slow_job() {
    let script = slow_ssh("timeout", "2");
    let engine = engine_with_ssh_binary(script.to_str().unwrap()).await.unwrap();
    let policy = PollPolicy::new(Duration::from_millis(POLL_INTERVAL_MS))
        .with_timeout(Duration::from_millis(300));
    let runner = runner_with_policy(&engine.base_url, policy);

    let annotated = runner.run_task(&ssh_task("10.0.0.1")).await;

    assert!(!annotated.result.success);
    assert_eq!(
        annotated.result.error.as_deref(),
        Some("Task polling timed out after 300ms")
    );
    std::fs::remove_file(script).ok();
}

#[cfg(unix)]
#[tokio::test]
async fn test_poll_attempt_limit_on_slow_job() {
    let script = slow_ssh("attempts", "2");
    let engine = engine_with_ssh_binary(script.to_str().unwrap()).await.unwrap();
    let runner = runner_with_policy(&engine.base_url, fast_policy().with_max_attempts(3));

    let annotated = runner.run_task(&ssh_task("10.0.0.1")).await;

    assert_eq!(
        annotated.result.error.as_deref(),
        Some("Task still pending after 3 polls")
    );
    std::fs::remove_file(script).ok();
}

#[cfg(unix)]
#[tokio::test]
async fn test_parallel_batch_overlaps_slow_jobs() {
    let script = slow_ssh("parallel", "0.5");
    let engine = start_engine(ServerConfig {
        ssh_binary: script.to_str().unwrap().to_string(),
        max_concurrent_tasks: 4,
        ..ServerConfig::default()
    })
    .await
    .unwrap();
    let runner = runner_for(&engine.base_url);
    let tasks: Vec<_> = (1..=4).map(|i| ssh_task(&format!("10.0.0.{i}"))).collect();

    let started = Instant::now();
    let annotated = runner.run_tasks(&tasks).await;
    let parallel = started.elapsed();

    assert!(annotated.iter().all(|t| t.result.success));
    // Four half-second jobs run side by side, well under their sum.
    assert!(parallel < Duration::from_millis(1800), "{parallel:?}");

    let started = Instant::now();
    let annotated = runner.run_tasks_seq(&tasks).await;
    assert!(annotated.iter().all(|t| t.result.success));
    assert!(started.elapsed() >= Duration::from_secs(2));

    std::fs::remove_file(script).ok();
}

#[tokio::test]
async fn test_finished_results_expire() {
    let engine = start_engine(ServerConfig {
        result_expires_secs: 1,
        ..ServerConfig::default()
    })
    .await
    .unwrap();
    let runner = runner_for(&engine.base_url);

    let handle = runner
        .create_task("hello", &json!({ "world": "soon gone" }))
        .await
        .unwrap();
    runner.poll_task(&handle).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let status_url = format!("{}/api/tasks/{}", engine.base_url, handle);
    let err = runner.transport().get(&status_url, &[]).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(engine.store.is_empty());
}
