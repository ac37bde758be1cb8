//! Single-task commands.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use netdash_client::poller::status_url;
use netdash_client::{TaskHandle, TaskOutcome, TaskRunner, Transport};
use netdash_core::TaskStatusResponse;

#[derive(Deserialize)]
struct TaskListResponse {
    tasks: Vec<TaskStatusResponse>,
}

pub async fn cmd_submit(runner: &TaskRunner, task_type: &str, data: &str) -> Result<()> {
    let data: Value = serde_json::from_str(data).context("task data must be valid JSON")?;

    let Some(handle) = runner.create_task(task_type, &data).await else {
        bail!(
            "task creation failed at {} (is netdashd running?)",
            runner.endpoints().create_url
        );
    };

    println!("{}", handle);
    Ok(())
}

pub async fn cmd_status(runner: &TaskRunner, task_id: &str) -> Result<()> {
    let url = status_url(
        &runner.endpoints().status_url_template,
        &TaskHandle::new(task_id),
    );
    let body = runner
        .transport()
        .get(&url, &[])
        .await
        .with_context(|| format!("failed to fetch status of {}", task_id))?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

pub async fn cmd_wait(runner: &TaskRunner, task_id: &str) -> Result<()> {
    let outcome = match runner.poll_task(&TaskHandle::new(task_id)).await {
        Ok(result) => TaskOutcome::from_result(result),
        Err(e) => TaskOutcome::failure_with_detail(e.to_string(), e.detail()),
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

pub async fn cmd_list(runner: &TaskRunner) -> Result<()> {
    let url = list_url(&runner.endpoints().create_url);
    let body = runner
        .transport()
        .get(&url, &[])
        .await
        .with_context(|| format!("failed to connect to netdashd at {}", url))?;
    let resp: TaskListResponse =
        serde_json::from_value(body).context("failed to parse response")?;

    if resp.tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Tasks ({})", resp.tasks.len());
    println!("═══════════════════════════════════════");

    for t in &resp.tasks {
        print_task(t);
    }

    Ok(())
}

/// The list route is the creation route without its trailing slash.
fn list_url(create_url: &str) -> String {
    create_url.trim_end_matches('/').to_string()
}

fn print_task(t: &TaskStatusResponse) {
    let id = t.task_id.as_deref().unwrap_or("?");
    println!("  ┌─ {}...", &id[..16.min(id.len())]);
    println!("  │  status : {}", t.status);
    if let Some(ref error) = t.error {
        println!("  │  error  : {}", error.trim());
    }
    if let Some(ref result) = t.result {
        if let Some(raw) = result.get("raw").and_then(|v| v.as_str()) {
            println!("  │  raw    : {}", raw.trim());
        } else {
            println!("  │  result : {}", result);
        }
    }
    println!("  └─");
}
