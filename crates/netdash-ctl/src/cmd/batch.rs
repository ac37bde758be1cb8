//! Batch command: run a JSON array of task descriptors.

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use netdash_client::{TaskDescriptor, TaskRunner};

pub async fn cmd_run(runner: &TaskRunner, source: &str, sequential: bool) -> Result<()> {
    let text = read_source(source).await?;
    let tasks = parse_batch(&text)?;

    let annotated = if sequential {
        runner.run_tasks_seq(&tasks).await
    } else {
        runner.run_tasks(&tasks).await
    };

    println!("{}", serde_json::to_string_pretty(&annotated)?);

    let failed = annotated.iter().filter(|t| !t.result.success).count();
    if failed > 0 {
        eprintln!("{} of {} tasks failed", failed, annotated.len());
    }
    Ok(())
}

/// `-` reads stdin.
async fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read {}", source))
    }
}

fn parse_batch(text: &str) -> Result<Vec<TaskDescriptor>> {
    serde_json::from_str(text).context("batch must be a JSON array of {\"type\", \"params\"} objects")
}
