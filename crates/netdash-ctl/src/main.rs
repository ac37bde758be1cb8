//! netdash-ctl: command-line interface for the netdash job engine.

mod cmd;

use anyhow::{Context, Result};

use netdash_client::TaskRunner;
use netdash_core::config::NetdashConfig;

fn print_usage() {
    println!("Usage: netdash-ctl [--url <base>] <command>");
    println!();
    println!("Commands:");
    println!("  submit <type> <json>        Create a task and print its id");
    println!("  status <task_id>            Print the raw status body of a task");
    println!("  wait <task_id>              Poll a task until it finishes");
    println!("  run [--seq] <file.json|->   Run a JSON array of tasks");
    println!("  list                        List tasks known to the engine");
    println!();
    println!("Options:");
    println!("  --url <base>   Engine base URL (default: from config)");
    println!("  --seq          Run batch tasks one at a time");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = NetdashConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        NetdashConfig::default()
    });

    // Parse options
    let mut sequential = false;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--url" => {
                i += 1;
                config.client.base_url = args.get(i).context("--url requires a value")?.clone();
            }
            "--seq" => sequential = true,
            other => remaining.push(other),
        }
        i += 1;
    }

    let runner = TaskRunner::from_config(&config.client).context("failed to build HTTP client")?;

    // Ctrl-C stops any poll in progress; unfinished tasks report cancellation.
    {
        let cancel = runner.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            cancel.cancel();
        });
    }

    match remaining.as_slice() {
        ["submit", task_type, data]    => cmd::tasks::cmd_submit(&runner, task_type, data).await,
        ["status", task_id]            => cmd::tasks::cmd_status(&runner, task_id).await,
        ["wait", task_id]              => cmd::tasks::cmd_wait(&runner, task_id).await,
        ["list"] | []                  => cmd::tasks::cmd_list(&runner).await,
        ["run", source]                => cmd::batch::cmd_run(&runner, source, sequential).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
