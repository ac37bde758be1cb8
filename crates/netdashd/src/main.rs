//! netdashd: job engine daemon behind the netdash task API.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use netdash_api::ApiState;
use netdash_core::config::NetdashConfig;
use netdash_services::{task_executor, TaskStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = NetdashConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = NetdashConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        NetdashConfig::default()
    });
    let server = config.server;

    tracing::info!(
        port = server.port,
        max_concurrent_tasks = server.max_concurrent_tasks,
        result_expires_secs = server.result_expires_secs,
        ssh_binary = %server.ssh_binary,
        "netdashd starting"
    );

    // Shared state
    let store = TaskStore::new();
    let (queue_tx, queue_rx) = mpsc::unbounded_channel::<String>();

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let executor_task = tokio::spawn(task_executor::run(store.clone(), server.clone(), queue_rx));

    let expiry_task = tokio::spawn(task_executor::expiry_loop(
        store.clone(),
        Duration::from_secs(server.result_expires_secs),
    ));

    let api_task = {
        let state = ApiState {
            store: store.clone(),
            queue: queue_tx,
        };
        let mut shutdown_rx = shutdown_tx.subscribe();
        let port = server.port;
        tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(e) = netdash_api::serve(state, port, shutdown).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = api_task           => tracing::error!("API server exited: {:?}", r),
        r = executor_task      => tracing::error!("task executor exited: {:?}", r),
        r = expiry_task        => tracing::error!("expiry task exited: {:?}", r),
    }

    tracing::info!(tasks = store.len(), "netdashd stopped");
    Ok(())
}
