//! netdash integration test harness.
//!
//! Each test starts its own engine (API + executor) on an ephemeral
//! 127.0.0.1 port and talks to it over real HTTP:
//!
//!   cargo test --test integration
//!
//! The engine is shut down when its [`Engine`] handle is dropped.

mod failures;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use netdash_api::ApiState;
use netdash_client::{HttpTransport, PollPolicy, TaskEndpoints, TaskRunner};
use netdash_core::config::{ClientConfig, ServerConfig};
use netdash_services::{task_executor, TaskStore};

// ── Harness ───────────────────────────────────────────────────────────────────

/// Poll interval used against the local engine.
pub const POLL_INTERVAL_MS: u64 = 20;

/// A running engine bound to an ephemeral port.
pub struct Engine {
    pub base_url: String,
    pub store: TaskStore,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
    executor: JoinHandle<()>,
    expiry: JoinHandle<()>,
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.server.abort();
        self.executor.abort();
        self.expiry.abort();
    }
}

/// Start the API, executor and result expiry with `config`.
pub async fn start_engine(config: ServerConfig) -> Result<Engine> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind engine listener")?;
    let addr = listener.local_addr()?;

    let store = TaskStore::new();
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();
    let expiry = tokio::spawn(task_executor::expiry_loop(
        store.clone(),
        Duration::from_secs(config.result_expires_secs),
    ));
    let executor = tokio::spawn(task_executor::run(store.clone(), config, queue_rx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let state = ApiState {
        store: store.clone(),
        queue: queue_tx,
    };
    let server = tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = netdash_api::serve_listener(listener, state, shutdown).await {
            eprintln!("engine server failed: {e}");
        }
    });

    Ok(Engine {
        base_url: format!("http://{addr}"),
        store,
        shutdown: Some(shutdown_tx),
        server,
        executor,
        expiry,
    })
}

/// Engine with default settings.
pub async fn default_engine() -> Result<Engine> {
    start_engine(ServerConfig::default()).await
}

/// Engine whose ssh jobs run `binary` instead of ssh.
pub async fn engine_with_ssh_binary(binary: &str) -> Result<Engine> {
    start_engine(ServerConfig {
        ssh_binary: binary.to_string(),
        ssh_user: "netops".to_string(),
        ..ServerConfig::default()
    })
    .await
}

pub fn client_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        base_url: base_url.to_string(),
        poll_interval_ms: POLL_INTERVAL_MS,
        poll_timeout_ms: 10_000,
        request_timeout_ms: 5_000,
        ..ClientConfig::default()
    }
}

/// HTTP runner against `base_url` with a fast poll interval.
pub fn runner_for(base_url: &str) -> TaskRunner {
    TaskRunner::from_config(&client_config(base_url)).expect("failed to build HTTP runner")
}

/// A runner with a custom poll policy.
pub fn runner_with_policy(base_url: &str, policy: PollPolicy) -> TaskRunner {
    let transport = HttpTransport::new(Some(Duration::from_secs(5)))
        .expect("failed to build HTTP transport");
    TaskRunner::new(
        Arc::new(transport),
        TaskEndpoints::from_config(&client_config(base_url)),
        policy,
    )
}

/// An address nothing listens on.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn fast_policy() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(POLL_INTERVAL_MS)).with_timeout(Duration::from_secs(10))
}
