//! Configuration system for netdash.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $NETDASH_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/netdash/config.toml
//!   3. ~/.config/netdash/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Placeholder substituted with the task id in the status path template.
pub const TASK_ID_PLACEHOLDER: &str = "{task_id}";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetdashConfig {
    pub client: ClientConfig,
    pub server: ServerConfig,
}

/// Orchestrator side: where the job engine lives and how to poll it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Job engine base URL, e.g. "http://127.0.0.1:5000".
    pub base_url: String,
    /// Path for job creation (POST).
    pub create_path: String,
    /// Path for status checks. Must contain `{task_id}`.
    pub status_path_template: String,
    /// Fixed delay between status checks.
    pub poll_interval_ms: u64,
    /// Give up polling a single task after this long. 0 = never.
    pub poll_timeout_ms: u64,
    /// Give up after this many status checks. 0 = unlimited.
    pub max_poll_attempts: u32,
    /// Per-request HTTP timeout. 0 = none.
    pub request_timeout_ms: u64,
}

/// Job engine side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port for the HTTP API, bound on 127.0.0.1.
    pub port: u16,
    /// Max concurrently running jobs. 0 = available parallelism.
    pub max_concurrent_tasks: u32,
    /// Finished jobs are forgotten this long after completion.
    pub result_expires_secs: u64,
    /// ssh client used by `ssh_cmd` jobs.
    pub ssh_binary: String,
    /// Remote user for `ssh_cmd` jobs. Empty = ssh's own default.
    pub ssh_user: String,
    pub ssh_connect_timeout_secs: u32,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            create_path: "/api/tasks/".to_string(),
            status_path_template: format!("/api/tasks/{}", TASK_ID_PLACEHOLDER),
            poll_interval_ms: 1000,
            poll_timeout_ms: 300_000, // matches the engine's result expiry
            max_poll_attempts: 0,
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            max_concurrent_tasks: 0,
            result_expires_secs: 300,
            ssh_binary: "ssh".to_string(),
            ssh_user: std::env::var("USER").unwrap_or_default(),
            ssh_connect_timeout_secs: 10,
        }
    }
}

impl ClientConfig {
    /// Full URL for job creation.
    pub fn create_url(&self) -> String {
        join_url(&self.base_url, &self.create_path)
    }

    /// Full status URL with the `{task_id}` placeholder still in place.
    pub fn status_url_template(&self) -> String {
        join_url(&self.base_url, &self.status_path_template)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("netdash")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl NetdashConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            NetdashConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config document. Missing sections and keys take defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("NETDASH_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&NetdashConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply NETDASH_* overrides. `lookup` is `std::env::var` outside tests.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("NETDASH_CLIENT__BASE_URL") {
            self.client.base_url = v;
        }
        if let Some(p) = lookup("NETDASH_CLIENT__POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.client.poll_interval_ms = p;
        }
        if let Some(p) = lookup("NETDASH_CLIENT__POLL_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.client.poll_timeout_ms = p;
        }
        if let Some(p) = lookup("NETDASH_CLIENT__MAX_POLL_ATTEMPTS").and_then(|v| v.parse().ok()) {
            self.client.max_poll_attempts = p;
        }
        if let Some(p) = lookup("NETDASH_SERVER__PORT").and_then(|v| v.parse().ok()) {
            self.server.port = p;
        }
        if let Some(p) = lookup("NETDASH_SERVER__MAX_CONCURRENT_TASKS").and_then(|v| v.parse().ok())
        {
            self.server.max_concurrent_tasks = p;
        }
        if let Some(p) = lookup("NETDASH_SERVER__RESULT_EXPIRES_SECS").and_then(|v| v.parse().ok())
        {
            self.server.result_expires_secs = p;
        }
        if let Some(v) = lookup("NETDASH_SERVER__SSH_USER") {
            self.server.ssh_user = v;
        }
    }
}
