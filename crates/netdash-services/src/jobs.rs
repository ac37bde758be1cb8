//! Job kinds the engine knows how to run.
//!
//! A job returns `Ok(result)` whenever it ran, even if the device it talked to
//! refused: such results carry `"success": false` and an `"error"` string.
//! `Err` is reserved for jobs that could not run at all (bad payload, missing
//! binary) and becomes a FAILURE status.

use std::net::IpAddr;

use netdash_core::config::ServerConfig;
use serde_json::{json, Value};

/// Well-known task type strings.
pub mod task_types {
    pub const HELLO: &str = "hello";
    pub const SSH_CMD: &str = "ssh_cmd";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Echo `world` back. Used to check the engine end to end.
    Hello,
    /// Run one CLI command on a device over ssh.
    SshCmd,
}

impl JobKind {
    pub fn parse(task_type: &str) -> Option<Self> {
        match task_type {
            task_types::HELLO => Some(JobKind::Hello),
            task_types::SSH_CMD => Some(JobKind::SshCmd),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Hello => task_types::HELLO,
            JobKind::SshCmd => task_types::SSH_CMD,
        }
    }
}

/// Run a job to completion.
pub async fn execute(kind: JobKind, data: &Value, config: &ServerConfig) -> Result<Value, String> {
    match kind {
        JobKind::Hello => hello(data),
        JobKind::SshCmd => ssh_cmd(data, config).await,
    }
}

fn hello(data: &Value) -> Result<Value, String> {
    let world = data
        .get("world")
        .ok_or_else(|| "payload missing \"world\"".to_string())?;
    Ok(json!({ "hello": world, "success": true }))
}

/// Expected shape: `{"ip_address": "...", "cmd": "...", "device_type"?, "use_textfsm"?}`.
///
/// Output is returned raw; `parsed` is always null since structured parsing of
/// vendor output happens in the UI layer.
async fn ssh_cmd(data: &Value, config: &ServerConfig) -> Result<Value, String> {
    let host = required_str(data, "ip_address")?;
    if !is_valid_host(host) {
        return Err(format!("invalid \"ip_address\": {:?}", host));
    }
    let command = required_str(data, "cmd")?;
    let device_type = data
        .get("device_type")
        .and_then(|v| v.as_str())
        .unwrap_or("cisco_ios");

    let mut cmd = tokio::process::Command::new(&config.ssh_binary);
    cmd.arg("-o")
        .arg("BatchMode=yes")
        .arg("-o")
        .arg(format!("ConnectTimeout={}", config.ssh_connect_timeout_secs))
        .arg("-o")
        .arg("StrictHostKeyChecking=accept-new");
    if !config.ssh_user.is_empty() {
        cmd.arg("-l").arg(&config.ssh_user);
    }
    // Nothing after `--` is read as an ssh option.
    cmd.arg("--").arg(host).arg(command).kill_on_drop(true);

    tracing::debug!(host, device_type, "running ssh command");

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("failed to spawn '{}': {}", config.ssh_binary, e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        Ok(json!({
            "parsed": null,
            "raw": stdout,
            "success": true,
        }))
    } else {
        let code = output.status.code().unwrap_or(-1);
        Ok(json!({
            "error": format!(
                "exit code {}: {}",
                code,
                if stderr.is_empty() { stdout.trim() } else { stderr.trim() }
            ),
            "success": false,
        }))
    }
}

/// An IP address or an RFC 1123 hostname. Never starts with `-`.
fn is_valid_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    host.len() <= 253
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn required_str<'a>(data: &'a Value, key: &str) -> Result<&'a str, String> {
    data.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("payload missing \"{}\" string", key))
}
