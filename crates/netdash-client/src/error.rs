//! Error types for engine requests and task polling.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// A request to the engine did not produce a JSON body.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl TransportError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Why polling a task ended without a result.
///
/// The `Display` strings are what ends up in a failed [`TaskOutcome`]'s
/// `error` field.
///
/// [`TaskOutcome`]: netdash_core::TaskOutcome
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Error checking task: {0}")]
    Transport(#[from] TransportError),

    #[error("Error checking task: malformed status response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Engine reported FAILURE, or SUCCESS with `success: false`.
    #[error("Task failed")]
    TaskFailed { detail: Option<Value> },

    #[error("Task polling timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Task still pending after {0} polls")]
    AttemptsExhausted(u32),

    #[error("Task polling cancelled")]
    Cancelled,
}

impl PollError {
    /// Backend payload preserved with a task failure.
    pub fn detail(&self) -> Option<Value> {
        match self {
            PollError::TaskFailed { detail } => detail.clone(),
            _ => None,
        }
    }
}
