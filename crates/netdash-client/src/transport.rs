//! Request/response primitive for talking to the job engine.
//!
//! [`Transport`] is the seam the factory and poller are written against;
//! [`HttpTransport`] is the reqwest implementation used outside tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Url};
use serde_json::Value;

use crate::error::TransportError;

/// JSON request/response against the engine. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and decode the JSON reply.
    ///
    /// `query` is appended only when non-empty. A `body` that is `null` or an
    /// empty object is not sent. Non-2xx replies are errors.
    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, TransportError>;

    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        self.request(Method::GET, url, query, None).await
    }

    async fn post(
        &self,
        url: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<Value, TransportError> {
        self.request(Method::POST, url, query, Some(body)).await
    }
}

/// Parse `url` and append the URL-encoded `query` pairs, if any.
pub fn build_url(url: &str, query: &[(String, String)]) -> Result<Url, TransportError> {
    let mut parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !query.is_empty() {
        parsed.query_pairs_mut().extend_pairs(query);
    }
    Ok(parsed)
}

/// The body actually sent: nothing for `null` and `{}`.
pub fn effective_body(body: Option<&Value>) -> Option<&Value> {
    match body {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(other) => Some(other),
    }
}

// ── reqwest ───────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// `timeout` bounds each request end to end.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Build)?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let full = build_url(url, query)?;
        tracing::debug!(%method, url = %full, "engine request");

        let mut req = self
            .client
            .request(method, full.clone())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = effective_body(body) {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|source| TransportError::Network {
            url: full.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: full.to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|source| TransportError::Network {
            url: full.to_string(),
            source,
        })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| TransportError::Decode {
            url: full.to_string(),
            source,
        })
    }
}
