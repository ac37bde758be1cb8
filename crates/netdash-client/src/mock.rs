//! Recording transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::error::TransportError;
use crate::transport::{build_url, Transport};

pub(crate) const CREATE_URL: &str = "http://engine.test/api/tasks/";
pub(crate) const STATUS_TEMPLATE: &str = "http://engine.test/api/tasks/{task_id}";

/// A status reply, or the HTTP status to fail with.
pub(crate) type Reply = Result<Value, u16>;

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub at: Instant,
}

type Handler = Box<dyn Fn(&Call) -> Result<Value, TransportError> + Send + Sync>;

pub(crate) struct MockTransport {
    calls: Mutex<Vec<Call>>,
    handler: Handler,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&Call) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &Method) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| &c.method == method)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let call = Call {
            method,
            url: build_url(url, query)?.to_string(),
            body: body.cloned(),
            at: Instant::now(),
        };
        let reply = (self.handler)(&call);
        self.calls.lock().unwrap().push(call);
        reply
    }
}

// ── Status bodies ─────────────────────────────────────────────────────────────

pub(crate) fn pending() -> Value {
    json!({ "status": "PENDING", "success": false, "ready": false, "result": null })
}

pub(crate) fn succeeded(result: Value) -> Value {
    json!({ "status": "SUCCESS", "success": true, "ready": true, "result": result })
}

pub(crate) fn failed() -> Value {
    json!({ "status": "FAILURE", "success": false, "ready": true, "result": null })
}

/// Engine where a POST hands out `data.id` as the task id (no id → no
/// `task_id` in the reply) and each id answers its polls from a script.
/// The last reply of a script repeats forever; unknown ids get a 404.
pub(crate) fn scripted(scripts: Vec<(&str, Vec<Reply>)>) -> MockTransport {
    let scripts: Mutex<HashMap<String, VecDeque<Reply>>> = Mutex::new(
        scripts
            .into_iter()
            .map(|(id, replies)| (id.to_string(), replies.into_iter().collect()))
            .collect(),
    );

    MockTransport::new(move |call| {
        if call.method == Method::POST {
            let id = call
                .body
                .as_ref()
                .and_then(|b| b["data"]["id"].as_str().map(str::to_string));
            return Ok(match id {
                Some(id) => json!({ "task_id": id }),
                None => json!({}),
            });
        }

        let id = call.url.rsplit('/').next().unwrap_or_default().to_string();
        let mut scripts = scripts.lock().unwrap();
        let reply = match scripts.get_mut(&id) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap(),
            Some(script) => script.front().cloned().unwrap(),
            None => Err(404),
        };
        reply.map_err(|status| TransportError::Status {
            status,
            url: call.url.clone(),
        })
    })
}
