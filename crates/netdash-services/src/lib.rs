//! netdash-services: the job engine behind the task API.
//!
//! Jobs are accepted into a [`TaskStore`], handed to the executor over a
//! channel, run under a concurrency bound, and forgotten once their result
//! has expired.

pub mod jobs;
pub mod task_executor;
pub mod task_store;

pub use jobs::JobKind;
pub use task_store::{StoredTask, TaskStore};

/// Sender half of the executor queue. Carries task ids.
pub type TaskQueue = tokio::sync::mpsc::UnboundedSender<String>;
