//! netdash-client: creates jobs on the netdash engine, polls them to a
//! terminal status, and runs batches of them.
//!
//! Layering, leaf first: [`transport`] → [`factory`] / [`poller`] → [`runner`].

pub mod error;
pub mod factory;
pub mod poller;
pub mod runner;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use error::{PollError, TransportError};
pub use factory::create_task;
pub use poller::{poll_task, PollPolicy};
pub use runner::{TaskEndpoints, TaskRunner, TASK_CANCELLED, TASK_CREATION_FAILED};
pub use transport::{HttpTransport, Transport};

pub use netdash_core::{AnnotatedTask, TaskDescriptor, TaskHandle, TaskOutcome};
pub use tokio_util::sync::CancellationToken;
