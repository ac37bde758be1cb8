//! netdash-core: shared task wire types and configuration.
//! All other netdash crates depend on this one.

pub mod config;
pub mod task;

pub use task::{
    AnnotatedTask, CreateTaskRequest, CreateTaskResponse, TaskDescriptor, TaskHandle, TaskOutcome,
    TaskStatus, TaskStatusResponse,
};
