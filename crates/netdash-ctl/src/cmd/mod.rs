//! CLI command modules.

pub mod batch;
pub mod tasks;
