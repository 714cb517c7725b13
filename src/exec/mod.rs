// src/exec/mod.rs

//! Execution layer.
//!
//! - [`tool`] runs the external collaborators (Sass, Jekyll, bower, ...)
//!   through `tokio::process::Command` behind the [`ToolRunner`] seam.
//! - [`backend`] provides the `ExecutorBackend` trait the runtime dispatches
//!   scheduled steps to, and the production `PipelineExecutor` that runs each
//!   step's pipeline on its own Tokio task.

pub mod backend;
pub mod tool;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use tool::{SystemToolRunner, ToolInvocation, ToolOutput, ToolRunner};
