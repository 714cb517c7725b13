// src/dag/mod.rs

//! Task table, execution plans and scheduling.
//!
//! - [`registry`] holds the fixed table of named tasks with their
//!   dependencies, run-sequences and actions.
//! - [`plan`] expands requested targets into an explicit DAG of steps and
//!   orders it topologically.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   steps are ready, and which are blocked by a failure.
//! - [`task_info`] provides per-run states and the scheduled task type.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod plan;
pub mod registry;
pub mod scheduler;
pub mod scheduler_step;
pub mod task_info;

pub use plan::{ExecutionPlan, PlanStep};
pub use registry::{CleanTarget, TaskAction, TaskDef, TaskRegistry};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
