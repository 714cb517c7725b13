// src/dag/scheduler_step.rs

use crate::dag::task_info::ScheduledTask;
use crate::engine::TaskName;

/// Structured result of a single scheduler "step".
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked as failed in this step: the failing task plus every
    /// pending step that can no longer run.
    pub newly_failed: Vec<TaskName>,
    /// Whether this step finished the current run (the scheduler is idle).
    pub run_just_finished: bool,
    /// Whether the run that just finished had any failed step.
    pub run_failed: bool,
}
