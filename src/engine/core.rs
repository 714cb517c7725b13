// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces a list of commands
//! describing what the IO shell should do next. It owns no channels, spawns
//! nothing and touches no files, so it can be driven step by step in tests.

use std::sync::Arc;

use tracing::warn;

use crate::dag::{Scheduler, TaskRegistry, TaskRunState};
use crate::engine::event_handlers::{
    CoreCommand, CoreState, CoreStep, handle_task_completion, handle_task_trigger,
};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions, TaskName};
use crate::types::TriggerWhileRunningBehaviour;

/// Pure core runtime state.
///
/// This owns:
/// - the task registry used to plan every triggered run
/// - the per-run scheduler
/// - the trigger queue
/// - runtime options (e.g. `exit_when_idle`)
#[derive(Debug)]
pub struct CoreRuntime {
    registry: Arc<TaskRegistry>,
    scheduler: Scheduler,
    queue: TriggerQueue,
    options: RuntimeOptions,
    run_failures: Vec<TaskName>,
}

impl CoreRuntime {
    pub fn new(
        registry: Arc<TaskRegistry>,
        behaviour: TriggerWhileRunningBehaviour,
        queue_length: usize,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            registry,
            scheduler: Scheduler::new(),
            queue: TriggerQueue::new(behaviour, queue_length),
            options,
            run_failures: Vec::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn run_state_of(&self, task: &str) -> TaskRunState {
        self.scheduler.run_state_of(task)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskTriggered { task, reason } => {
                handle_task_trigger(self.state(), task, reason)
            }
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(self.state(), task, outcome)
            }
            RuntimeEvent::ShutdownRequested => self.shutdown(),
        }
    }

    fn shutdown(&mut self) -> CoreStep {
        let mut commands = Vec::new();
        if !self.scheduler.is_idle() {
            let run_id = self.scheduler.last_run_id();
            warn!(run_id, "shutdown requested with steps still in flight");
            commands.push(CoreCommand::RunInterrupted { run_id });
        }
        CoreStep {
            commands,
            keep_running: false,
        }
    }

    fn state(&mut self) -> CoreState<'_> {
        CoreState {
            registry: &self.registry,
            scheduler: &mut self.scheduler,
            queue: &mut self.queue,
            options: &self.options,
            run_failures: &mut self.run_failures,
        }
    }
}
