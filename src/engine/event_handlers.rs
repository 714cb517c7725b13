// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{error, info};

use crate::dag::{ExecutionPlan, ScheduledTask, Scheduler, SchedulerStep, TaskRegistry};
use crate::engine::queue::TriggerQueue;
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome, TriggerReason};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these steps to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// A run ended. `failed` lists failed and blocked steps (empty on success).
    RunFinished { run_id: u64, failed: Vec<TaskName> },
    /// Shutdown arrived while this run still had pending or running steps.
    RunInterrupted { run_id: u64 },
    /// Request that the runtime exits (one-shot mode, once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Mutable pieces of the core, borrowed together by the handlers.
pub(crate) struct CoreState<'a> {
    pub registry: &'a TaskRegistry,
    pub scheduler: &'a mut Scheduler,
    pub queue: &'a mut TriggerQueue,
    pub options: &'a RuntimeOptions,
    /// Failed step names accumulated for the run in progress.
    pub run_failures: &'a mut Vec<TaskName>,
}

/// Handle a task trigger.
///
/// - Idle: start a run for this task right away.
/// - Busy: hand it to the trigger queue.
pub(crate) fn handle_task_trigger(
    state: CoreState<'_>,
    task: TaskName,
    reason: TriggerReason,
) -> CoreStep {
    if !state.scheduler.is_idle() {
        info!(task = %task, ?reason, "run in progress; queueing trigger");
        state.queue.record_trigger(&task);
        return CoreStep {
            commands: Vec::new(),
            keep_running: true,
        };
    }

    info!(task = %task, ?reason, "trigger received");
    let mut commands = Vec::new();
    start_run(state.registry, state.scheduler, state.run_failures, vec![task], &mut commands);
    finish(state, commands)
}

/// Handle a step completion.
pub(crate) fn handle_task_completion(
    state: CoreState<'_>,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();
    let step = state.scheduler.handle_completion(&task, outcome);
    absorb_step(state.scheduler, state.run_failures, step, &mut commands);
    finish(state, commands)
}

/// Start queued runs while idle, then decide whether to keep running.
fn finish(state: CoreState<'_>, mut commands: Vec<CoreCommand>) -> CoreStep {
    while state.scheduler.is_idle() {
        let Some(batch) = state.queue.next_batch() else {
            break;
        };
        start_run(state.registry, state.scheduler, state.run_failures, batch, &mut commands);
    }

    let mut keep_running = true;
    if state.options.exit_when_idle && state.scheduler.is_idle() && state.queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Plan `targets` and start a run. A plan that cannot be built counts as a
/// failed run of its own.
fn start_run(
    registry: &TaskRegistry,
    scheduler: &mut Scheduler,
    run_failures: &mut Vec<TaskName>,
    targets: Vec<TaskName>,
    commands: &mut Vec<CoreCommand>,
) {
    match ExecutionPlan::for_targets(registry, &targets) {
        Ok(plan) => {
            run_failures.clear();
            let step = scheduler.start_run(plan);
            absorb_step(scheduler, run_failures, step, commands);
        }
        Err(err) => {
            error!(?targets, error = %err, "could not plan triggered tasks");
            commands.push(CoreCommand::RunFinished {
                run_id: 0,
                failed: targets,
            });
        }
    }
}

fn absorb_step(
    scheduler: &Scheduler,
    run_failures: &mut Vec<TaskName>,
    step: SchedulerStep,
    commands: &mut Vec<CoreCommand>,
) {
    run_failures.extend(step.newly_failed);

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    if step.run_just_finished {
        let run_id = scheduler.last_run_id();
        commands.push(CoreCommand::RunFinished {
            run_id,
            failed: std::mem::take(run_failures),
        });
    }
}
