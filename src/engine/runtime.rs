// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::errors::{Result, SitepipeError};
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent, TaskName};

/// Drives the scheduler in response to `RuntimeEvent`s and delegates the
/// actual pipeline work to an `ExecutorBackend`.
///
/// All runtime semantics live in `CoreRuntime`; this struct only reads
/// events from the channel and carries out the commands the core returns.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    /// Failed steps of the most recent finished run, if it failed.
    last_failure: Option<Vec<TaskName>>,
    interrupted: bool,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
            last_failure: None,
            interrupted: false,
        }
    }

    /// Main event loop.
    ///
    /// Returns `TaskFailed` if shutdown interrupted a run, or if the last
    /// run that finished had a failed step. Long-lived (watch) runtimes log
    /// failures as they happen, and a later successful run clears them.
    pub async fn run(mut self) -> Result<()> {
        info!("sitepipe runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        if self.interrupted {
            return Err(SitepipeError::TaskFailed("interrupted".to_string()));
        }
        match self.last_failure.take() {
            Some(failed) => Err(SitepipeError::TaskFailed(failed.join(", "))),
            None => Ok(()),
        }
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
            CoreCommand::RunFinished { run_id, failed } => {
                if failed.is_empty() {
                    info!(run_id, "run completed successfully");
                    self.last_failure = None;
                } else {
                    error!(run_id, ?failed, "run finished with failures");
                    self.last_failure = Some(failed);
                }
            }
            CoreCommand::RunInterrupted { run_id } => {
                error!(run_id, "run interrupted before completion");
                self.interrupted = true;
            }
            CoreCommand::RequestExit => debug!("core issued RequestExit"),
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, run_id = tasks[0].run_id, "dispatching ready steps");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
