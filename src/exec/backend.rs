// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running pipelines
//! itself. Production code uses [`PipelineExecutor`]; tests provide their own
//! backend that records dispatched steps and emits `TaskCompleted` events
//! directly.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::Result;
use crate::pipeline::{PipelineContext, run_action};

/// Trait abstracting how scheduled steps are executed.
pub trait ExecutorBackend: Send {
    /// Start the given steps. Each one must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs every step's pipeline on its own Tokio task so independent steps of
/// a run proceed concurrently.
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    ctx: Arc<PipelineContext>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl PipelineExecutor {
    pub fn new(ctx: Arc<PipelineContext>, runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { ctx, runtime_tx }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for task in tasks {
                let ctx = Arc::clone(&self.ctx);
                let tx = self.runtime_tx.clone();
                tokio::spawn(run_step(task, ctx, tx));
            }
            Ok(())
        })
    }
}

async fn run_step(task: ScheduledTask, ctx: Arc<PipelineContext>, tx: mpsc::Sender<RuntimeEvent>) {
    info!(task = %task.name, run_id = task.run_id, "starting");

    let outcome = match run_action(task.action, &ctx).await {
        Ok(()) => {
            info!(task = %task.name, run_id = task.run_id, "finished");
            TaskOutcome::Success
        }
        Err(err) => {
            error!(task = %task.name, run_id = task.run_id, error = %err, "step failed");
            TaskOutcome::Failed(err.to_string())
        }
    };

    if tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %task.name, "runtime gone; dropping completion");
    }
}
