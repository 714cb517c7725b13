// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{BuildConfig, resolve_config};
use crate::dag::{ExecutionPlan, TaskAction, TaskRegistry};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::{Result, SitepipeError};
use crate::exec::{PipelineExecutor, SystemToolRunner, ToolRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::PipelineContext;
use crate::serve::{ReloadHub, start_server};
use crate::watch::{build_watch_rules, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task registry and plan for the requested task
/// - scheduler / queue / runtime and the pipeline executor
/// - for `serve`: dev server, file watcher and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config = resolve_config(args.config.as_deref().map(Path::new), args.flags())?;
    let registry = Arc::new(TaskRegistry::standard()?);

    if args.list {
        print_task_list(&registry);
        return Ok(());
    }

    let plan = ExecutionPlan::for_targets(&registry, &[args.task.as_str()])?;
    if args.dry_run {
        print_dry_run(&config, &plan);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let tools: Arc<dyn ToolRunner> = Arc::new(SystemToolRunner);
    let ctx = PipelineContext::new(Arc::new(config), fs, tools);

    let serves = plan.steps().any(|s| s.action == TaskAction::Serve);
    if serves {
        serve(ctx, registry, &args.task).await
    } else {
        run_once(Arc::new(ctx), registry, &args.task).await
    }
}

/// Run `task` and its whole plan once, failing if any step fails.
pub async fn run_once(ctx: Arc<PipelineContext>, registry: Arc<TaskRegistry>, task: &str) -> Result<()> {
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let ctrl_c = spawn_ctrl_c(tx.clone());

    let core = new_core(&ctx.config, registry, false);
    let executor = PipelineExecutor::new(Arc::clone(&ctx), tx.clone());

    tx.send(RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::Manual,
    })
    .await
    .context("queueing initial trigger")?;

    let result = Runtime::new(core, rx, executor).run().await;
    ctrl_c.abort();
    result
}

/// Build, then serve the site and rebuild on change until Ctrl-C.
async fn serve(ctx: PipelineContext, registry: Arc<TaskRegistry>, task: &str) -> Result<()> {
    let hub = ReloadHub::new();
    let ctx = Arc::new(ctx.with_reload(hub.clone()));

    // An interrupted or failed initial build stops here, before the server
    // and watcher start.
    run_once(Arc::clone(&ctx), Arc::clone(&registry), task).await?;

    let (_addr, server) = start_server(&ctx.config, Arc::clone(&ctx.fs), hub).await?;

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let rules = build_watch_rules(&ctx.config)?;
    let _watcher = spawn_watcher(
        ctx.config.root().to_path_buf(),
        rules,
        ctx.config.watch.use_hash,
        tx.clone(),
    )?;
    let ctrl_c = spawn_ctrl_c(tx.clone());

    let core = new_core(&ctx.config, registry, true);
    let executor = PipelineExecutor::new(Arc::clone(&ctx), tx);
    let result = Runtime::new(core, rx, executor).run().await;

    server.abort();
    ctrl_c.abort();
    info!("dev server stopped");

    match result {
        // Failed or interrupted rebuilds were already reported as they
        // happened; Ctrl-C is the normal way to leave serve mode.
        Err(SitepipeError::TaskFailed(failed)) => {
            warn!(%failed, "some rebuilds failed during this session");
            Ok(())
        }
        other => other,
    }
}

fn new_core(config: &BuildConfig, registry: Arc<TaskRegistry>, watching: bool) -> CoreRuntime {
    CoreRuntime::new(
        registry,
        config.watch.triggered_while_running_behaviour,
        config.watch.queue_length,
        RuntimeOptions {
            exit_when_idle: !watching,
        },
    )
}

/// Ctrl-C → graceful shutdown.
fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    })
}

fn print_task_list(registry: &TaskRegistry) {
    println!("tasks:");
    for def in registry.iter() {
        println!("  {:<22} {}", def.name, def.description);
        if !def.deps.is_empty() {
            println!("  {:<22}   deps: {}", "", def.deps.join(", "));
        }
        for (i, phase) in def.sequence.iter().enumerate() {
            println!("  {:<22}   then[{i}]: {}", "", phase.join(", "));
        }
    }
}

/// Print the resolved plan in execution order.
fn print_dry_run(config: &BuildConfig, plan: &ExecutionPlan) {
    let flags = config.flags();
    println!("sitepipe dry-run");
    println!("  root = {:?}", config.root());
    println!("  production = {}", flags.production);
    println!("  drafts = {}", flags.drafts);
    println!("  targets = {:?}", plan.targets());
    println!();

    println!("steps ({}):", plan.len());
    for (i, step) in plan.steps().enumerate() {
        println!("  {:>2}. {} [{:?}]", i + 1, step.name, step.action);
        if !step.predecessors.is_empty() {
            let after: Vec<&str> = step.predecessors.iter().map(String::as_str).collect();
            println!("      after: {}", after.join(", "));
        }
    }
}
