// src/exec/tool.rs

//! External tool invocation.

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{Result, SitepipeError};

/// One invocation of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    /// Bytes piped to the program's stdin. `None` leaves stdin closed.
    pub stdin: Option<Vec<u8>>,
}

impl ToolInvocation {
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            argv,
            cwd: cwd.into(),
            env: Vec::new(),
            stdin: None,
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    /// Program name, used in logs and errors.
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or("")
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
}

/// Seam over process spawning so pipelines can be tested without the real
/// toolchain installed.
pub trait ToolRunner: Send + Sync + Debug {
    /// Run the program to completion. A non-zero exit is reported as
    /// [`SitepipeError::ToolFailed`].
    fn run(
        &self,
        invocation: ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>>;
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner;

impl ToolRunner for SystemToolRunner {
    fn run(
        &self,
        invocation: ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>> {
        Box::pin(run_process(invocation))
    }
}

async fn run_process(invocation: ToolInvocation) -> Result<ToolOutput> {
    let Some((program, args)) = invocation.argv.split_first() else {
        return Err(SitepipeError::ConfigError(
            "tool command is empty".to_string(),
        ));
    };

    info!(tool = %program, ?args, cwd = ?invocation.cwd, "starting tool");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(&invocation.cwd)
        .envs(invocation.env.iter().map(|(k, v)| (k, v)))
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning `{program}`"))?;

    // Feed stdin from a separate task so a chatty tool cannot deadlock on a
    // full stdout pipe while we are still writing.
    let writer = match (child.stdin.take(), invocation.stdin) {
        (Some(mut stdin), Some(input)) => Some(tokio::spawn(async move {
            let res = stdin.write_all(&input).await;
            drop(stdin);
            res
        })),
        _ => None,
    };

    let output = child
        .wait_with_output()
        .await
        .with_context(|| format!("waiting for `{program}`"))?;

    if let Some(writer) = writer {
        match writer.await {
            Ok(Err(e)) => debug!(tool = %program, error = %e, "stdin closed early"),
            Err(e) => debug!(tool = %program, error = %e, "stdin writer task failed"),
            Ok(Ok(())) => {}
        }
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    for line in stderr.lines() {
        debug!(tool = %program, "stderr: {}", line);
    }

    let code = output.status.code().unwrap_or(-1);
    info!(tool = %program, exit_code = code, success = output.status.success(), "tool exited");

    if !output.status.success() {
        return Err(SitepipeError::ToolFailed {
            tool: program.clone(),
            code,
            stderr,
        });
    }

    Ok(ToolOutput {
        stdout: output.stdout,
    })
}
