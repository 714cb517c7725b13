use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use sitepipe::errors::{Result, SitepipeError};
use sitepipe::exec::{ToolInvocation, ToolOutput, ToolRunner};

type Handler = dyn Fn(&ToolInvocation) -> Result<ToolOutput> + Send + Sync;

/// Records every invocation and answers with a programmable handler instead
/// of spawning processes.
#[derive(Clone)]
pub struct FakeToolRunner {
    calls: Arc<Mutex<Vec<ToolInvocation>>>,
    handler: Arc<Handler>,
}

impl fmt::Debug for FakeToolRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeToolRunner")
            .field("calls", &self.calls.lock().map(|c| c.len()).unwrap_or(0))
            .finish_non_exhaustive()
    }
}

impl Default for FakeToolRunner {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl FakeToolRunner {
    pub fn with_handler(
        handler: impl Fn(&ToolInvocation) -> Result<ToolOutput> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            handler: Arc::new(handler),
        }
    }

    /// Filters echo stdin; tools without stdin print `/* <program> */`.
    pub fn passthrough() -> Self {
        Self::with_handler(|inv| {
            let stdout = match &inv.stdin {
                Some(input) => input.clone(),
                None => format!("/* {} */", inv.program()).into_bytes(),
            };
            Ok(ToolOutput { stdout })
        })
    }

    /// Every tool whose program is `program` exits with `code`.
    pub fn failing(program: &'static str, code: i32) -> Self {
        let ok = Self::passthrough();
        Self::with_handler(move |inv| {
            if inv.program() == program {
                Err(SitepipeError::ToolFailed {
                    tool: program.to_string(),
                    code,
                    stderr: "fake failure".to_string(),
                })
            } else {
                (ok.handler)(inv)
            }
        })
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Full argv of every call, joined with spaces.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.argv.join(" ")).collect()
    }
}

impl ToolRunner for FakeToolRunner {
    fn run(
        &self,
        invocation: ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>> {
        self.calls.lock().unwrap().push(invocation.clone());
        let result = (self.handler)(&invocation);
        Box::pin(async move { result })
    }
}
