//! Test doubles shared by unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use crate::executor::{CommandRunner, ProcessError, ProcessOptions};

/// A command invocation seen by [`ScriptedRunner`]
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub command_line: String,
    pub options: ProcessOptions,
}

#[derive(Debug, Clone)]
enum Response {
    Stdout(String),
    Fail { code: i32, stderr: String },
}

/// Runner that answers from a script keyed by the full command line
///
/// Unscripted commands succeed with empty output.
#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command_line: &str, stdout: &str) -> Self {
        self.responses
            .insert(command_line.to_string(), Response::Stdout(stdout.to_string()));
        self
    }

    pub fn fail(mut self, command_line: &str, code: i32, stderr: &str) -> Self {
        self.responses.insert(
            command_line.to_string(),
            Response::Fail {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Sleeps before answering, so callers overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, command_line: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.command_line == command_line)
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<String, ProcessError> {
        let command_line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        self.calls.lock().push(RecordedCall {
            command_line: command_line.clone(),
            options: options.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(&command_line) {
            Some(Response::Fail { code, stderr }) => Err(ProcessError::NonZeroExit {
                program: program.to_string(),
                code: *code,
                stderr: stderr.clone(),
            }),
            Some(Response::Stdout(out)) if options.resolve_stdout => Ok(out.clone()),
            _ => Ok(String::new()),
        }
    }
}

/// Writer whose contents can be inspected after being moved into a
/// `WorkflowCommands`
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
