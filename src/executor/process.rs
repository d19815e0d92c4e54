//! Process execution with streamed output
//!
//! This module spawns external commands and forwards their output to the
//! log while they run:
//!
//! - Every stdout/stderr line is logged as soon as it is complete
//! - stdout is buffered only when the caller asks for it
//! - stderr is always kept so a failure can report it
//! - Any non-zero exit status is an error
//!
//! There is no timeout, retry or cancellation: a spawned process always runs
//! to completion.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Read size for child output pipes
const CHUNK_SIZE: usize = 8 * 1024;

/// Errors raised while running an external process
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The process could not be started
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        /// Program that was requested.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully
    #[error("'{program}' exited with code {code}: {}", .stderr.trim())]
    NonZeroExit {
        /// Program that failed.
        program: String,
        /// Exit code, or -1 when terminated by a signal.
        code: i32,
        /// Everything the process wrote to stderr.
        stderr: String,
    },

    /// Reading output or waiting for the process failed
    #[error("I/O error while running '{program}': {source}")]
    Io {
        /// Program being run.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Returns the exit code when the process ran and failed
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn io(program: &str, source: std::io::Error) -> Self {
        Self::Io {
            program: program.to_string(),
            source,
        }
    }
}

/// Options for a single process invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Buffer stdout and return it on success
    pub resolve_stdout: bool,

    /// Working directory (inherits the current one when `None`)
    pub cwd: Option<PathBuf>,
}

impl ProcessOptions {
    /// Options that return the buffered stdout
    #[must_use]
    pub fn capture() -> Self {
        Self {
            resolve_stdout: true,
            cwd: None,
        }
    }

    /// Sets the working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Which pipe a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

/// Accumulates the chunks read from one pipe
///
/// When `keep` is false chunks are dropped after logging and the buffer
/// stays empty.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    keep: bool,
    bytes: Vec<u8>,
}

impl OutputBuffer {
    /// Creates a buffer that keeps chunks only if `keep` is set
    #[must_use]
    pub fn new(keep: bool) -> Self {
        Self {
            keep,
            bytes: Vec::new(),
        }
    }

    /// Appends a chunk in arrival order
    pub fn push(&mut self, chunk: &[u8]) {
        if self.keep {
            self.bytes.extend_from_slice(chunk);
        }
    }

    /// Decodes the accumulated bytes
    #[must_use]
    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Runs external commands on the tokio runtime
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    _private: (),
}

impl ProcessExecutor {
    /// Creates a new process executor
    #[must_use]
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Runs `program` with `args` and waits for it to exit
    ///
    /// Returns the buffered stdout on exit code 0 (empty unless
    /// `options.resolve_stdout` is set).
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::NonZeroExit` carrying the exit code and stderr
    /// when the process fails, or `Spawn`/`Io` when it cannot be run.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<String, ProcessError> {
        debug!(program, ?args, cwd = ?options.cwd, "Spawning process");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            ProcessError::io(program, std::io::Error::other("stdout was not piped"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            ProcessError::io(program, std::io::Error::other("stderr was not piped"))
        })?;

        // Both pipes are drained while waiting so a chatty child cannot block.
        let (out, err, status) = tokio::join!(
            pump(stdout, OutputStream::Stdout, OutputBuffer::new(options.resolve_stdout)),
            pump(stderr, OutputStream::Stderr, OutputBuffer::new(true)),
            child.wait(),
        );

        let status = status.map_err(|e| ProcessError::io(program, e))?;
        let out = out.map_err(|e| ProcessError::io(program, e))?;
        let err = err.map_err(|e| ProcessError::io(program, e))?;

        check_status(program, status, err.into_string())?;
        debug!(program, "Process exited successfully");

        Ok(out.into_string())
    }
}

fn check_status(program: &str, status: ExitStatus, stderr: String) -> Result<(), ProcessError> {
    if status.success() {
        return Ok(());
    }
    let code = status.code().unwrap_or(-1);
    warn!(program, code, "Process exited with non-zero status");
    Err(ProcessError::NonZeroExit {
        program: program.to_string(),
        code,
        stderr,
    })
}

/// Splits a byte stream into lines as chunks arrive
///
/// Bytes after the last newline are held back until the next chunk, so a
/// line (or a UTF-8 character) split across reads is logged whole. Empty
/// lines are kept.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    /// Appends `chunk` and returns every line it completes, without the
    /// line terminator
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Returns the trailing line that had no newline, if any
    fn finish(self) -> Option<String> {
        (!self.pending.is_empty()).then(|| decode_line(&self.pending))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads `reader` to EOF, logging each line and collecting the raw chunks
/// into `buffer`
async fn pump<R>(
    mut reader: R,
    stream: OutputStream,
    mut buffer: OutputBuffer,
) -> std::io::Result<OutputBuffer>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut lines = LineSplitter::default();
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        for line in lines.push(&chunk[..n]) {
            log_line(stream, &line);
        }
        buffer.push(&chunk[..n]);
    }
    if let Some(line) = lines.finish() {
        log_line(stream, &line);
    }
    Ok(buffer)
}

fn log_line(stream: OutputStream, line: &str) {
    match stream {
        OutputStream::Stdout => info!(target: "child::stdout", "{}", line),
        OutputStream::Stderr => warn!(target: "child::stderr", "{}", line),
    }
}
