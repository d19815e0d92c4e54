//! GitHub Actions workflow commands
//!
//! Writes the `::group::`, `::endgroup::` and `::notice::` commands the
//! Actions runner turns into collapsible log sections and annotations.

use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::warn;

/// Emits workflow commands to a writer (stdout by default)
pub struct WorkflowCommands {
    out: Mutex<Box<dyn Write + Send>>,
}

impl WorkflowCommands {
    /// Writes commands to stdout, where the runner picks them up
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Writes commands to `out`
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Opens a collapsible log group
    pub fn group(&self, title: &str) {
        self.emit("group", title);
    }

    /// Closes the current log group
    pub fn end_group(&self) {
        self.emit("endgroup", "");
    }

    /// Adds a notice annotation to the run
    pub fn notice(&self, message: &str) {
        self.emit("notice", message);
    }

    fn emit(&self, command: &str, message: &str) {
        let line = format!("::{command}::{}\n", escape_data(message));
        let mut out = self.out.lock();
        let written = out.write_all(line.as_bytes());
        if let Err(e) = written.and_then(|()| out.flush()) {
            warn!(command, error = %e, "Failed to write workflow command");
        }
    }
}

impl std::fmt::Debug for WorkflowCommands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowCommands").finish_non_exhaustive()
    }
}

/// Escapes a command message the way the runner expects
fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SharedBuffer;

    #[test]
    fn test_group_and_notice() {
        let buffer = SharedBuffer::default();
        let commands = WorkflowCommands::new(buffer.clone());

        commands.group("build it");
        commands.end_group();
        commands.notice("all done!");

        assert_eq!(
            buffer.contents(),
            "::group::build it\n::endgroup::\n::notice::all done!\n"
        );
    }

    #[test]
    fn test_message_is_escaped() {
        let buffer = SharedBuffer::default();
        let commands = WorkflowCommands::new(buffer.clone());

        commands.notice("100% done\nnext line\r");

        assert_eq!(buffer.contents(), "::notice::100%25 done%0Anext line%0D\n");
    }
}
