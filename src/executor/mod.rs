//! Process execution layer
//!
//! This module spawns the external commands the deploy step relies on
//! (`git`, the artifact builder) and streams their output to the log.

mod process;
mod traits;

pub use process::{OutputBuffer, OutputStream, ProcessError, ProcessExecutor, ProcessOptions};
pub use traits::CommandRunner;
