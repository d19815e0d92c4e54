//! Command execution traits
//!
//! Code that shells out depends on `CommandRunner` rather than on
//! `ProcessExecutor` directly, so it can be driven by a fake in tests.

use async_trait::async_trait;
use std::sync::Arc;

use super::process::{ProcessError, ProcessExecutor, ProcessOptions};

/// Trait for running external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs a command to completion and returns its buffered stdout
    ///
    /// # Errors
    ///
    /// Fails when the command cannot be spawned or exits non-zero.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<String, ProcessError>;
}

#[async_trait]
impl CommandRunner for ProcessExecutor {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<String, ProcessError> {
        ProcessExecutor::run(self, program, args, options).await
    }
}

#[async_trait]
impl<T: CommandRunner + ?Sized> CommandRunner for Arc<T> {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &ProcessOptions,
    ) -> Result<String, ProcessError> {
        (**self).run(program, args, options).await
    }
}
