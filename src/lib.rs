//! # task-script-deploy
//!
//! The deploy step of the task-scripts CI workflow. It records where a
//! build came from (commit, tags, CI run), assembles the configuration for
//! the artifact builder, hands the build to that builder and reads back the
//! artifact list from object storage.
//!
//! ## Layout
//!
//! - [`executor`]: spawns external commands and streams their output to the log
//! - [`deploy`]: metadata, build configuration and the publish sequence
//! - [`infrastructure`]: environment, logging, timing and CI/builder adapters
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use task_script_deploy::prelude::*;
//!
//! # async fn run() -> Result<(), DeployError> {
//! let env = DeployEnv::from_env();
//! let runner = ProcessExecutor::new();
//! let collector = MetadataCollector::new(GitCli::new(runner.clone()), &env);
//! let publisher = Publisher::new(
//!     env.clone(),
//!     collector,
//!     Arc::new(CliBuilderFactory::from_env(runner.clone(), &env)?),
//!     Arc::new(CliListUtilFactory::from_env(runner, &env)?),
//! );
//! let report = publisher.publish(PublishOptions::default()).await?;
//! println!("{}", report.metadata.commit);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod deploy;
pub mod executor;
pub mod infrastructure;

// Prelude module for common imports
pub mod prelude;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use deploy::{
    BuildConfig, BuildMetadata, DeployError, GitCli, MetadataCollector, PublishOptions,
    PublishReport, Publisher, ReleaseTag, TagError, VersionControl,
};
pub use executor::{CommandRunner, ProcessError, ProcessExecutor, ProcessOptions};
pub use infrastructure::{
    CliBuilderFactory, CliListUtilFactory, DeployEnv, WorkflowCommands, init_logging,
};

/// Version of the task-script-deploy crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
