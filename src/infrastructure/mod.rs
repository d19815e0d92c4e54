//! Infrastructure layer
//!
//! Environment configuration, logging, timing and the adapters that talk
//! to the CI runner and the artifact builder.

mod builder_cli;
mod config;
mod github_actions;
mod logging;
mod timing;

pub use builder_cli::{
    BuilderCommand, CliArtifactBuilder, CliBuilderFactory, CliListUtil, CliListUtilFactory,
};
pub use config::{
    DEFAULT_ARTIFACT_ENDPOINT, DEFAULT_BUILDER_COMMAND, DEFAULT_LOG_LEVEL, DEFAULT_SSH_KEY_PATH,
    DeployEnv, GithubEnv,
};
pub use github_actions::WorkflowCommands;
pub use logging::init_logging;
pub use timing::{RunTimings, Timing};
