//! Error types for the deploy domain

use std::sync::Arc;
use thiserror::Error;

use crate::executor::ProcessError;

/// Errors that can occur while collecting metadata or publishing artifacts
#[derive(Error, Debug)]
pub enum DeployError {
    /// Metadata collection failed
    ///
    /// The collector stores its first failure and hands the same error to
    /// every caller.
    #[error("Failed to collect build metadata")]
    Metadata(#[source] Arc<DeployError>),

    /// A version control query failed
    #[error("Version control query '{query}' failed")]
    VersionControl {
        /// The query that was run, e.g. `rev-parse --short HEAD`.
        query: &'static str,
        /// The underlying process failure.
        #[source]
        source: ProcessError,
    },

    /// The artifact builder failed
    #[error("Artifact builder {operation} failed")]
    Builder {
        /// Builder operation that failed.
        operation: &'static str,
        /// The underlying process failure.
        #[source]
        source: ProcessError,
    },

    /// The artifact list utility failed
    #[error("Artifact list {operation} failed")]
    ArtifactList {
        /// List operation that failed.
        operation: &'static str,
        /// The underlying process failure.
        #[source]
        source: ProcessError,
    },

    /// The builder command line could not be parsed
    #[error("Invalid artifact builder command '{command}': {reason}")]
    BuilderCommand {
        /// The command line as configured.
        command: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A setting required by the builder is missing
    #[error("Missing required setting {0}")]
    MissingSetting(&'static str),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Release tag validation failed
    #[error(transparent)]
    Tag(#[from] TagError),
}

/// Release tag validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The tag is not a semantic version
    #[error("Tag '{tag}' is not a valid semantic version: {reason}")]
    InvalidVersion {
        /// The tag as given.
        tag: String,
        /// Parser message.
        reason: String,
    },

    /// The tag already exists in the repository
    #[error("Tag {0} already exists")]
    AlreadyExists(String),

    /// 0.0.x versions are reserved for pull request builds
    #[error("Tag {0} is reserved for pull requests: major and minor version cannot both be zero")]
    ReservedForPullRequest(String),
}
