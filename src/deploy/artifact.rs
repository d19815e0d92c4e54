//! Artifact builder and artifact list seams
//!
//! Packaging, upload, registry push and artifact-list maintenance belong to
//! an external builder. The deploy step only talks to it through these
//! traits; `infrastructure::builder_cli` provides the command line backed
//! implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::build_config::BuildConfig;
use super::errors::DeployError;

/// Kind of artifact handled by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    /// Task script bundles
    TaskScripts,
}

impl ArtifactType {
    /// Wire name of the artifact type
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskScripts => "task-scripts",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where artifacts are stored
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocation {
    /// Object storage endpoint
    pub endpoint: String,
    /// Bucket name
    pub bucket: String,
    /// Key prefix inside the bucket
    pub prefix: String,
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.endpoint, self.bucket, self.prefix)
    }
}

/// A builder instantiated for one build configuration
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    /// Storage location the builder publishes to
    fn location(&self) -> ArtifactLocation;

    /// Packages the artifact and uploads it (and pushes to the registry
    /// when configured)
    async fn publish(&self) -> Result<(), DeployError>;
}

/// Creates builders from a build configuration
pub trait BuilderFactory: Send + Sync {
    /// Instantiates a builder for `config`
    ///
    /// # Errors
    ///
    /// Fails when the builder rejects the configuration.
    fn create(&self, config: BuildConfig) -> Result<Box<dyn ArtifactBuilder>, DeployError>;
}

/// Reads and maintains the artifact list at one storage location
#[async_trait]
pub trait ArtifactListUtil: Send + Sync {
    /// Scans storage for artifacts of `kind`
    async fn scan_artifacts(&self, kind: ArtifactType) -> Result<(), DeployError>;

    /// Reads the current artifact list for `kind`
    async fn read_artifact_list(&self, kind: ArtifactType)
    -> Result<serde_json::Value, DeployError>;
}

/// Opens an artifact list utility for a storage location
pub trait ListUtilFactory: Send + Sync {
    /// Opens the list at `location`
    fn open(&self, location: &ArtifactLocation) -> Box<dyn ArtifactListUtil>;
}
