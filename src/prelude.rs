//! Prelude module for common imports

// Re-export deploy types
pub use crate::deploy::{
    ArtifactBuilder, ArtifactListUtil, ArtifactLocation, ArtifactType, BuildConfig,
    BuildMetadata, BuilderFactory, DeployError, GitCli, ListUtilFactory, MetadataCollector,
    PublishOptions, PublishReport, Publisher, ReleaseTag, TagError, VersionControl,
};

// Re-export executor types
pub use crate::executor::{CommandRunner, ProcessError, ProcessExecutor, ProcessOptions};

// Re-export infrastructure types
pub use crate::infrastructure::{
    CliBuilderFactory, CliListUtilFactory, DeployEnv, RunTimings, WorkflowCommands,
};
