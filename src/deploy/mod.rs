//! Deploy domain
//!
//! Metadata collection, build configuration and the publish sequence,
//! along with the traits the external builder and version control sit
//! behind.

mod artifact;
mod build_config;
mod errors;
mod metadata;
mod publisher;
mod tag;
mod vcs;

pub use artifact::{
    ArtifactBuilder, ArtifactListUtil, ArtifactLocation, ArtifactType, BuilderFactory,
    ListUtilFactory,
};
pub use build_config::BuildConfig;
pub use errors::{DeployError, TagError};
pub use metadata::{BuildMetadata, GithubData, MetadataCollector, RunInfo, iso_timestamp};
pub use publisher::{BUILD_GROUP, DONE_NOTICE, PublishOptions, PublishReport, Publisher};
pub use tag::ReleaseTag;
pub use vcs::{GitCli, VersionControl, split_tags};
