//! Build configuration handed to the artifact builder

use serde::Serialize;

use super::artifact::ArtifactType;
use super::metadata::BuildMetadata;
use crate::infrastructure::DeployEnv;

/// Configuration for one artifact build
///
/// Missing environment values stay `None` and are left out of the
/// serialized form; the builder validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Directory to package
    pub source: String,

    /// Artifact namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Artifact slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Artifact version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Artifact type, always `task-scripts`
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,

    /// Also push the image to the container registry
    #[serde(rename = "pushToEcr")]
    pub push_to_registry: bool,

    /// Provenance recorded with the artifact
    pub build_record_meta: BuildMetadata,

    /// Whether the builder updates the artifact list itself
    pub should_update_list: bool,

    /// Whether the builder stores its build log
    pub save_build_log: bool,

    /// SSH key used to fetch private dependencies
    pub ssh_private_key_path: String,
}

impl BuildConfig {
    /// Merges environment settings with the collected metadata
    #[must_use]
    pub fn assemble(env: &DeployEnv, meta: &BuildMetadata) -> Self {
        Self {
            source: ".".to_string(),
            namespace: env.namespace.clone(),
            slug: env.slug.clone(),
            version: env.version.clone(),
            artifact_type: ArtifactType::TaskScripts,
            push_to_registry: env.push_to_registry(),
            build_record_meta: meta.clone(),
            should_update_list: false,
            save_build_log: true,
            ssh_private_key_path: env.ssh_private_key_path().to_string(),
        }
    }
}
