//! Build record metadata
//!
//! Provenance attached to every published artifact: the commit it was
//! built from, the tags on that commit, the CI run that produced it and
//! when it was created.
//!
//! [`MetadataCollector`] computes this at most once. Concurrent callers
//! wait on the same in-flight computation and every caller receives the
//! same outcome: the same `Arc` on success, the same shared error on
//! failure.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::errors::DeployError;
use super::vcs::VersionControl;
use crate::infrastructure::{DeployEnv, GithubEnv};

/// Provenance of a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildMetadata {
    /// Short commit hash
    pub commit: String,

    /// ISO-8601 creation time
    pub created_at: String,

    /// CI run identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_data: Option<GithubData>,

    /// Tags pointing at the commit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// GitHub Actions run that produced a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubData {
    /// Always true; marks the build as produced by an action
    pub action: bool,
    /// Job name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    /// Run identifiers
    pub run: RunInfo,
    /// `owner/name` of the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Full commit SHA that triggered the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Workflow run identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    /// Unique run id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Per-workflow run number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Attempt number within the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<String>,
}

impl From<&GithubEnv> for GithubData {
    fn from(env: &GithubEnv) -> Self {
        Self {
            action: true,
            job: env.job.clone(),
            run: RunInfo {
                id: env.run_id.clone(),
                number: env.run_number.clone(),
                attempt: env.run_attempt.clone(),
            },
            repository: env.repository.clone(),
            sha: env.sha.clone(),
        }
    }
}

/// Formats a timestamp like `2024-05-01T12:30:00.123Z`
#[must_use]
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Collects [`BuildMetadata`] once per run
pub struct MetadataCollector<V> {
    vcs: V,
    commit_override: Option<String>,
    github: Option<GithubEnv>,
    cell: OnceCell<Result<Arc<BuildMetadata>, Arc<DeployError>>>,
}

impl<V: VersionControl> MetadataCollector<V> {
    /// Creates a collector reading CI identifiers and the commit override
    /// from `env`
    pub fn new(vcs: V, env: &DeployEnv) -> Self {
        Self {
            vcs,
            commit_override: env.commit.clone(),
            github: env.github.clone(),
            cell: OnceCell::new(),
        }
    }

    /// Returns the version control client
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Returns the metadata, computing it on the first call
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Metadata` wrapping the version control failure
    /// of the first attempt. The failure is stored, so later calls return it
    /// without querying again.
    pub async fn collect(&self) -> Result<Arc<BuildMetadata>, DeployError> {
        let outcome = self
            .cell
            .get_or_init(|| async { self.compute().await.map_err(Arc::new) })
            .await;
        match outcome {
            Ok(meta) => Ok(Arc::clone(meta)),
            Err(e) => Err(DeployError::Metadata(Arc::clone(e))),
        }
    }

    /// Returns the metadata if it has been computed successfully
    pub fn get(&self) -> Option<Arc<BuildMetadata>> {
        self.cell.get().and_then(|outcome| outcome.as_ref().ok()).cloned()
    }

    async fn compute(&self) -> Result<Arc<BuildMetadata>, DeployError> {
        let commit = match &self.commit_override {
            Some(commit) => {
                debug!(commit, "Using commit from environment");
                commit.clone()
            }
            None => self.vcs.short_head().await?,
        };

        let tags = self.vcs.tags_at_head().await?;
        info!("Found tags that point at HEAD: {}", tags.join(","));

        Ok(Arc::new(BuildMetadata {
            commit,
            created_at: iso_timestamp(Utc::now()),
            github_data: self.github.as_ref().map(GithubData::from),
            tags: Some(tags),
        }))
    }
}

impl<V> std::fmt::Debug for MetadataCollector<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCollector")
            .field("commit_override", &self.commit_override)
            .field("github", &self.github)
            .field("collected", &self.cell.initialized())
            .finish_non_exhaustive()
    }
}
