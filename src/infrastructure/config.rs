//! Configuration management
//!
//! Every environment variable the deploy step consumes is read once into a
//! [`DeployEnv`] at startup and passed explicitly from there on.

use serde::Serialize;
use std::collections::HashMap;

/// Default object storage endpoint
pub const DEFAULT_ARTIFACT_ENDPOINT: &str = "s3.amazonaws.com";

/// Default artifact builder command line
pub const DEFAULT_BUILDER_COMMAND: &str = "ts-artifact-builder";

/// Default log filter
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// SSH key location used by the builder when `SSH_KEY_PATH` is not set
pub const DEFAULT_SSH_KEY_PATH: &str = "/root/.ssh/id_rsa";

/// Settings read from the process environment
///
/// Empty variables are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployEnv {
    /// `NAMESPACE`
    pub namespace: Option<String>,
    /// `SLUG`
    pub slug: Option<String>,
    /// `VERSION`
    pub version: Option<String>,
    /// `PUSH_TO_ECR`, raw value
    pub push_to_ecr: Option<String>,
    /// `ARTIFACT_BUCKET`
    pub artifact_bucket: Option<String>,
    /// `ARTIFACT_PREFIX`
    pub artifact_prefix: Option<String>,
    /// `ARTIFACT_ENDPOINT`
    pub artifact_endpoint: Option<String>,
    /// `ARTIFACT_BUILDER`
    pub builder_command: Option<String>,
    /// `SSH_KEY_PATH`
    pub ssh_key_path: Option<String>,
    /// `COMMIT`, overrides the hash reported by git
    pub commit: Option<String>,
    /// `DEPLOY_LOG`
    pub log_filter: Option<String>,
    /// GitHub Actions run identifiers, present when running under CI
    pub github: Option<GithubEnv>,
}

/// GitHub Actions run identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GithubEnv {
    /// `GITHUB_JOB`
    pub job: Option<String>,
    /// `GITHUB_RUN_ID`
    pub run_id: Option<String>,
    /// `GITHUB_RUN_NUMBER`
    pub run_number: Option<String>,
    /// `GITHUB_RUN_ATTEMPT`
    pub run_attempt: Option<String>,
    /// `GITHUB_SHA`
    pub sha: Option<String>,
    /// `GITHUB_REPOSITORY`
    pub repository: Option<String>,
}

impl GithubEnv {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl DeployEnv {
    /// Reads the current process environment
    ///
    /// Variables that are not valid UTF-8 are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let vars: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self::from_map(&vars)
    }

    /// Builds the settings from an explicit variable map
    #[must_use]
    pub fn from_map(vars: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let github = GithubEnv {
            job: get("GITHUB_JOB"),
            run_id: get("GITHUB_RUN_ID"),
            run_number: get("GITHUB_RUN_NUMBER"),
            run_attempt: get("GITHUB_RUN_ATTEMPT"),
            sha: get("GITHUB_SHA"),
            repository: get("GITHUB_REPOSITORY"),
        };

        Self {
            namespace: get("NAMESPACE"),
            slug: get("SLUG"),
            version: get("VERSION"),
            push_to_ecr: get("PUSH_TO_ECR"),
            artifact_bucket: get("ARTIFACT_BUCKET"),
            artifact_prefix: get("ARTIFACT_PREFIX"),
            artifact_endpoint: get("ARTIFACT_ENDPOINT"),
            builder_command: get("ARTIFACT_BUILDER"),
            ssh_key_path: get("SSH_KEY_PATH"),
            commit: get("COMMIT"),
            log_filter: get("DEPLOY_LOG"),
            github: (!github.is_empty()).then_some(github),
        }
    }

    /// Whether the artifact should also be pushed to the container registry
    #[must_use]
    pub fn push_to_registry(&self) -> bool {
        self.push_to_ecr.as_deref().is_some_and(is_truthy)
    }

    /// SSH private key handed to the builder
    #[must_use]
    pub fn ssh_private_key_path(&self) -> &str {
        self.ssh_key_path.as_deref().unwrap_or(DEFAULT_SSH_KEY_PATH)
    }

    /// Object storage endpoint
    #[must_use]
    pub fn artifact_endpoint(&self) -> &str {
        self.artifact_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ARTIFACT_ENDPOINT)
    }

    /// Artifact builder command line
    #[must_use]
    pub fn builder_command(&self) -> &str {
        self.builder_command
            .as_deref()
            .unwrap_or(DEFAULT_BUILDER_COMMAND)
    }

    /// Settings as one-line JSON, for the debug log
    #[must_use]
    pub fn describe(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Log filter, falling back to `info`
    #[must_use]
    pub fn log_level(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
