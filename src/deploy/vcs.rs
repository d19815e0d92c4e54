//! Version control queries
//!
//! The metadata collector needs three answers from the repository: the
//! short hash of HEAD, the tags pointing at HEAD and (for tag validation)
//! every tag. `GitCli` answers them by running `git` through a
//! [`CommandRunner`].

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::errors::DeployError;
use crate::executor::{CommandRunner, ProcessOptions};

/// Trait for the version control queries used by the deploy step
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Returns the abbreviated hash of HEAD
    async fn short_head(&self) -> Result<String, DeployError>;

    /// Returns the tags pointing at HEAD
    ///
    /// The output is split on newlines without filtering, so a HEAD with no
    /// tags yields `[""]`.
    async fn tags_at_head(&self) -> Result<Vec<String>, DeployError>;

    /// Returns every tag in the repository
    async fn all_tags(&self) -> Result<Vec<String>, DeployError>;
}

#[async_trait]
impl<T: VersionControl + ?Sized> VersionControl for Arc<T> {
    async fn short_head(&self) -> Result<String, DeployError> {
        (**self).short_head().await
    }

    async fn tags_at_head(&self) -> Result<Vec<String>, DeployError> {
        (**self).tags_at_head().await
    }

    async fn all_tags(&self) -> Result<Vec<String>, DeployError> {
        (**self).all_tags().await
    }
}

/// `git` command line client
#[derive(Debug, Clone)]
pub struct GitCli<R> {
    runner: R,
    program: String,
    workdir: Option<PathBuf>,
}

impl<R: CommandRunner> GitCli<R> {
    /// Creates a client running `git` in the current directory
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            program: "git".to_string(),
            workdir: None,
        }
    }

    /// Runs queries inside `dir` instead of the current directory
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    async fn query(&self, query: &'static str, args: &[&str]) -> Result<String, DeployError> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        let mut options = ProcessOptions::capture();
        if let Some(dir) = &self.workdir {
            options = options.with_cwd(dir);
        }

        debug!(query, "Querying git");
        self.runner
            .run(&self.program, &args, &options)
            .await
            .map_err(|source| DeployError::VersionControl { query, source })
    }
}

#[async_trait]
impl<R: CommandRunner> VersionControl for GitCli<R> {
    async fn short_head(&self) -> Result<String, DeployError> {
        let out = self
            .query("rev-parse --short HEAD", &["rev-parse", "--short", "HEAD"])
            .await?;
        Ok(out.trim().to_string())
    }

    async fn tags_at_head(&self) -> Result<Vec<String>, DeployError> {
        let out = self
            .query("tag --points-at HEAD", &["tag", "--points-at", "HEAD"])
            .await?;
        Ok(split_tags(&out))
    }

    async fn all_tags(&self) -> Result<Vec<String>, DeployError> {
        let out = self.query("tag", &["tag"]).await?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

/// Splits `git tag` output into tag names
///
/// Empty output is not normalized and produces a single empty entry.
#[must_use]
pub fn split_tags(output: &str) -> Vec<String> {
    output.trim().split('\n').map(String::from).collect()
}
