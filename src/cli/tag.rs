//! `deploy-task-script validate-tag` - check a release tag
//!
//! A tag passes when it parses as a semantic version (optionally prefixed
//! with `v`), does not already exist and is not in the `0.0.x` range kept
//! for pull request builds.

use anyhow::{Context, Result};
use task_script_deploy::{GitCli, ProcessExecutor, ReleaseTag, VersionControl};

/// Validates `tag` against the tags of the current repository
pub async fn validate_tag(tag: &str) -> Result<()> {
    let git = GitCli::new(ProcessExecutor::new());
    let existing = git.all_tags().await.context("Failed to list tags")?;

    check(tag, &existing)?;
    println!("Tag {tag} is valid");
    Ok(())
}

fn check(tag: &str, existing: &[String]) -> Result<ReleaseTag> {
    let release = ReleaseTag::parse(tag)?;
    release.validate(existing)?;
    tracing::debug!(tag, version = %release.version(), "Release tag accepted");
    Ok(release)
}
