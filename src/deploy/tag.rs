//! Release tag validation
//!
//! A release tag is a semantic version with an optional leading `v`. It is
//! accepted only if it does not exist yet and is not a `0.0.x` version,
//! which is reserved for pull request builds.

use semver::Version;

use super::errors::TagError;

/// A parsed release tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    raw: String,
    version: Version,
}

impl ReleaseTag {
    /// Parses `tag`, accepting an optional `v` prefix
    ///
    /// # Errors
    ///
    /// Returns `TagError::InvalidVersion` when the rest is not semver.
    pub fn parse(tag: &str) -> Result<Self, TagError> {
        let tag = tag.trim();
        let version = Version::parse(strip_v(tag)).map_err(|e| TagError::InvalidVersion {
            tag: tag.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: tag.to_string(),
            version,
        })
    }

    /// The tag as given
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed version
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Checks the tag against the tags already in the repository
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` or `ReservedForPullRequest`.
    pub fn validate(&self, existing: &[String]) -> Result<(), TagError> {
        self.ensure_new(existing)?;
        self.ensure_not_reserved()
    }

    fn ensure_new(&self, existing: &[String]) -> Result<(), TagError> {
        // v1.2.3 and 1.2.3 name the same release.
        let taken = existing
            .iter()
            .filter_map(|t| Version::parse(strip_v(t.trim())).ok())
            .any(|v| v == self.version);
        if taken {
            return Err(TagError::AlreadyExists(self.version.to_string()));
        }
        Ok(())
    }

    fn ensure_not_reserved(&self) -> Result<(), TagError> {
        if self.version.major == 0 && self.version.minor == 0 {
            return Err(TagError::ReservedForPullRequest(self.version.to_string()));
        }
        Ok(())
    }
}

fn strip_v(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}
