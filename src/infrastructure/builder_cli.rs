//! Command line artifact builder
//!
//! Drives an external builder executable (`ARTIFACT_BUILDER`, default
//! `ts-artifact-builder`) through the process executor:
//!
//! | Operation | Invocation |
//! |-----------|------------|
//! | publish | `<builder> publish --config <json>` |
//! | scan | `<builder> list scan --type <t> --endpoint <e> --bucket <b> --prefix <p>` |
//! | read | `<builder> list read --type <t> --endpoint <e> --bucket <b> --prefix <p>` |
//!
//! `list read` prints the artifact list as JSON on stdout.

use async_trait::async_trait;
use tracing::{debug, info};

use super::config::DeployEnv;
use crate::deploy::{
    ArtifactBuilder, ArtifactListUtil, ArtifactLocation, ArtifactType, BuildConfig,
    BuilderFactory, DeployError, ListUtilFactory,
};
use crate::executor::{CommandRunner, ProcessOptions};

/// A parsed builder command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderCommand {
    program: String,
    args: Vec<String>,
}

impl BuilderCommand {
    /// Splits `command_line` into program and leading arguments using shell
    /// quoting rules
    ///
    /// # Errors
    ///
    /// Returns `DeployError::BuilderCommand` for unbalanced quotes or an
    /// empty command.
    pub fn parse(command_line: &str) -> Result<Self, DeployError> {
        let invalid = |reason: String| DeployError::BuilderCommand {
            command: command_line.to_string(),
            reason,
        };

        let mut words = shell_words::split(command_line).map_err(|e| invalid(e.to_string()))?;
        if words.is_empty() {
            return Err(invalid("command is empty".to_string()));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
        })
    }

    /// Program to execute
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    fn args_with<I>(&self, extra: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        self.args.iter().cloned().chain(extra).collect()
    }
}

/// Creates [`CliArtifactBuilder`]s for the configured storage location
#[derive(Debug, Clone)]
pub struct CliBuilderFactory<R> {
    runner: R,
    command: BuilderCommand,
    endpoint: String,
    bucket: Option<String>,
    prefix: Option<String>,
}

impl<R: CommandRunner + Clone + 'static> CliBuilderFactory<R> {
    /// Reads the builder command and storage settings from `env`
    ///
    /// # Errors
    ///
    /// Fails when the builder command line cannot be parsed.
    pub fn from_env(runner: R, env: &DeployEnv) -> Result<Self, DeployError> {
        Ok(Self {
            runner,
            command: BuilderCommand::parse(env.builder_command())?,
            endpoint: env.artifact_endpoint().to_string(),
            bucket: env.artifact_bucket.clone(),
            prefix: env.artifact_prefix.clone(),
        })
    }
}

impl<R: CommandRunner + Clone + 'static> BuilderFactory for CliBuilderFactory<R> {
    fn create(&self, config: BuildConfig) -> Result<Box<dyn ArtifactBuilder>, DeployError> {
        let bucket = self
            .bucket
            .clone()
            .ok_or(DeployError::MissingSetting("ARTIFACT_BUCKET"))?;
        let location = ArtifactLocation {
            endpoint: self.endpoint.clone(),
            bucket,
            prefix: self.prefix.clone().unwrap_or_default(),
        };
        debug!(%location, "Created artifact builder");

        Ok(Box::new(CliArtifactBuilder {
            runner: self.runner.clone(),
            command: self.command.clone(),
            location,
            config_json: serde_json::to_string(&config)?,
        }))
    }
}

/// Builder bound to one build configuration
#[derive(Debug)]
pub struct CliArtifactBuilder<R> {
    runner: R,
    command: BuilderCommand,
    location: ArtifactLocation,
    config_json: String,
}

#[async_trait]
impl<R: CommandRunner> ArtifactBuilder for CliArtifactBuilder<R> {
    fn location(&self) -> ArtifactLocation {
        self.location.clone()
    }

    async fn publish(&self) -> Result<(), DeployError> {
        info!(location = %self.location, "Publishing artifact");
        let args = self.command.args_with(
            ["publish", "--config", self.config_json.as_str()].map(String::from),
        );
        self.runner
            .run(&self.command.program, &args, &ProcessOptions::default())
            .await
            .map_err(|source| DeployError::Builder {
                operation: "publish",
                source,
            })?;
        Ok(())
    }
}

/// Opens [`CliListUtil`]s through the builder command
#[derive(Debug, Clone)]
pub struct CliListUtilFactory<R> {
    runner: R,
    command: BuilderCommand,
}

impl<R: CommandRunner + Clone + 'static> CliListUtilFactory<R> {
    /// Reads the builder command from `env`
    ///
    /// # Errors
    ///
    /// Fails when the builder command line cannot be parsed.
    pub fn from_env(runner: R, env: &DeployEnv) -> Result<Self, DeployError> {
        Ok(Self {
            runner,
            command: BuilderCommand::parse(env.builder_command())?,
        })
    }
}

impl<R: CommandRunner + Clone + 'static> ListUtilFactory for CliListUtilFactory<R> {
    fn open(&self, location: &ArtifactLocation) -> Box<dyn ArtifactListUtil> {
        Box::new(CliListUtil {
            runner: self.runner.clone(),
            command: self.command.clone(),
            location: location.clone(),
        })
    }
}

/// Artifact list access for one storage location
#[derive(Debug)]
pub struct CliListUtil<R> {
    runner: R,
    command: BuilderCommand,
    location: ArtifactLocation,
}

impl<R: CommandRunner> CliListUtil<R> {
    fn list_args(&self, operation: &str, kind: ArtifactType) -> Vec<String> {
        self.command.args_with(
            [
                "list",
                operation,
                "--type",
                kind.as_str(),
                "--endpoint",
                self.location.endpoint.as_str(),
                "--bucket",
                self.location.bucket.as_str(),
                "--prefix",
                self.location.prefix.as_str(),
            ]
            .map(String::from),
        )
    }
}

#[async_trait]
impl<R: CommandRunner> ArtifactListUtil for CliListUtil<R> {
    async fn scan_artifacts(&self, kind: ArtifactType) -> Result<(), DeployError> {
        let args = self.list_args("scan", kind);
        self.runner
            .run(&self.command.program, &args, &ProcessOptions::default())
            .await
            .map_err(|source| DeployError::ArtifactList {
                operation: "scan",
                source,
            })?;
        Ok(())
    }

    async fn read_artifact_list(
        &self,
        kind: ArtifactType,
    ) -> Result<serde_json::Value, DeployError> {
        let args = self.list_args("read", kind);
        let out = self
            .runner
            .run(&self.command.program, &args, &ProcessOptions::capture())
            .await
            .map_err(|source| DeployError::ArtifactList {
                operation: "read",
                source,
            })?;

        if out.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&out)?)
    }
}
