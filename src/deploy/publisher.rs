//! Publish orchestration
//!
//! The deploy entry point. One linear sequence:
//!
//! 1. Collect build metadata and log it
//! 2. Inside the "build it" log group, assemble the build configuration
//! 3. Create the builder and ask for its storage location
//! 4. Optionally publish the artifact
//! 5. Scan and read the artifact list at that location
//! 6. Emit the "all done!" notice
//!
//! Nothing is retried. The first error ends the run and is returned to the
//! caller.

use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::artifact::{ArtifactLocation, ArtifactType, BuilderFactory, ListUtilFactory};
use super::build_config::BuildConfig;
use super::errors::DeployError;
use super::metadata::{BuildMetadata, MetadataCollector};
use super::vcs::VersionControl;
use crate::infrastructure::{DeployEnv, RunTimings, Timing, WorkflowCommands};

/// Title of the log group wrapping the build
pub const BUILD_GROUP: &str = "build it";

/// Notice emitted when the run completes
pub const DONE_NOTICE: &str = "all done!";

/// Which optional steps a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishOptions {
    /// Create the builder and resolve its storage location
    pub build: bool,
    /// Package and upload the artifact (requires `build`)
    pub publish: bool,
    /// Scan and read the artifact list (requires `build`)
    pub list: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            build: true,
            publish: false,
            list: true,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Correlation id of the run
    pub run_id: Uuid,
    /// Metadata recorded with the build
    pub metadata: Arc<BuildMetadata>,
    /// Configuration handed to the builder
    pub config: BuildConfig,
    /// Storage location, when a builder was created
    pub location: Option<ArtifactLocation>,
    /// Whether the artifact was published
    pub published: bool,
    /// Artifact list read after the build
    pub artifact_list: Option<serde_json::Value>,
    /// Timings recorded during the run
    pub timings: Vec<Timing>,
}

struct BuildOutcome {
    config: BuildConfig,
    location: Option<ArtifactLocation>,
    published: bool,
    artifact_list: Option<serde_json::Value>,
}

/// Runs the publish sequence
pub struct Publisher<V> {
    env: DeployEnv,
    collector: MetadataCollector<V>,
    builders: Arc<dyn BuilderFactory>,
    lists: Arc<dyn ListUtilFactory>,
    commands: WorkflowCommands,
}

impl<V: VersionControl> Publisher<V> {
    /// Creates a publisher writing workflow commands to stdout
    pub fn new(
        env: DeployEnv,
        collector: MetadataCollector<V>,
        builders: Arc<dyn BuilderFactory>,
        lists: Arc<dyn ListUtilFactory>,
    ) -> Self {
        Self {
            env,
            collector,
            builders,
            lists,
            commands: WorkflowCommands::stdout(),
        }
    }

    /// Replaces the workflow command sink
    #[must_use]
    pub fn with_workflow_commands(mut self, commands: WorkflowCommands) -> Self {
        self.commands = commands;
        self
    }

    /// Returns the metadata collector
    pub fn collector(&self) -> &MetadataCollector<V> {
        &self.collector
    }

    /// Runs the publish sequence
    ///
    /// # Errors
    ///
    /// Returns the first failure from metadata collection, the builder or
    /// the artifact list utility.
    pub async fn publish(&self, options: PublishOptions) -> Result<PublishReport, DeployError> {
        let run_id = Uuid::new_v4();
        self.run(run_id, options)
            .instrument(info_span!("publish", %run_id))
            .await
    }

    async fn run(&self, run_id: Uuid, options: PublishOptions) -> Result<PublishReport, DeployError> {
        let timings = RunTimings::new();
        let started = Instant::now();

        let metadata = self.collector.collect().await?;
        info!("Code meta:\n{}", serde_json::to_string_pretty(metadata.as_ref())?);

        self.commands.group(BUILD_GROUP);
        let built = self.build_it(options, &timings).await;
        self.commands.end_group();
        let built = built?;

        timings.record("TOTAL", started.elapsed());
        self.commands.notice(DONE_NOTICE);

        Ok(PublishReport {
            run_id,
            metadata,
            config: built.config,
            location: built.location,
            published: built.published,
            artifact_list: built.artifact_list,
            timings: timings.all(),
        })
    }

    async fn build_it(
        &self,
        options: PublishOptions,
        timings: &RunTimings,
    ) -> Result<BuildOutcome, DeployError> {
        let metadata = self.collector.collect().await?;
        let config = BuildConfig::assemble(&self.env, &metadata);
        info!("Build config:\n{}", serde_json::to_string_pretty(&config)?);

        let mut outcome = BuildOutcome {
            config: config.clone(),
            location: None,
            published: false,
            artifact_list: None,
        };

        if !options.build {
            info!("Builder disabled, stopping after configuration");
            return Ok(outcome);
        }

        let builder = self.builders.create(config)?;
        let location = builder.location();
        info!(%location, "Resolved artifact location");

        if options.publish {
            builder.publish().await?;
            outcome.published = true;
        }

        if options.list {
            outcome.artifact_list = Some(self.list_bucket(&location, timings).await?);
        }

        outcome.location = Some(location);
        Ok(outcome)
    }

    async fn list_bucket(
        &self,
        location: &ArtifactLocation,
        timings: &RunTimings,
    ) -> Result<serde_json::Value, DeployError> {
        info!(%location, "Listing bucket");
        let list = self.lists.open(location);

        timings
            .time("scan artifacts", list.scan_artifacts(ArtifactType::TaskScripts))
            .await?;
        let value = timings
            .time("read list", list.read_artifact_list(ArtifactType::TaskScripts))
            .await?;

        if let Some(entries) = value.as_array() {
            info!(count = entries.len(), "Read artifact list");
        }
        Ok(value)
    }
}

impl<V> std::fmt::Debug for Publisher<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("env", &self.env)
            .field("collector", &self.collector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::artifact::{ArtifactBuilder, ArtifactListUtil};
    use crate::deploy::vcs::GitCli;
    use crate::testing::{ScriptedRunner, SharedBuffer};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const REV_PARSE: &str = "git rev-parse --short HEAD";

    type Events = Arc<Mutex<Vec<String>>>;

    fn location() -> ArtifactLocation {
        ArtifactLocation {
            endpoint: "s3.local".to_string(),
            bucket: "b".to_string(),
            prefix: "p".to_string(),
        }
    }

    struct FakeBuilderFactory {
        events: Events,
        fail: bool,
    }

    impl BuilderFactory for FakeBuilderFactory {
        fn create(&self, config: BuildConfig) -> Result<Box<dyn ArtifactBuilder>, DeployError> {
            self.events
                .lock()
                .push(format!("create {}", config.build_record_meta.commit));
            if self.fail {
                return Err(DeployError::MissingSetting("ARTIFACT_BUCKET"));
            }
            Ok(Box::new(FakeBuilder {
                events: Arc::clone(&self.events),
            }))
        }
    }

    struct FakeBuilder {
        events: Events,
    }

    #[async_trait]
    impl ArtifactBuilder for FakeBuilder {
        fn location(&self) -> ArtifactLocation {
            location()
        }

        async fn publish(&self) -> Result<(), DeployError> {
            self.events.lock().push("publish".to_string());
            Ok(())
        }
    }

    struct FakeListFactory {
        events: Events,
        opened: Mutex<Vec<ArtifactLocation>>,
        fail_scan: bool,
    }

    impl ListUtilFactory for FakeListFactory {
        fn open(&self, location: &ArtifactLocation) -> Box<dyn ArtifactListUtil> {
            self.opened.lock().push(location.clone());
            Box::new(FakeList {
                events: Arc::clone(&self.events),
                fail_scan: self.fail_scan,
            })
        }
    }

    struct FakeList {
        events: Events,
        fail_scan: bool,
    }

    #[async_trait]
    impl ArtifactListUtil for FakeList {
        async fn scan_artifacts(&self, kind: ArtifactType) -> Result<(), DeployError> {
            self.events.lock().push(format!("scan {kind}"));
            if self.fail_scan {
                return Err(DeployError::ArtifactList {
                    operation: "scan",
                    source: crate::executor::ProcessError::NonZeroExit {
                        program: "ts-artifact-builder".to_string(),
                        code: 1,
                        stderr: "access denied".to_string(),
                    },
                });
            }
            Ok(())
        }

        async fn read_artifact_list(
            &self,
            kind: ArtifactType,
        ) -> Result<serde_json::Value, DeployError> {
            self.events.lock().push(format!("read {kind}"));
            Ok(serde_json::json!([{ "slug": "parser" }]))
        }
    }

    struct Harness {
        publisher: Publisher<GitCli<Arc<ScriptedRunner>>>,
        runner: Arc<ScriptedRunner>,
        events: Events,
        lists: Arc<FakeListFactory>,
        output: SharedBuffer,
    }

    fn harness(fail_create: bool, fail_scan: bool) -> Harness {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(REV_PARSE, "abc1234\n")
                .on("git tag --points-at HEAD", ""),
        );
        let vars: HashMap<String, String> = [("SLUG", "parser"), ("GITHUB_RUN_ID", "42")]
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let env = DeployEnv::from_map(&vars);

        let events: Events = Arc::default();
        let builders = Arc::new(FakeBuilderFactory {
            events: Arc::clone(&events),
            fail: fail_create,
        });
        let lists = Arc::new(FakeListFactory {
            events: Arc::clone(&events),
            opened: Mutex::new(Vec::new()),
            fail_scan,
        });
        let output = SharedBuffer::default();

        let collector = MetadataCollector::new(GitCli::new(Arc::clone(&runner)), &env);
        let list_factory: Arc<dyn ListUtilFactory> = lists.clone();
        let publisher = Publisher::new(env, collector, builders, list_factory)
            .with_workflow_commands(WorkflowCommands::new(output.clone()));

        Harness {
            publisher,
            runner,
            events,
            lists,
            output,
        }
    }

    #[tokio::test]
    async fn test_lists_builder_location_once() {
        let h = harness(false, false);

        let report = h.publisher.publish(PublishOptions::default()).await.unwrap();

        assert_eq!(*h.lists.opened.lock(), vec![location()]);
        assert_eq!(
            *h.events.lock(),
            vec!["create abc1234", "scan task-scripts", "read task-scripts"]
        );
        assert_eq!(report.location, Some(location()));
        assert_eq!(report.artifact_list, Some(serde_json::json!([{ "slug": "parser" }])));
        assert!(!report.published);
    }

    #[tokio::test]
    async fn test_report_carries_metadata_and_config() {
        let h = harness(false, false);

        let report = h.publisher.publish(PublishOptions::default()).await.unwrap();

        assert_eq!(report.metadata.commit, "abc1234");
        assert_eq!(report.config.slug.as_deref(), Some("parser"));
        assert_eq!(report.config.build_record_meta, *report.metadata);
        assert!(Arc::ptr_eq(&report.metadata, &h.publisher.collector().get().unwrap()));
        assert_eq!(h.runner.count(REV_PARSE), 1);
    }

    #[tokio::test]
    async fn test_timings_recorded() {
        let h = harness(false, false);

        let report = h.publisher.publish(PublishOptions::default()).await.unwrap();

        let labels: Vec<_> = report.timings.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["scan artifacts", "read list", "TOTAL"]);
    }

    #[tokio::test]
    async fn test_workflow_commands_wrap_build() {
        let h = harness(false, false);

        h.publisher.publish(PublishOptions::default()).await.unwrap();

        assert_eq!(
            h.output.contents(),
            "::group::build it\n::endgroup::\n::notice::all done!\n"
        );
    }

    #[tokio::test]
    async fn test_publish_step_is_opt_in() {
        let h = harness(false, false);
        let options = PublishOptions {
            publish: true,
            ..PublishOptions::default()
        };

        let report = h.publisher.publish(options).await.unwrap();

        assert!(report.published);
        assert_eq!(
            *h.events.lock(),
            vec![
                "create abc1234",
                "publish",
                "scan task-scripts",
                "read task-scripts"
            ]
        );
    }

    #[tokio::test]
    async fn test_build_disabled_stops_after_config() {
        let h = harness(false, false);
        let options = PublishOptions {
            build: false,
            ..PublishOptions::default()
        };

        let report = h.publisher.publish(options).await.unwrap();

        assert!(h.events.lock().is_empty());
        assert!(h.lists.opened.lock().is_empty());
        assert!(report.location.is_none());
        assert!(report.artifact_list.is_none());
        assert!(h.output.contents().ends_with("::notice::all done!\n"));
    }

    #[tokio::test]
    async fn test_list_disabled() {
        let h = harness(false, false);
        let options = PublishOptions {
            list: false,
            ..PublishOptions::default()
        };

        let report = h.publisher.publish(options).await.unwrap();

        assert!(h.lists.opened.lock().is_empty());
        assert_eq!(report.location, Some(location()));
        assert!(report.artifact_list.is_none());
    }

    #[tokio::test]
    async fn test_builder_failure_closes_group_without_notice() {
        let h = harness(true, false);

        let err = h.publisher.publish(PublishOptions::default()).await.unwrap_err();

        assert!(matches!(err, DeployError::MissingSetting("ARTIFACT_BUCKET")));
        assert!(h.lists.opened.lock().is_empty());
        assert_eq!(h.output.contents(), "::group::build it\n::endgroup::\n");
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let h = harness(false, true);

        let err = h.publisher.publish(PublishOptions::default()).await.unwrap_err();

        assert!(matches!(err, DeployError::ArtifactList { operation: "scan", .. }));
        assert!(!h.events.lock().contains(&"read task-scripts".to_string()));
    }

    #[tokio::test]
    async fn test_metadata_failure_stops_before_group() {
        let h = harness(false, false);
        let runner = Arc::new(ScriptedRunner::new().fail(REV_PARSE, 128, "not a git repository"));
        let env = DeployEnv::default();
        let collector = MetadataCollector::new(GitCli::new(runner), &env);
        let output = SharedBuffer::default();
        let publisher = Publisher::new(
            env,
            collector,
            Arc::new(FakeBuilderFactory {
                events: Arc::clone(&h.events),
                fail: false,
            }),
            h.lists.clone(),
        )
        .with_workflow_commands(WorkflowCommands::new(output.clone()));

        let err = publisher.publish(PublishOptions::default()).await.unwrap_err();

        let DeployError::Metadata(cause) = err else {
            panic!("expected metadata error");
        };
        assert!(matches!(*cause, DeployError::VersionControl { .. }));
        assert!(h.events.lock().is_empty());
        assert_eq!(output.contents(), "");
    }
}
