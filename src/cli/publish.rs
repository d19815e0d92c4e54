//! `deploy-task-script publish` - run the publish sequence

use anyhow::{Context, Result};
use std::sync::Arc;
use task_script_deploy::{
    CliBuilderFactory, CliListUtilFactory, DeployEnv, GitCli, MetadataCollector, ProcessExecutor,
    PublishOptions, Publisher,
};

/// Wires the command line builder and git into a [`Publisher`] and runs it
pub async fn publish(env: DeployEnv, options: PublishOptions) -> Result<()> {
    let runner = ProcessExecutor::new();

    let builders = CliBuilderFactory::from_env(runner.clone(), &env)
        .context("Failed to configure the artifact builder")?;
    let lists = CliListUtilFactory::from_env(runner.clone(), &env)
        .context("Failed to configure the artifact list utility")?;
    let collector = MetadataCollector::new(GitCli::new(runner), &env);

    let publisher = Publisher::new(env, collector, Arc::new(builders), Arc::new(lists));
    let report = publisher.publish(options).await.context("Deploy failed")?;

    tracing::info!(
        run_id = %report.run_id,
        commit = %report.metadata.commit,
        published = report.published,
        "Deploy finished"
    );
    Ok(())
}
