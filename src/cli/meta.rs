//! `deploy-task-script meta` - print the build metadata

use anyhow::{Context, Result};
use clap::ValueEnum;
use task_script_deploy::{BuildMetadata, DeployEnv, GitCli, MetadataCollector, ProcessExecutor};

/// Output format for `meta`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MetaFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

/// Collects the metadata for the current checkout and prints it to stdout
pub async fn print_meta(env: &DeployEnv, format: MetaFormat) -> Result<()> {
    let collector = MetadataCollector::new(GitCli::new(ProcessExecutor::new()), env);
    let meta = collector.collect().await?;

    println!("{}", render(&meta, format)?);
    Ok(())
}

/// Renders metadata in the requested format
pub fn render(meta: &BuildMetadata, format: MetaFormat) -> Result<String> {
    match format {
        MetaFormat::Json => {
            serde_json::to_string_pretty(meta).context("Failed to encode metadata as JSON")
        }
        MetaFormat::Yaml => serde_yaml::to_string(meta)
            .map(|s| s.trim_end().to_string())
            .context("Failed to encode metadata as YAML"),
    }
}
