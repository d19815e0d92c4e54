//! Command line interface for the deploy step
//!
//! - `publish`: collect metadata, build and list artifacts (the default)
//! - `meta`: print the build metadata for the current checkout
//! - `validate-tag`: check a release tag before it is pushed

pub mod meta;
pub mod publish;
pub mod tag;

use anyhow::Result;
use clap::{Args as ClapArgs, Parser, Subcommand};
use task_script_deploy::{DeployEnv, PublishOptions, init_logging};

/// CLI arguments for deploy-task-script
#[derive(Parser, Debug)]
#[command(name = "deploy-task-script")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log filter, e.g. `debug` or `task_script_deploy=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Build the task scripts and read the artifact list
    Publish(PublishArgs),

    /// Print the build metadata of the current checkout
    Meta {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = meta::MetaFormat::Json)]
        format: meta::MetaFormat,
    },

    /// Check that a release tag is new and not reserved
    ValidateTag {
        /// Tag to validate, e.g. `v1.2.0`
        tag: String,
    },
}

#[derive(ClapArgs, Debug, Default, PartialEq, Eq)]
struct PublishArgs {
    /// Stop after assembling the build configuration
    #[arg(long)]
    no_build: bool,

    /// Package and upload the artifact
    #[arg(long, conflicts_with = "no_build")]
    publish: bool,

    /// Skip scanning and reading the artifact list
    #[arg(long)]
    no_list: bool,
}

impl PublishArgs {
    fn options(&self) -> PublishOptions {
        PublishOptions {
            build: !self.no_build,
            publish: self.publish,
            list: !self.no_list,
        }
    }
}

/// Parse and execute CLI arguments
pub async fn run() -> Result<()> {
    let args = Args::parse();
    let env = DeployEnv::from_env();

    init_logging(args.log_level.as_deref().unwrap_or(env.log_level()));
    tracing::debug!(
        version = task_script_deploy::VERSION,
        settings = %env.describe(),
        "Starting"
    );

    match args.command.unwrap_or(Command::Publish(PublishArgs::default())) {
        Command::Publish(publish_args) => publish::publish(env, publish_args.options()).await,
        Command::Meta { format } => meta::print_meta(&env, format).await,
        Command::ValidateTag { tag } => tag::validate_tag(&tag).await,
    }
}
