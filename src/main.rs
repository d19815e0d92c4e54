//! deploy-task-script - deploy step for task-scripts artifacts
//!
//! Runs inside a GitHub Actions job. Reads its settings from the
//! environment, records build metadata, hands the build to the artifact
//! builder and reads back the artifact list.
//!
//! ## Commands
//!
//! - `deploy-task-script publish` - build and list artifacts (default)
//! - `deploy-task-script meta` - print build metadata
//! - `deploy-task-script validate-tag <TAG>` - check a release tag
//!
//! ## Quick Start
//!
//! ```bash
//! # Build and list, without uploading
//! SLUG=my-script ARTIFACT_BUCKET=artifacts deploy-task-script
//!
//! # Build, upload and list
//! deploy-task-script publish --publish
//!
//! # Inspect what would be recorded for this checkout
//! deploy-task-script meta --format yaml
//! ```

use std::process::ExitCode;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
