//! # aflow CLI
//!
//! Maps each subcommand onto a [`Pipeline`] entrypoint. Transform failures
//! are notified and never change the exit code; configuration, startup,
//! bind and clean errors do.

pub mod args;

use crate::args::Command;
use aflow::Pipeline;
use aflow::devserver::shutdown_signal;
use aflow::domain::{Category, Mode};
use anyhow::Result;
use tracing::info;

/// Runs one command to completion. Long-running commands return on Ctrl+C
/// or SIGTERM.
///
/// # Errors
/// Returns an error when the output cannot be removed or the watcher or the
/// dev server cannot start.
pub async fn run(pipeline: &Pipeline, command: Command, mode: Mode) -> Result<()> {
    match command {
        Command::Clean => {
            pipeline.clean().await?;
        },
        Command::CompileSass => once(pipeline, Category::Style, mode).await,
        Command::MinJs => once(pipeline, Category::Script, mode).await,
        Command::CompilePug => once(pipeline, Category::Template, mode).await,
        Command::MinImages => once(pipeline, Category::Image, mode).await,
        Command::Dev | Command::Build => {
            let summary = pipeline.build(mode).await;
            info!(%mode, failures = summary.failures(), "Build finished");
        },
        Command::Watch => until_shutdown(pipeline.watch(mode)).await?,
        Command::BrowserInit => pipeline.browser_init().await?,
        Command::Start => until_shutdown(pipeline.start(mode)).await?,
    }
    Ok(())
}

async fn once(pipeline: &Pipeline, category: Category, mode: Mode) {
    if let Some(report) = pipeline.run_category(category, mode).await {
        info!(task = report.task, outputs = report.outputs(), failures = report.failures.len(), "Done");
    }
}

async fn until_shutdown<F, E>(work: F) -> Result<()>
where
    F: Future<Output = Result<(), E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    tokio::select! {
        result = work => result?,
        signal = shutdown_signal() => {
            signal?;
            info!("Shutting down");
        },
    }
    Ok(())
}
