use crate::StyleError;
use crate::css::CleanCss;
use crate::glob_import::GlobImport;
use crate::lint::StyleLint;
use crate::media::MergeMedia;
use crate::postcss::PostCss;
use aflow_kernel::prelude::*;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
pub struct StyleTaskInner {
    sources: SourceGlob,
    emitter: Emitter,
    sass: Option<ExternalTool>,
}

/// The style task; cheap to clone.
#[derive(Debug, Clone)]
pub struct StyleTask {
    inner: Arc<StyleTaskInner>,
}

impl Deref for StyleTask {
    type Target = StyleTaskInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Binds the style task to the registry's style entry.
///
/// # Errors
/// Returns an error if the source pattern is invalid or the output directory
/// cannot be resolved.
pub async fn init(config: &PipelineConfig, registry: &PathRegistry) -> Result<StyleTask, StyleError> {
    let entry = registry.get(Category::Style);
    let sources = SourceGlob::from_entry(registry.project_root(), entry)?;
    let output = OutputRoot::builder()
        .root(&entry.output_dir)
        .open()
        .await
        .context(format!("Failed to bind {}", entry.output_dir.display()))?;

    let sass = ExternalTool::from_command("sass", &config.tools.sass);
    debug!(base = %sources.base().display(), sass = sass.as_ref().map(ExternalTool::program), "Style task initialized");

    Ok(StyleTask {
        inner: Arc::new(StyleTaskInner {
            sources,
            emitter: Emitter::new(output, registry.source_maps(), CommentSyntax::Block),
            sass,
        }),
    })
}

impl StyleTask {
    /// The chain applied to every non-partial stylesheet in `mode`.
    #[must_use]
    pub fn chain(&self, mode: Mode) -> StepChain {
        StepChain::new()
            .then(StyleLint)
            .then(GlobImport)
            .then_some(self.sass.clone())
            .then(PostCss)
            .then(MergeMedia)
            .then_if(mode.minify(), CleanCss)
    }

    #[must_use]
    pub fn sources(&self) -> &SourceGlob {
        &self.sources
    }
}

impl Task for StyleTask {
    fn category(&self) -> Category {
        Category::Style
    }

    async fn run(&self, mode: Mode) -> Result<TaskReport, TaskError> {
        let started = Instant::now();
        let mut report = TaskReport::new(self.name(), mode);
        let chain = self.chain(mode);
        let lint_only = StepChain::new().then(StyleLint);

        info!(task = self.name(), mode = %mode, "Starting task");

        for file in self.sources.discover_async().await? {
            let contents =
                tokio::fs::read(&file.path).await.context(format!("Failed to read {}", file.path.display()))?;
            let mut asset = Asset::new(&file.path, &file.relative, contents);

            if is_partial(&file.relative) {
                report.skipped += 1;
                if let Err(failure) = lint_only.run(asset).await {
                    report.record_failure(&file.path, failure.step, failure.error.to_string());
                }
                continue;
            }

            if let Err(e) = asset.capture_origin() {
                report.record_failure(&file.path, "read", e.to_string());
                continue;
            }

            match chain.run(asset).await {
                Ok(asset) => {
                    debug!(file = %file.relative.display(), "Compiled stylesheet");
                    self.emitter.emit(asset.with_extension("css"), mode, &mut report).await?;
                },
                Err(failure) => {
                    debug!(file = %file.relative.display(), step = failure.step, "Stylesheet failed");
                    report.record_failure(&file.path, failure.step, failure.error.to_string());
                },
            }
        }

        report.elapsed = started.elapsed();
        info!(
            task = self.name(),
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            failed = report.failures.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "Task finished"
        );
        Ok(report)
    }
}
