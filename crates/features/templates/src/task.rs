use crate::TemplateError;
use crate::html::Pretty;
use crate::render::Render;
use aflow_kernel::prelude::*;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
pub struct TemplateTaskInner {
    sources: SourceGlob,
    emitter: Emitter,
}

/// The template task; cheap to clone.
#[derive(Debug, Clone)]
pub struct TemplateTask {
    inner: Arc<TemplateTaskInner>,
}

impl Deref for TemplateTask {
    type Target = TemplateTaskInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Binds the template task to the registry's template entry.
///
/// # Errors
/// Returns an error if the source pattern is invalid or the output directory
/// cannot be resolved.
pub async fn init(_config: &PipelineConfig, registry: &PathRegistry) -> Result<TemplateTask, TemplateError> {
    let entry = registry.get(Category::Template);
    let sources = SourceGlob::from_entry(registry.project_root(), entry)?;
    let output = OutputRoot::builder()
        .root(&entry.output_dir)
        .open()
        .await
        .context(format!("Failed to bind {}", entry.output_dir.display()))?;

    debug!(base = %sources.base().display(), "Template task initialized");

    Ok(TemplateTask {
        inner: Arc::new(TemplateTaskInner {
            sources,
            emitter: Emitter::new(output, registry.source_maps(), CommentSyntax::Block),
        }),
    })
}

impl TemplateTask {
    #[must_use]
    pub fn chain(&self, mode: Mode) -> StepChain {
        StepChain::new().then(Render::new(self.sources.base(), mode)).then(Pretty)
    }

    #[must_use]
    pub fn sources(&self) -> &SourceGlob {
        &self.sources
    }
}

impl Task for TemplateTask {
    fn category(&self) -> Category {
        Category::Template
    }

    async fn run(&self, mode: Mode) -> Result<TaskReport, TaskError> {
        let started = Instant::now();
        let mut report = TaskReport::new(self.name(), mode);
        // Built per run: the loader caches layouts and partials.
        let chain = self.chain(mode);

        info!(task = self.name(), mode = %mode, "Starting task");

        for file in self.sources.discover_async().await? {
            // Layouts and includes are only reachable through the loader.
            if is_partial(&file.relative) {
                report.skipped += 1;
                continue;
            }

            let contents =
                tokio::fs::read(&file.path).await.context(format!("Failed to read {}", file.path.display()))?;
            let asset = Asset::new(&file.path, &file.relative, contents);

            match chain.run(asset).await {
                Ok(asset) => {
                    debug!(file = %file.relative.display(), "Rendered template");
                    self.emitter.write(&asset.with_extension("html"), &mut report).await?;
                },
                Err(failure) => {
                    debug!(file = %file.relative.display(), step = failure.step, "Template failed");
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
