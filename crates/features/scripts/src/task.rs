use crate::ScriptError;
use crate::lint::EsLint;
use crate::minify::Uglify;
use aflow_kernel::prelude::*;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug)]
pub struct ScriptTaskInner {
    sources: SourceGlob,
    emitter: Emitter,
    transpiler: Option<ExternalTool>,
}

#[derive(Debug, Clone)]
pub struct ScriptTask {
    inner: Arc<ScriptTaskInner>,
}

impl Deref for ScriptTask {
    type Target = ScriptTaskInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Binds the script task to the registry's script entry.
///
/// # Errors
/// Returns an error if the source pattern is invalid or the output directory
/// cannot be resolved.
pub async fn init(config: &PipelineConfig, registry: &PathRegistry) -> Result<ScriptTask, ScriptError> {
    let entry = registry.get(Category::Script);
    let sources = SourceGlob::from_entry(registry.project_root(), entry)?;
    let output = OutputRoot::builder()
        .root(&entry.output_dir)
        .open()
        .await
        .context(format!("Failed to bind {}", entry.output_dir.display()))?;

    let transpiler = ExternalTool::from_command("babel", &config.tools.transpiler);
    debug!(
        base = %sources.base().display(),
        transpiler = transpiler.as_ref().map(ExternalTool::program),
        "Script task initialized"
    );

    Ok(ScriptTask {
        inner: Arc::new(ScriptTaskInner {
            sources,
            emitter: Emitter::new(output, registry.source_maps(), CommentSyntax::Line),
            transpiler,
        }),
    })
}

impl ScriptTask {
    #[must_use]
    pub fn chain(&self, mode: Mode) -> StepChain {
        StepChain::new().then(EsLint).then_some(self.transpiler.clone()).then_if(mode.minify(), Uglify)
    }

    #[must_use]
    pub fn sources(&self) -> &SourceGlob {
        &self.sources
    }
}

impl Task for ScriptTask {
    fn category(&self) -> Category {
        Category::Script
    }

    async fn run(&self, mode: Mode) -> Result<TaskReport, TaskError> {
        let started = Instant::now();
        let mut report = TaskReport::new(self.name(), mode);
        let chain = self.chain(mode);

        info!(task = self.name(), mode = %mode, "Starting task");

        for file in self.sources.discover_async().await? {
            let contents =
                tokio::fs::read(&file.path).await.context(format!("Failed to read {}", file.path.display()))?;
            let mut asset = Asset::new(&file.path, &file.relative, contents);
            if let Err(e) = asset.capture_origin() {
                report.record_failure(&file.path, "read", e.to_string());
                continue;
            }

            match chain.run(asset).await {
                Ok(asset) => {
                    debug!(file = %file.relative.display(), "Processed script");
                    self.emitter.emit(asset, mode, &mut report).await?;
                },
                Err(failure) => {
                    debug!(file = %file.relative.display(), step = failure.step, "Script failed");
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
