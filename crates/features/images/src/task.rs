use crate::ImageError;
use crate::format::ImageFormat;
use crate::svg::Svgo;
use aflow_kernel::prelude::*;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;
use std::time::{Instant, SystemTime};
use tracing::{debug, info};

#[derive(Debug)]
pub struct ImageTaskInner {
    sources: SourceGlob,
    emitter: Emitter,
    jpeg: Option<ExternalTool>,
    png: Option<ExternalTool>,
    gif: Option<ExternalTool>,
    /// Start time of the previous run; `None` before the first one.
    last_run: Mutex<Option<SystemTime>>,
}

/// The image task; cheap to clone. Clones share the last-run timestamp.
#[derive(Debug, Clone)]
pub struct ImageTask {
    inner: Arc<ImageTaskInner>,
}

impl Deref for ImageTask {
    type Target = ImageTaskInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Binds the image task to the registry's image entry.
///
/// # Errors
/// Returns an error if the source pattern is invalid or the output directory
/// cannot be resolved.
pub async fn init(config: &PipelineConfig, registry: &PathRegistry) -> Result<ImageTask, ImageError> {
    let entry = registry.get(Category::Image);
    let sources = SourceGlob::from_entry(registry.project_root(), entry)?;
    let output = OutputRoot::builder()
        .root(&entry.output_dir)
        .open()
        .await
        .context(format!("Failed to bind {}", entry.output_dir.display()))?;

    let jpeg = ExternalTool::from_command("mozjpeg", &config.tools.jpeg);
    let png = ExternalTool::from_command("pngquant", &config.tools.png);
    let gif = ExternalTool::from_command("gifsicle", &config.tools.gif);
    debug!(
        base = %sources.base().display(),
        jpeg = jpeg.as_ref().map(ExternalTool::program),
        png = png.as_ref().map(ExternalTool::program),
        gif = gif.as_ref().map(ExternalTool::program),
        "Image task initialized"
    );

    Ok(ImageTask {
        inner: Arc::new(ImageTaskInner {
            sources,
            emitter: Emitter::new(output, registry.source_maps(), CommentSyntax::Block),
            jpeg,
            png,
            gif,
            last_run: Mutex::new(None),
        }),
    })
}

impl ImageTask {
    /// The optimizer chain for one format; empty for pass-through files.
    #[must_use]
    pub fn chain(&self, format: ImageFormat) -> StepChain {
        match format {
            ImageFormat::Jpeg => StepChain::new().then_some(self.jpeg.clone()),
            ImageFormat::Png => StepChain::new().then_some(self.png.clone()),
            ImageFormat::Gif => StepChain::new().then_some(self.gif.clone()),
            ImageFormat::Svg => StepChain::new().then(Svgo),
            ImageFormat::Other => StepChain::new(),
        }
    }

    #[must_use]
    pub fn sources(&self) -> &SourceGlob {
        &self.sources
    }

    /// Start time of the previous run.
    #[must_use]
    pub fn last_run(&self) -> Option<SystemTime> {
        *self.last_run.lock()
    }
}

fn changed_since(modified: Option<SystemTime>, since: Option<SystemTime>) -> bool {
    match (modified, since) {
        (Some(modified), Some(since)) => modified > since,
        _ => true,
    }
}

impl Task for ImageTask {
    fn category(&self) -> Category {
        Category::Image
    }

    async fn run(&self, mode: Mode) -> Result<TaskReport, TaskError> {
        let started = Instant::now();
        let mut report = TaskReport::new(self.name(), mode);
        // Recorded up front so a failed run still moves the window forward.
        let since = self.last_run.lock().replace(SystemTime::now());

        info!(task = self.name(), mode = %mode, "Starting task");

        for file in self.sources.discover_async().await? {
            if !changed_since(file.modified, since) {
                report.skipped += 1;
                continue;
            }

            let original =
                tokio::fs::read(&file.path).await.context(format!("Failed to read {}", file.path.display()))?;
            let format = ImageFormat::from_path(&file.relative);
            let asset = Asset::new(&file.path, &file.relative, original.clone());

            match self.chain(format).run(asset).await {
                Ok(mut asset) => {
                    if asset.contents.len() >= original.len() {
                        asset.contents = original;
                    }
                    debug!(file = %file.relative.display(), ?format, bytes = asset.contents.len(), "Optimized image");
                    self.emitter.write(&asset, &mut report).await?;
                },
                Err(failure) => {
                    debug!(file = %file.relative.display(), step = failure.step, "Image failed");
                    report.record_failure(&file.path, failure.step, failure.error.to_string());
                },
            }
        }

        report.elapsed = started.elapsed();
        info!(
            task = self.name(),
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            skipped = report.skipped,
            failed = report.failures.len(),
            elapsed_ms = report.elapsed.as_millis(),
            "Task finished"
        );
        Ok(report)
    }
}
