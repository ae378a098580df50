use crate::error::PipelineError;
use crate::events::ReloadRequested;
use aflow_devserver::{DevServer, Reload};
use aflow_domain::{Category, Mode, PathRegistry, PipelineConfig};
use aflow_event_bus::{EventBus, EventReceiverExt};
use aflow_images::ImageTask;
use aflow_kernel::notify::{ConsoleNotifier, Notification, Notifier};
use aflow_kernel::report::TaskReport;
use aflow_kernel::source::SourceGlob;
use aflow_kernel::storage::OutputRoot;
use aflow_kernel::task::Task;
use aflow_scripts::ScriptTask;
use aflow_styles::StyleTask;
use aflow_templates::TemplateTask;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    notifier: Option<Arc<dyn Notifier>>,
    events: Option<EventBus>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Where failure notifications go; the console by default.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Shares an existing bus instead of creating one.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Resolves the path registry and binds every transform task to it.
    ///
    /// # Errors
    /// Returns an error if a source pattern is invalid or an output
    /// directory cannot be bound.
    pub async fn build(self) -> Result<Pipeline, PipelineError> {
        let registry = PathRegistry::from_config(&self.config);
        let config = &self.config;

        let (styles, scripts, templates, images) = tokio::try_join!(
            async { aflow_styles::init(config, &registry).await.map_err(PipelineError::from) },
            async { aflow_scripts::init(config, &registry).await.map_err(PipelineError::from) },
            async { aflow_templates::init(config, &registry).await.map_err(PipelineError::from) },
            async { aflow_images::init(config, &registry).await.map_err(PipelineError::from) },
        )?;

        debug!(
            project_root = %registry.project_root().display(),
            output_root = %registry.output_root().display(),
            "Pipeline initialized"
        );

        Ok(Pipeline {
            inner: Arc::new(PipelineInner {
                notifier: self.notifier.unwrap_or_else(|| Arc::new(ConsoleNotifier)),
                events: self.events.unwrap_or_default(),
                config: self.config,
                registry,
                styles,
                scripts,
                templates,
                images,
            }),
        })
    }
}

#[derive(Debug)]
pub struct PipelineInner {
    config: PipelineConfig,
    registry: PathRegistry,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
    styles: StyleTask,
    scripts: ScriptTask,
    templates: TemplateTask,
    images: ImageTask,
}

/// The composed pipeline; cheap to clone.
#[derive(Debug, Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

impl Deref for Pipeline {
    type Target = PipelineInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Reports of one `build`/`dev` run, in [`Category::ALL`] order. A `None`
/// entry is a task that failed as a whole (its error was notified).
#[derive(Debug)]
pub struct BuildSummary {
    pub reports: Vec<(Category, Option<TaskReport>)>,
}

impl BuildSummary {
    /// Failed files plus failed tasks.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.reports.iter().map(|(_, report)| report.as_ref().map_or(1, |r| r.failures.len())).sum()
    }

    #[must_use]
    pub fn report(&self, category: Category) -> Option<&TaskReport> {
        self.reports.iter().find(|(c, _)| *c == category).and_then(|(_, r)| r.as_ref())
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn sources(&self, category: Category) -> &SourceGlob {
        match category {
            Category::Style => self.styles.sources(),
            Category::Script => self.scripts.sources(),
            Category::Template => self.templates.sources(),
            Category::Image => self.images.sources(),
        }
    }

    pub(crate) fn notify(&self, title: &'static str, message: impl Into<String>) {
        self.notifier.notify(Notification::new(title, message));
    }

    /// Deletes the output root. Returns whether anything was there.
    ///
    /// # Errors
    /// Returns the filesystem error, after notifying it.
    pub async fn clean(&self) -> Result<bool, PipelineError> {
        let root = self.registry.output_root();
        let result = async { OutputRoot::builder().root(root).open().await?.clean().await }.await;

        match result {
            Ok(removed) => {
                info!(task = "clean", path = %root.display(), removed, "Task finished");
                Ok(removed)
            },
            Err(e) => {
                self.notify("clean", e.to_string());
                Err(e.into())
            },
        }
    }

    /// Runs one transform task and notifies every failure it produced.
    ///
    /// Returns `None` when the task failed as a whole.
    pub async fn run_category(&self, category: Category, mode: Mode) -> Option<TaskReport> {
        let result = match category {
            Category::Style => self.styles.run(mode).await,
            Category::Script => self.scripts.run(mode).await,
            Category::Template => self.templates.run(mode).await,
            Category::Image => self.images.run(mode).await,
        };

        match result {
            Ok(report) => {
                for failure in &report.failures {
                    self.notify(report.task, failure.message.clone());
                }
                Some(report)
            },
            Err(e) => {
                warn!(task = category.task_name(), kind = e.kind(), "Task failed");
                self.notify(category.task_name(), e.to_string());
                None
            },
        }
    }

    /// Runs the four transform tasks concurrently. One task failing never
    /// cancels the others.
    pub async fn build(&self, mode: Mode) -> BuildSummary {
        let (styles, scripts, templates, images) = tokio::join!(
            self.run_category(Category::Style, mode),
            self.run_category(Category::Script, mode),
            self.run_category(Category::Template, mode),
            self.run_category(Category::Image, mode),
        );
        BuildSummary {
            reports: vec![
                (Category::Style, styles),
                (Category::Script, scripts),
                (Category::Template, templates),
                (Category::Image, images),
            ],
        }
    }

    /// Same composition as [`build`](Self::build); the mode decides the output.
    pub async fn dev(&self, mode: Mode) -> BuildSummary {
        self.build(mode).await
    }

    /// Serves the output root and forwards [`ReloadRequested`] events to the
    /// connected pages. Runs until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    /// Returns an error if the server cannot bind its address.
    pub async fn browser_init(&self) -> Result<(), PipelineError> {
        let server =
            DevServer::builder().config(&self.config.server).root(self.registry.output_root()).build();
        let reloader = server.reloader();
        let mut rx = self.events.subscribe::<ReloadRequested>()?;

        let forward = tokio::spawn(async move {
            while let Some(event) = rx.recv_event().await {
                let kind = if event.category == Category::Style { Reload::Css } else { Reload::Page };
                reloader.reload(kind);
            }
        });

        let result = server.run().await;
        forward.abort();
        result.map_err(PipelineError::from)
    }

    /// Dev server and watcher side by side; neither waits for the other.
    ///
    /// # Errors
    /// Returns the first error of either side.
    pub async fn start(&self, mode: Mode) -> Result<(), PipelineError> {
        tokio::try_join!(self.browser_init(), self.watch(mode))?;
        Ok(())
    }
}
