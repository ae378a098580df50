use crate::error::PipelineError;
use crate::events::ReloadRequested;
use crate::pipeline::Pipeline;
use aflow_domain::{Category, Mode};
use aflow_watcher::{FileWatcher, Subscription};
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

impl Pipeline {
    /// Rebuilds a category whenever its sources change. Runs until the
    /// process ends.
    ///
    /// Each category debounces its own changes, runs its task to completion
    /// and then publishes [`ReloadRequested`] (images excepted). Changes that
    /// arrive during a run start the next cycle afterwards.
    ///
    /// # Errors
    /// Returns an error if the platform watcher cannot start. A category
    /// whose source directory cannot be watched is notified and skipped.
    pub async fn watch(&self, mode: Mode) -> Result<(), PipelineError> {
        let mut watcher = FileWatcher::new()?;
        let window = Duration::from_millis(self.config().watch.debounce_ms);
        let mut loops = JoinSet::new();

        for category in Category::ALL {
            let sources = self.sources(category).clone();
            let base = sources.base().to_path_buf();
            let subscription =
                match watcher.subscribe(category.task_name(), &base, move |path: &Path| sources.covers(path)) {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        warn!(task = category.task_name(), base = %base.display(), "Not watching");
                        self.notify(category.task_name(), e.to_string());
                        continue;
                    },
                };
            let pipeline = self.clone();
            loops.spawn(async move { pipeline.watch_loop(category, subscription, mode, window).await });
        }

        info!(subscriptions = loops.len(), debounce_ms = window.as_millis(), "Watching for changes");

        while let Some(joined) = loops.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Watch loop ended unexpectedly");
            }
        }
        drop(watcher);
        Ok(())
    }

    async fn watch_loop(&self, category: Category, mut subscription: Subscription, mode: Mode, window: Duration) {
        while let Some(batch) = subscription.next_batch(window).await {
            info!(task = category.task_name(), changed = batch.len(), "Change detected");
            self.run_category(category, mode).await;

            if category.reloads_after_rebuild()
                && let Err(e) = self.events().publish(ReloadRequested { category })
            {
                warn!(error = %e, "Failed to publish reload request");
            }
        }
    }
}
