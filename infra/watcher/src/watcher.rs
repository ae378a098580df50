use crate::error::{WatcherError, WatcherErrorExt};
use crate::filter::PathFilter;
use crate::subscription::Subscription;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

struct Route {
    name: &'static str,
    root: PathBuf,
    /// Canonical form of `root` when it differs; platform backends may
    /// report resolved paths.
    canonical: Option<PathBuf>,
    filter: Box<dyn PathFilter>,
    tx: mpsc::UnboundedSender<PathBuf>,
}

impl Route {
    /// Maps an event path into this route's tree, as seen through `root`.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        if path.starts_with(&self.root) {
            return Some(path.to_path_buf());
        }
        let canonical = self.canonical.as_ref()?;
        path.strip_prefix(canonical).ok().map(|rest| self.root.join(rest))
    }
}

/// A native filesystem watcher shared by every subscription.
///
/// Dropping it stops all watches and ends every subscription.
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    routes: Arc<RwLock<Vec<Route>>>,
}

impl fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.routes.read();
        f.debug_struct("FileWatcher")
            .field("subscriptions", &routes.iter().map(|r| (r.name, &r.root)).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Creates the platform watcher.
    ///
    /// # Errors
    /// Returns [`WatcherError::Notify`] when the backend cannot start.
    pub fn new() -> Result<Self, WatcherError> {
        let routes: Arc<RwLock<Vec<Route>>> = Arc::default();
        let shared = Arc::clone(&routes);

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => dispatch(&shared.read(), &event),
            Err(e) => warn!(error = %e, "Filesystem watcher error"),
        })
        .context("Failed to start filesystem watcher")?;

        Ok(Self { watcher, routes })
    }

    /// Watches `root` recursively and routes accepted changes to the returned
    /// subscription.
    ///
    /// # Errors
    /// Returns [`WatcherError::Notify`] when `root` cannot be watched (for
    /// example because it does not exist).
    pub fn subscribe(
        &mut self,
        name: &'static str,
        root: impl Into<PathBuf>,
        filter: impl PathFilter,
    ) -> Result<Subscription, WatcherError> {
        let root = root.into();
        self.watcher
            .watch(&root, RecursiveMode::Recursive)
            .context(format!("Failed to watch {}", root.display()))?;

        let canonical = std::fs::canonicalize(&root).ok().filter(|c| *c != root);
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(subscription = name, root = %root.display(), "Watching");

        self.routes.write().push(Route { name, root, canonical, filter: Box::new(filter), tx });
        Ok(Subscription::new(name, rx))
    }
}

fn dispatch(routes: &[Route], event: &Event) {
    if matches!(event.kind, EventKind::Access(_)) {
        return;
    }
    for path in &event.paths {
        for route in routes {
            let Some(path) = route.resolve(path) else {
                continue;
            };
            if !route.filter.accepts(&path) {
                continue;
            }
            trace!(subscription = route.name, path = %path.display(), kind = ?event.kind, "Change routed");
            if route.tx.send(path).is_err() {
                trace!(subscription = route.name, "Subscription dropped; change discarded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind};

    fn route(root: &str, canonical: Option<&str>) -> (Route, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let route = Route {
            name: "test",
            root: root.into(),
            canonical: canonical.map(PathBuf::from),
            filter: Box::new(|p: &Path| p.extension().is_some_and(|e| e == "js")),
            tx,
        };
        (route, rx)
    }

    #[test]
    fn test_dispatch_filters_and_rebases() {
        let (route, mut rx) = route("/tmp/site/js", Some("/private/tmp/site/js"));
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path("/private/tmp/site/js/app.js".into())
            .add_path("/tmp/site/js/readme.md".into())
            .add_path("/elsewhere/app.js".into());

        dispatch(&[route], &event);
        assert_eq!(rx.try_recv().unwrap(), PathBuf::from("/tmp/site/js/app.js"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_access_events_ignored() {
        let (route, mut rx) = route("/src", None);
        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path("/src/app.js".into());
        dispatch(&[route], &event);
        assert!(rx.try_recv().is_err());
    }
}
