use aflow_domain::Category;

/// Published after a watch-triggered rebuild of a category that reloads the
/// browser. The dev server turns it into a live-reload signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadRequested {
    pub category: Category,
}
