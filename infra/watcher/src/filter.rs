use std::path::Path;

/// Decides which changed paths a subscription cares about.
pub trait PathFilter: Send + Sync + 'static {
    fn accepts(&self, path: &Path) -> bool;
}

impl<F> PathFilter for F
where
    F: Fn(&Path) -> bool + Send + Sync + 'static,
{
    fn accepts(&self, path: &Path) -> bool {
        self(path)
    }
}
