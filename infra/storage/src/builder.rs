use crate::engine::{OutputRoot, OutputRootInner};
use crate::error::{StorageError, StorageErrorExt};
use crate::security;
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct OutputRootBuilder<S: Sealed = NoRoot> {
    state: S,
    create: bool,
}

impl OutputRootBuilder<NoRoot> {
    #[must_use = "Creates a new output root builder"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the directory the output root is bound to"]
    pub fn root(self, path: impl Into<PathBuf>) -> OutputRootBuilder<WithRoot> {
        OutputRootBuilder { state: WithRoot(path.into()), create: self.create }
    }
}

impl OutputRootBuilder<WithRoot> {
    /// Creates the directory eagerly on [`open`](Self::open).
    ///
    /// Off by default: writes create parents lazily and `clean` must not
    /// conjure an empty tree.
    #[must_use = "Sets whether the root directory is created on open"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }

    /// Binds the output root.
    ///
    /// The root is made absolute through its nearest existing ancestor, so a
    /// root that does not exist yet (fresh checkout, after `clean`) is valid.
    /// Stale temp files below an existing root are purged.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created or its
    /// existing ancestor cannot be resolved.
    pub async fn open(self) -> Result<OutputRoot, StorageError> {
        let root = self.state.0;

        if self.create {
            fs::create_dir_all(&root)
                .await
                .context(format!("Failed to create output root: {}", root.display()))?;
            debug!(path = %root.display(), "Created output root directory");
        }

        let absolute = security::absolutize(&root)?;

        let output = OutputRoot {
            inner: Arc::new(OutputRootInner { root: absolute, tmp_counter: AtomicU64::new(1) }),
        };

        output.purge_tmp().await;

        Ok(output)
    }
}
