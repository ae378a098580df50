//! The [`OutputRoot`] handle: sandboxed, atomic, change-aware file output.

use crate::builder::OutputRootBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::security;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// What a write did to the output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// The file already held identical bytes and was not touched.
    Unchanged,
}

impl WriteOutcome {
    #[must_use]
    pub const fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

#[derive(Debug)]
pub struct OutputRootInner {
    /// Absolute physical path of the root; may not exist yet.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
}

/// A cheap-to-clone handle to one output directory.
#[derive(Debug, Clone)]
pub struct OutputRoot {
    pub(crate) inner: Arc<OutputRootInner>,
}

impl Deref for OutputRoot {
    type Target = OutputRootInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl OutputRoot {
    #[must_use = "The output root is not bound until you call .open()"]
    pub fn builder() -> OutputRootBuilder {
        OutputRootBuilder::new()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative path to a physical path inside the root.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] for absolute paths, paths that
    /// climb above the root, or paths reaching outside through a symlink.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        security::resolve_path(&self.root, path)
    }

    /// Reads a file below the root.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileNotFound`] if the path does not exist.
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        let resolved = self.resolve(path)?;

        match fs::read(&resolved).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StorageError::FileNotFound {
                message: resolved.display().to_string().into(),
                context: None,
            }),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Read failed: {}", resolved.display()).into()),
            }),
        }
    }

    /// Writes `data` atomically, skipping the write when the file already holds it.
    ///
    /// Parent directories are created as needed. The bytes go to a unique temp
    /// file next to the target which is then renamed over it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PathTraversalAttempt`] if the path escapes the root.
    /// Returns [`StorageError::Io`] on filesystem failures.
    pub async fn write(
        &self,
        path: impl AsRef<Path>,
        data: &[u8],
    ) -> Result<WriteOutcome, StorageError> {
        let resolved = self.resolve(path)?;

        let outcome = match fs::read(&resolved).await {
            Ok(existing) if existing == data => {
                debug!(path = %resolved.display(), "Output unchanged");
                return Ok(WriteOutcome::Unchanged);
            },
            Ok(_) => WriteOutcome::Updated,
            Err(err) if err.kind() == ErrorKind::NotFound => WriteOutcome::Created,
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Read failed: {}", resolved.display()).into()),
                });
            },
        };

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directory {}", parent.display()))?;
        }

        let temp = unique_tmp_path(&resolved, &self.tmp_counter);

        {
            let mut file = fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(&temp)
                .await
                .context(format!("Temp creation failed: {}", temp.display()))?;
            file.write_all(data).await.context(format!("Write failed: {}", temp.display()))?;
            file.flush().await.context(format!("Flush failed: {}", temp.display()))?;
        }

        if let Err(err) = fs::rename(&temp, &resolved).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&resolved)
                    .await
                    .context(format!("Failed to replace existing file: {}", resolved.display()))?;
                fs::rename(&temp, &resolved).await.context(format!(
                    "Atomic swap failed: {} -> {}",
                    temp.display(),
                    resolved.display()
                ))?;
            } else {
                let _ = fs::remove_file(&temp).await;
                return Err(StorageError::Io {
                    source: err,
                    context: Some(
                        format!("Atomic swap failed: {} -> {}", temp.display(), resolved.display())
                            .into(),
                    ),
                });
            }
        }

        debug!(path = %resolved.display(), ?outcome, "File saved atomically");
        Ok(outcome)
    }

    /// Removes a file below the root. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] on failures other than the file being absent.
    pub async fn remove(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        let resolved = self.resolve(path)?;
        match fs::remove_file(&resolved).await {
            Ok(()) => {
                debug!(path = %resolved.display(), "File removed");
                Ok(true)
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to delete: {}", resolved.display()).into()),
            }),
        }
    }

    /// # Errors
    ///
    /// Returns an `Err` only if path resolution fails.
    pub fn exists(&self, path: impl AsRef<Path>) -> Result<bool, StorageError> {
        Ok(self.resolve(path)?.exists())
    }

    /// Recursively deletes the whole root. Returns whether anything was deleted.
    ///
    /// An absent root is not an error, which makes repeated cleans idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the tree exists but cannot be removed.
    pub async fn clean(&self) -> Result<bool, StorageError> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                debug!(path = %self.root.display(), "Output root removed");
                Ok(true)
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err::<bool, _>(err).context(format!("Failed to remove {}", self.root.display())),
        }
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.root).await;
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("output");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{}-{counter}", std::process::id()))
}
