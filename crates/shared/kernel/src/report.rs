use aflow_domain::Mode;
use aflow_storage::WriteOutcome;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A file that failed somewhere in its chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub step: &'static str,
    pub message: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.file.display(), self.step, self.message)
    }
}

/// Outcome of one task run.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: &'static str,
    pub mode: Mode,
    /// Output files created or updated, absolute.
    pub written: Vec<PathBuf>,
    /// Output files whose content already matched.
    pub unchanged: Vec<PathBuf>,
    /// Stale outputs deleted (e.g. source maps after switching to production).
    pub removed: Vec<PathBuf>,
    /// Sources intentionally not processed (partials, unchanged images).
    pub skipped: usize,
    pub failures: Vec<FileFailure>,
    pub elapsed: Duration,
}

impl TaskReport {
    #[must_use]
    pub const fn new(task: &'static str, mode: Mode) -> Self {
        Self {
            task,
            mode,
            written: Vec::new(),
            unchanged: Vec::new(),
            removed: Vec::new(),
            skipped: 0,
            failures: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn record_write(&mut self, path: PathBuf, outcome: WriteOutcome) {
        if outcome.changed() {
            self.written.push(path);
        } else {
            self.unchanged.push(path);
        }
    }

    pub fn record_failure(&mut self, file: &Path, step: &'static str, message: impl Into<String>) {
        self.failures.push(FileFailure { file: file.to_path_buf(), step, message: message.into() });
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of outputs produced (changed or not).
    #[must_use]
    pub fn outputs(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}
