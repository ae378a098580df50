//! # Logger
//!
//! Installs the global `tracing` subscriber for the `aflow` binary.
//!
//! Task notifications (`Task failed`, lint findings, compiler errors) are
//! ordinary `warn`/`error` events, so the console layer is what a user sees
//! while a build runs. A second layer can mirror every event into a log
//! directory (`aflow --log-dir logs ...`), one file per day, optionally as
//! JSON lines for CI log collectors.
//!
//! `RUST_LOG` overrides the level unless [`LoggerBuilder::env_filter`] is set.
//!
//! ```rust
//! use aflow_logger::{LevelFilter, LogFile, Logger};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let _logger = Logger::builder()
//!     .name("aflow")
//!     .level(LevelFilter::DEBUG)
//!     .file(LogFile::new(dir.path()).json(true))
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;

use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Daily files kept in a log directory before the oldest is removed.
const KEEP_DAYS: usize = 14;

/// A log directory mirroring the console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    dir: PathBuf,
    json: bool,
}

impl LogFile {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), json: false }
    }

    /// One JSON object per line instead of plain text.
    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }
}

#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    console: bool,
    env_filter: Option<String>,
    file: Option<LogFile>,
}

impl LoggerBuilder {
    /// Also the file name prefix inside the log directory.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Explicit directives, e.g. `aflow=debug,tower_http=info`.
    #[must_use]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn file(mut self, file: LogFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Installs the subscriber. Keep the returned [`Logger`] alive until exit:
    /// dropping it flushes the file writer.
    ///
    /// # Errors
    /// [`LoggerError::InvalidConfiguration`] for a blank name, a bad filter or
    /// no enabled output, [`LoggerError::Io`]/[`LoggerError::Appender`] when
    /// the log directory is unusable, [`LoggerError::Subscriber`] when a
    /// global subscriber already exists.
    pub fn init(self) -> Result<Logger, LoggerError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Logger name cannot be empty"));
        }
        if !self.console && self.file.is_none() {
            return Err(invalid("Neither console nor file output is enabled"));
        }
        let filter = self.filter()?;

        let console = self
            .console
            .then(|| layer().compact().with_target(false).without_time().boxed());

        let (file, guard) = match self.file {
            Some(file) => {
                let (writer, guard) = tracing_appender::non_blocking(appender(&self.name, &file)?);
                let plain = layer().with_writer(writer).with_ansi(false);
                let boxed = if file.json { plain.json().boxed() } else { plain.boxed() };
                (Some(boxed), Some(guard))
            },
            None => (None, None),
        };

        tracing_subscriber::registry().with(filter).with(console).with(file).try_init()?;

        Ok(Logger { guard })
    }

    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.env_filter {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => builder
                .parse(directives)
                .map_err(|e| invalid(format!("Invalid env filter '{directives}': {e}"))),
        }
    }
}

fn appender(name: &str, file: &LogFile) -> Result<RollingFileAppender, LoggerError> {
    fs::create_dir_all(&file.dir)
        .context(format!("Failed to create log directory {}", file.dir.display()))?;

    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(name)
        .filename_suffix("log")
        .max_log_files(KEEP_DAYS)
        .build(&file.dir)?)
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> LoggerError {
    LoggerError::InvalidConfiguration { message: message.into(), context: None }
}

/// Handle to the installed subscriber.
#[must_use = "Dropping the logger stops the file writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder {
            name: "aflow".into(),
            level: LevelFilter::INFO,
            console: true,
            env_filter: None,
            file: None,
        }
    }

    /// Whether events are also written to a log directory.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_name_rejected() {
        let err = Logger::builder().name("  ").init().unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_requires_an_output() {
        let err = Logger::builder().console(false).init().unwrap_err();
        assert!(err.to_string().contains("Neither console nor file"));
    }

    #[test]
    fn test_invalid_env_filter_rejected() {
        let err = Logger::builder().env_filter("aflow=loud").init().unwrap_err();
        assert!(err.to_string().contains("Invalid env filter 'aflow=loud'"));
    }

    #[test]
    fn test_log_dir_blocked_by_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("logs");
        fs::write(&blocker, "").unwrap();

        let err = Logger::builder().file(LogFile::new(&blocker)).init().unwrap_err();
        assert_eq!(err.kind(), "Io");
        assert!(err.to_string().contains("Failed to create log directory"));
    }
}
