use crate::report::TaskReport;
use aflow_domain::{Category, Mode};
use std::borrow::Cow;
use std::future::Future;

/// Task-level failures. Per-file lint and transform failures never end up
/// here; they are collected in the [`TaskReport`].
#[aflow_derive::aflow_error]
pub enum TaskError {
    #[error("{source}{}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Storage { source: aflow_storage::StorageError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Walk { source: walkdir::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid source pattern{}: {source}", format_context(.context))]
    Pattern { source: glob::PatternError, context: Option<Cow<'static, str>> },

    #[error("Task worker failed{}: {source}", format_context(.context))]
    Join { source: tokio::task::JoinError, context: Option<Cow<'static, str>> },

    #[error("Internal task error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A named, asynchronous unit of work bound to one [`Category`].
///
/// Implementations read their sources, run a step chain per file and write the
/// results. They hold no state between runs except where a category documents
/// otherwise (incremental images).
pub trait Task: Send + Sync {
    fn category(&self) -> Category;

    fn name(&self) -> &'static str {
        self.category().task_name()
    }

    /// Runs the task once in `mode`.
    ///
    /// # Errors
    /// Returns a [`TaskError`] for filesystem failures; file-level transformation
    /// failures are reported inside the [`TaskReport`].
    fn run(&self, mode: Mode) -> impl Future<Output = Result<TaskReport, TaskError>> + Send;
}
