use aflow_kernel::task::TaskError;
use std::borrow::Cow;

/// Errors raised while binding the script task.
#[aflow_derive::aflow_error]
pub enum ScriptError {
    #[error("Script task setup failed{}: {source}", format_context(.context))]
    Task { source: TaskError, context: Option<Cow<'static, str>> },
}
