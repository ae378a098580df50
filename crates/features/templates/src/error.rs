use aflow_kernel::task::TaskError;
use std::borrow::Cow;

/// Errors raised while binding the template task.
#[aflow_derive::aflow_error]
pub enum TemplateError {
    #[error("Template task setup failed{}: {source}", format_context(.context))]
    Task { source: TaskError, context: Option<Cow<'static, str>> },
}
