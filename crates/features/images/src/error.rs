use aflow_kernel::task::TaskError;
use std::borrow::Cow;

/// Errors raised while binding the image task.
#[aflow_derive::aflow_error]
pub enum ImageError {
    #[error("Image task setup failed{}: {source}", format_context(.context))]
    Task { source: TaskError, context: Option<Cow<'static, str>> },
}
