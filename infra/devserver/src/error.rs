use std::borrow::Cow;

#[aflow_derive::aflow_error]
pub enum DevServerError {
    #[error("Dev server I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Dev server error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
