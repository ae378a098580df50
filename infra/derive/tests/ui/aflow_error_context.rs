use aflow_derive::aflow_error;
use std::borrow::Cow;

#[aflow_error]
pub enum WriteError {
    #[error("Write failed{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

fn write_missing() -> Result<(), WriteError> {
    let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    Err::<(), _>(missing).context("dist/app.css")
}

fn main() {
    let err = write_missing().unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert_eq!(err.to_string(), "Write failed (dist/app.css): gone");

    let converted: WriteError = std::io::Error::other("raw").into();
    assert!(matches!(converted, WriteError::Io { context: None, .. }));
}
