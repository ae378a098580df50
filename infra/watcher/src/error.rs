use std::borrow::Cow;

#[aflow_derive::aflow_error]
pub enum WatcherError {
    /// The platform watcher could not be created or refused a path.
    #[error("Watcher failure{}: {source}", format_context(.context))]
    Notify { source: notify::Error, context: Option<Cow<'static, str>> },
}
