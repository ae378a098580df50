use aflow_devserver::DevServerError;
use aflow_event_bus::EventBusError;
use aflow_images::ImageError;
use aflow_kernel::storage::StorageError;
use aflow_kernel::task::TaskError;
use aflow_scripts::ScriptError;
use aflow_styles::StyleError;
use aflow_templates::TemplateError;
use aflow_watcher::WatcherError;
use std::borrow::Cow;

#[aflow_derive::aflow_error]
pub enum PipelineError {
    #[error("{source}{}", format_context(.context))]
    Task { source: TaskError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Style { source: StyleError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Script { source: ScriptError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Template { source: TemplateError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Image { source: ImageError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Watcher { source: WatcherError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    DevServer { source: DevServerError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Events { source: EventBusError, context: Option<Cow<'static, str>> },

    #[error("Pipeline error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
