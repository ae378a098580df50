//! Everything a transform task needs in one import.

pub use crate::asset::{Asset, Origin};
pub use crate::emit::{CommentSyntax, Emitter};
pub use crate::notify::{ConsoleNotifier, MemoryNotifier, Notification, Notifier};
pub use crate::report::{FileFailure, TaskReport};
pub use crate::source::{SourceFile, SourceGlob, is_partial};
pub use crate::step::{ChainFailure, Step, StepChain, StepError};
pub use crate::task::{Task, TaskError, TaskErrorExt};
pub use crate::tool::ExternalTool;
pub use aflow_domain::{Category, Mode, PathRegistry, PipelineConfig};
pub use aflow_storage::{OutputRoot, WriteOutcome};
