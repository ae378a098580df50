//! Template task (`compilePug`).
//!
//! Pages are MiniJinja templates rendered with `mode` and `page.path` in
//! scope, then pretty-printed. The template source directory is the loader
//! root, so `{% extends %}` and `{% include %}` resolve against it. Partials
//! (`_name.html`) are only ever reached through the loader.

mod error;
pub mod html;
pub mod render;
mod task;

pub use crate::error::{TemplateError, TemplateErrorExt};
pub use crate::task::{TemplateTask, TemplateTaskInner, init};
