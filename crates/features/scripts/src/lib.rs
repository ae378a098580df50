//! Script task (`minJs`).
//!
//! Lints every script, hands it to the configured transpiler and, in
//! production, minifies the result. Development output carries a source map.

mod error;
pub mod lexer;
pub mod lint;
pub mod minify;
mod task;

pub use crate::error::{ScriptError, ScriptErrorExt};
pub use crate::task::{ScriptTask, ScriptTaskInner, init};
