//! Style task (`compileSass`).
//!
//! Every stylesheet is linted, has its glob imports expanded, is compiled by
//! Sass and then post-processed natively: vendor prefixes, declaration
//! sorting and media-query merging. Development writes expanded CSS with a
//! source map; production minifies and writes no map. Partials (`_name.scss`)
//! are linted but never written.

pub mod css;
mod error;
pub mod glob_import;
pub mod lint;
pub mod media;
pub mod postcss;
mod task;

pub use crate::error::{StyleError, StyleErrorExt};
pub use crate::task::{StyleTask, StyleTaskInner, init};
