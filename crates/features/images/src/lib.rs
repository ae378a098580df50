//! Image task (`minImages`).
//!
//! Incremental: only files modified since the previous run started are
//! processed. JPEG, PNG and GIF go through external optimizers, SVG is
//! cleaned natively, anything else is copied. An optimization that does not
//! shrink the file is discarded in favour of the original bytes.

mod error;
pub mod format;
pub mod svg;
mod task;

pub use crate::error::{ImageError, ImageErrorExt};
pub use crate::format::ImageFormat;
pub use crate::task::{ImageTask, ImageTaskInner, init};
