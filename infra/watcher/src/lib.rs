//! # Watcher
//!
//! One native filesystem watcher fanned out to per-subscription channels.
//! Each subscription covers a directory tree plus a [`PathFilter`]; raw
//! events are reduced to changed paths and grouped into batches with a
//! trailing debounce ([`Subscription::next_batch`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use aflow_watcher::{FileWatcher, WatcherError};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), WatcherError> {
//! let mut watcher = FileWatcher::new()?;
//! let mut styles = watcher.subscribe("styles", "src/scss", |p: &Path| {
//!     p.extension().is_some_and(|e| e == "scss")
//! })?;
//!
//! while let Some(batch) = styles.next_batch(Duration::from_millis(200)).await {
//!     println!("{} file(s) changed", batch.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod filter;
mod subscription;
mod watcher;

pub use error::{WatcherError, WatcherErrorExt};
pub use filter::PathFilter;
pub use subscription::Subscription;
pub use watcher::FileWatcher;
