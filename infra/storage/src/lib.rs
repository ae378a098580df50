//! Sandboxed output tree for generated assets.
//!
//! Every task writes through an [`OutputRoot`] bound to its output directory.
//! Relative paths are resolved lexically and checked against the root, so a
//! crafted source name can never write outside the output tree.
//!
//! # Core Features
//!
//! - **Atomic Writes**: unique temp file + `rename`, so the dev server never
//!   serves a half-written file.
//! - **Change Awareness**: identical content is not rewritten; the outcome tells
//!   the caller whether a file was created, updated or left unchanged.
//! - **Idempotent Cleanup**: removing an absent file or an absent root succeeds.
//! - **Self-Healing**: orphaned temp files from interrupted runs are purged on open.
//!
//! # Examples
//!
//! ```rust
//! use aflow_storage::{OutputRoot, StorageError, WriteOutcome};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let dist = tmp.path().join("dist");
//!     let output = OutputRoot::builder().root(&dist).open().await?;
//!
//!     assert_eq!(output.write("assets/css/app.css", b"a{}").await?, WriteOutcome::Created);
//!     assert_eq!(output.write("assets/css/app.css", b"a{}").await?, WriteOutcome::Unchanged);
//!
//!     assert!(output.clean().await?);
//!     assert!(!output.clean().await?);
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod maintenance;
mod security;

pub use builder::OutputRootBuilder;
pub use engine::{OutputRoot, WriteOutcome};
pub use error::{StorageError, StorageErrorExt};
