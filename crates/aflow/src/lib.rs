//! Facade crate for the assetflow pipeline.
//! Re-exports the domain and kernel and composes the feature tasks, the
//! watcher and the dev server into the entrypoints the CLI exposes.
//! Keep this crate thin: it wires crates together, transformations live in
//! the feature crates.
//!
//! ## Usage
//! ```no_run
//! use aflow::Pipeline;
//! use aflow::domain::{Mode, PipelineConfig};
//!
//! # async fn example() -> Result<(), aflow::PipelineError> {
//! let pipeline = Pipeline::builder().config(PipelineConfig::default()).build().await?;
//! let summary = pipeline.build(Mode::Production).await;
//! println!("{} file(s) failed", summary.failures());
//! # Ok(())
//! # }
//! ```

mod error;
mod events;
mod pipeline;
mod watch;

pub use aflow_devserver as devserver;
pub use aflow_domain as domain;
pub use aflow_event_bus as event_bus;
pub use aflow_kernel as kernel;

pub use error::{PipelineError, PipelineErrorExt};
pub use events::ReloadRequested;
pub use pipeline::{BuildSummary, Pipeline, PipelineBuilder, PipelineInner};

/// The feature crates, for direct access to their steps.
pub mod features {
    pub use aflow_images as images;
    pub use aflow_scripts as scripts;
    pub use aflow_styles as styles;
    pub use aflow_templates as templates;
}
