//! Kernel utilities shared by the transform tasks.
//! Keep this crate lightweight: it provides the building blocks every task
//! composes (source discovery, step chains, output emission, reporting) and
//! leaves the actual transformations to the feature crates.
//!
//! ## Config loading
//! ```rust,no_run
//! use aflow_kernel::config::load_config;
//! use aflow_kernel::domain::PipelineConfig;
//!
//! let cfg: PipelineConfig = load_config(None::<&str>).unwrap();
//! assert_eq!(cfg.server.port, 3000);
//! ```
//!
//! ## Step chains
//! ```rust
//! use aflow_kernel::step::{Step, StepChain, StepError};
//! use aflow_kernel::asset::Asset;
//!
//! #[derive(Debug)]
//! struct Upper;
//!
//! impl Step for Upper {
//!     fn name(&self) -> &'static str { "upper" }
//!     fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
//!         let text = asset.text()?.to_uppercase();
//!         asset.set_text(text);
//!         Ok(asset)
//!     }
//! }
//!
//! let chain = StepChain::new().then(Upper);
//! let out = chain.apply(Asset::from_text("a.txt", "hi")).unwrap();
//! assert_eq!(out.contents, b"HI");
//! ```

pub mod asset;
pub mod config;
pub mod emit;
pub mod notify;
pub mod prelude;
pub mod report;
pub mod source;
pub mod sourcemap;
pub mod step;
pub mod task;
pub mod tool;

pub use aflow_domain as domain;
pub use aflow_storage as storage;
