//! # Domain Models
//!
//! Pure pipeline types with minimal dependencies (`serde`, `strum`).
//! Keep it lean: no I/O or heavy logic, just data and simple helpers.

pub mod category;
pub mod config;
pub mod mode;
pub mod registry;

pub use category::Category;
pub use config::PipelineConfig;
pub use mode::Mode;
pub use registry::{PathRegistry, RegistryEntry, SourceSpec};
