//! # Runtime
//!
//! Bootstraps the [Tokio](https://tokio.rs) runtime of the `aflow` binary.
//!
//! Tasks are independent async pipelines driven by filesystem and HTTP events,
//! so one scheduler thread is enough. Step chains and external tools run on the
//! blocking pool, which is the part worth sizing.
//!
//! ```rust,ignore
//! #[aflow_runtime::main(current_thread)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use aflow_derive::main;
pub use anyhow::Result;

use anyhow::anyhow;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Upper bound for the blocking pool (external tools, step chains).
const MAX_BLOCKING_THREADS: usize = 64;
/// How long an idle blocking thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(10);

/// Settings of the single-threaded runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub max_blocking_threads: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::current_thread()
    }
}

impl RuntimeConfig {
    #[must_use = "Use this configuration to build the runtime"]
    pub fn current_thread() -> Self {
        Self {
            max_blocking_threads: MAX_BLOCKING_THREADS,
            thread_name: "aflow-blocking".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

/// Creates a current-thread runtime with every driver (I/O, time, signals)
/// enabled.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the runtime cannot be created, typically due to
/// OS-level limits on thread creation.
///
/// ```rust
/// use aflow_runtime::{RuntimeConfig, build_runtime_with_config};
///
/// let runtime = build_runtime_with_config(&RuntimeConfig::current_thread())?;
/// assert_eq!(runtime.block_on(async { 42 }), 42);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    debug!(config = ?config, "Building tokio runtime");

    Builder::new_current_thread()
        .thread_name(&config.thread_name)
        .max_blocking_threads(config.max_blocking_threads.max(1))
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_current_thread() {
        assert_eq!(RuntimeConfig::default(), RuntimeConfig::current_thread());
    }

    #[test]
    fn test_blocking_work_runs_off_the_scheduler() -> Result<()> {
        let runtime = build_runtime_with_config(&RuntimeConfig::current_thread())?;
        let name = runtime.block_on(async {
            tokio::task::spawn_blocking(|| std::thread::current().name().map(str::to_owned)).await
        })?;
        assert_eq!(name.as_deref(), Some("aflow-blocking"));
        Ok(())
    }

    #[test]
    fn test_zero_blocking_threads_still_builds() -> Result<()> {
        let config = RuntimeConfig { max_blocking_threads: 0, ..RuntimeConfig::default() };
        let runtime = build_runtime_with_config(&config)?;
        assert_eq!(runtime.block_on(async { tokio::task::spawn_blocking(|| 7).await })?, 7);
        Ok(())
    }
}
