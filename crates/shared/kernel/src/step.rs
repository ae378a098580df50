//! Ordered transformation steps.
//!
//! A task is a fixed list of [`Step`]s; each step is a synchronous function
//! from [`Asset`] to [`Asset`] that may fail. [`StepChain`] runs them in order
//! on tokio's blocking pool and stops at the first failure.

use crate::asset::Asset;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::trace;

#[aflow_derive::aflow_error]
pub enum StepError {
    /// Source violates a lint rule. The message is the formatted lint report.
    #[error("{message}{}", format_context(.context))]
    Lint { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Source could not be transformed (malformed input, tool rejected it).
    #[error("{message}{}", format_context(.context))]
    Transform { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// An external tool could not be started or talked to.
    #[error("Tool failure{}: {source}", format_context(.context))]
    Tool { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal step error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// One transformation in a task's chain.
pub trait Step: Send + Sync + Debug {
    /// Short identifier shown in failure reports (`lint`, `sass`, `minify`, ...).
    fn name(&self) -> &'static str;

    /// Transforms the asset.
    ///
    /// # Errors
    /// Returns a [`StepError`] when the asset cannot be processed; the chain stops.
    fn apply(&self, asset: Asset) -> Result<Asset, StepError>;
}

/// Failure of a chain: which step failed and why.
#[derive(Debug)]
pub struct ChainFailure {
    pub step: &'static str,
    pub error: StepError,
}

impl std::fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.step, self.error)
    }
}

/// An ordered, cheaply cloneable list of steps.
#[derive(Debug, Clone, Default)]
pub struct StepChain {
    steps: Vec<Arc<dyn Step>>,
}

impl StepChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "The chain is built by value; keep the returned chain"]
    pub fn then(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Appends `step` only when present (e.g. a disabled external tool).
    #[must_use = "The chain is built by value; keep the returned chain"]
    pub fn then_some(self, step: Option<impl Step + 'static>) -> Self {
        match step {
            Some(step) => self.then(step),
            None => self,
        }
    }

    /// Appends `step` only when `enabled` holds (mode branches).
    #[must_use = "The chain is built by value; keep the returned chain"]
    pub fn then_if(self, enabled: bool, step: impl Step + 'static) -> Self {
        if enabled { self.then(step) } else { self }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step in order on the current thread.
    ///
    /// # Errors
    /// Returns the first failing step as a [`ChainFailure`].
    pub fn apply(&self, mut asset: Asset) -> Result<Asset, ChainFailure> {
        for step in &self.steps {
            trace!(step = step.name(), asset = %asset.relative.display(), "Applying step");
            asset = step.apply(asset).map_err(|error| ChainFailure { step: step.name(), error })?;
        }
        Ok(asset)
    }

    /// Runs the chain on the blocking pool so tools and CPU work never stall the event loop.
    ///
    /// # Errors
    /// Returns the first failing step, or a `runtime` failure if the worker panicked.
    pub async fn run(&self, asset: Asset) -> Result<Asset, ChainFailure> {
        let chain = self.clone();
        tokio::task::spawn_blocking(move || chain.apply(asset)).await.unwrap_or_else(|e| {
            Err(ChainFailure {
                step: "runtime",
                error: StepError::Internal { message: e.to_string().into(), context: None },
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Append(&'static str);

    impl Step for Append {
        fn name(&self) -> &'static str {
            "append"
        }

        fn apply(&self, mut asset: Asset) -> Result<Asset, StepError> {
            asset.contents.extend_from_slice(self.0.as_bytes());
            Ok(asset)
        }
    }

    #[derive(Debug)]
    struct Fail;

    impl Step for Fail {
        fn name(&self) -> &'static str {
            "fail"
        }

        fn apply(&self, _asset: Asset) -> Result<Asset, StepError> {
            Err(StepError::Lint { message: "nope".into(), context: None })
        }
    }

    #[derive(Debug, Default)]
    struct Count(Arc<AtomicUsize>);

    impl Step for Count {
        fn name(&self) -> &'static str {
            "count"
        }

        fn apply(&self, asset: Asset) -> Result<Asset, StepError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(asset)
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let chain = StepChain::new().then(Append("a")).then(Append("b")).then_if(false, Append("c"));
        let out = chain.apply(Asset::from_text("x", "")).unwrap();
        assert_eq!(out.contents, b"ab");
        assert_eq!(chain.names(), vec!["append", "append"]);
    }

    #[test]
    fn test_chain_stops_at_first_failure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let chain = StepChain::new().then(Fail).then(Count(counter.clone()));

        let failure = chain.apply(Asset::from_text("x", "")).unwrap_err();
        assert_eq!(failure.step, "fail");
        assert_eq!(failure.to_string(), "[fail] nope");
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_then_some_skips_none() {
        let chain = StepChain::new().then_some(None::<Append>).then_some(Some(Append("z")));
        assert_eq!(chain.len(), 1);
    }

    #[tokio::test]
    async fn test_run_on_blocking_pool() {
        let chain = StepChain::new().then(Append("!"));
        let out = chain.run(Asset::from_text("x", "hi")).await.unwrap();
        assert_eq!(out.contents, b"hi!");
    }
}
