//! System adapter contract.
//!
//! Every target-system integration (browser, IDE, terminal, window manager,
//! ...) implements [`SystemAdapter`] and is registered with the dispatcher
//! under a system identifier.  The orchestration core depends only on this
//! contract; it performs no perception or input generation itself.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::AdapterError;

/// The outcome of one adapter action.
///
/// `success == false` with a populated `error` is the normal way for an
/// adapter to report a domain-level failure (element not found, command
/// exited non-zero, ...).  Returning `Err(AdapterError)` is reserved for
/// faults; the dispatcher converts those into failed step results too.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Whether the action achieved its goal.
    pub success: bool,
    /// Structured output data, merged into the run's shared data when the
    /// step declares `output_to`.
    pub output: Map<String, Value>,
    /// Failure description when `success == false`.
    pub error: Option<String>,
}

impl StepOutcome {
    /// A successful outcome carrying the given output data.
    #[must_use]
    pub fn success(output: Map<String, Value>) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    /// A failed outcome with a description of what went wrong.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: Map::new(),
            error: Some(error.into()),
        }
    }
}

/// A target-system capability provider.
///
/// Adapters expose exactly one operation: execute a named action with a
/// parameter map.  Retry, backoff, and timeouts are the adapter's own
/// responsibility; the orchestrator applies none of its own.
#[async_trait]
pub trait SystemAdapter: Send + Sync {
    /// Execute a named action with the given parameters.
    async fn execute(
        &self,
        action: &str,
        parameters: &Map<String, Value>,
    ) -> Result<StepOutcome, AdapterError>;
}
