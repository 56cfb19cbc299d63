//! Orchestration error types.
//!
//! Adapter faults never cross the dispatcher boundary and orchestration
//! faults never cross the orchestrator boundary — both are converted into
//! structured results.  The enums here exist so the conversion sites have
//! typed errors to convert from.

/// Faults raised by system adapters while executing a step action.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The adapter does not support the requested action.
    #[error("unsupported action `{action}`")]
    UnsupportedAction { action: String },

    /// The parameters supplied for an action are invalid.
    #[error("invalid parameters for action `{action}`: {reason}")]
    InvalidParams { action: String, reason: String },

    /// The action was attempted but failed.
    #[error("action `{action}` failed: {reason}")]
    ExecutionFailed { action: String, reason: String },

    /// An I/O operation failed within the adapter.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.  Prefer a typed variant
    /// whenever possible.
    #[error("internal adapter error: {0}")]
    Internal(String),
}

/// Faults arising inside the orchestration drive loop.
///
/// These never reach the caller of `orchestrate`; they are converted into a
/// `Failed` run status on the returned context.  `plan_for` surfaces
/// [`OrchestratorError::TemplateNotFound`] directly as its structured
/// no-template descriptor.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// No registered template serves the intent type.
    #[error("no template registered for intent type `{intent_type}`")]
    TemplateNotFound { intent_type: String },

    /// A step failed and its template forbids continuing.
    #[error("step {step_index} failed: {reason}")]
    StepFailed { step_index: usize, reason: String },
}
