//! Recognized-intent data model for deskpilot.
//!
//! An [`Intent`] is produced once per user request by an external recognizer
//! (LLM-based or otherwise) and consumed exactly once by the orchestrator.
//! This crate only defines the value type and the actionability rule; intent
//! classification itself lives outside the orchestration core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimum confidence score for an intent to be considered actionable.
pub const CONFIDENCE_THRESHOLD: f64 = 0.85;

/// A recognized user intent.
///
/// Parameters are heterogeneous (`string`/`number`/`bool`/`object`) and are
/// carried as JSON values; the template engine later binds them into
/// workflow step parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// The intent type identifier (e.g. `open_project`, `run_tests`).
    #[serde(rename = "type")]
    pub intent_type: String,

    /// Parameters extracted from the user message.
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Recognizer confidence score in `[0, 1]`.
    pub confidence: f64,

    /// The original user message the intent was extracted from.
    pub raw_message: String,

    /// The recognizer's reasoning, if it provides one.
    #[serde(default)]
    pub reasoning: String,
}

impl Intent {
    /// Create an intent with full confidence, e.g. for direct CLI invocation
    /// where no recognizer is involved.
    pub fn direct(intent_type: impl Into<String>, parameters: Map<String, Value>) -> Self {
        let intent_type = intent_type.into();
        Self {
            raw_message: intent_type.clone(),
            intent_type,
            parameters,
            confidence: 1.0,
            reasoning: String::new(),
        }
    }

    /// Whether the recognizer was confident enough for this intent to be
    /// acted upon.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.confidence >= CONFIDENCE_THRESHOLD
    }
}
