//! Task-flow template data model.
//!
//! Templates are loaded once into a [`crate::TemplateRegistry`] and treated
//! as immutable; the binding engine produces a resolved copy per
//! orchestration run, never mutating the registry copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Step condition
// ---------------------------------------------------------------------------

/// When a step is allowed to execute, relative to the outcome of the
/// previous executed (non-skipped) step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCondition {
    /// Execute unconditionally.
    #[default]
    None,
    /// Execute only if the previous executed step succeeded.
    IfSuccess,
    /// Execute only if the previous executed step failed.
    IfFailure,
    /// Unrecognized condition string.  Evaluates fail-open (the step runs).
    #[serde(other)]
    Other,
}

impl StepCondition {
    /// Evaluate the condition against the outcome of the previous executed
    /// step.  `previous == None` means no step has executed yet; the first
    /// step always runs regardless of its declared condition.
    #[must_use]
    pub fn is_met(self, previous: Option<bool>) -> bool {
        let Some(prev) = previous else {
            return true;
        };
        match self {
            Self::None | Self::Other => true,
            Self::IfSuccess => prev,
            Self::IfFailure => !prev,
        }
    }
}

// ---------------------------------------------------------------------------
// Steps and templates
// ---------------------------------------------------------------------------

/// A single step within a task-flow template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStep {
    /// Target system identifier (e.g. `browser`, `ide`, `terminal`).
    pub system: String,

    /// The action to invoke on the target system.
    pub action: String,

    /// Action parameters.  String values may contain `{{intent.<name>}}`
    /// placeholders that the binding engine resolves.
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Execution condition relative to the previous step's outcome.
    #[serde(default)]
    pub condition: StepCondition,

    /// Context key whose value is merged into this step's parameters.
    #[serde(default)]
    pub input_from: Option<String>,

    /// Context key that receives this step's output.
    #[serde(default)]
    pub output_to: Option<String>,

    /// Whether the run proceeds past a failure of this step.
    #[serde(default)]
    pub continue_on_error: bool,
}

/// A named, ordered workflow of steps serving one or more intent types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFlowTemplate {
    /// Unique template name.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// The intent types this template serves.
    pub intent_types: Vec<String>,

    /// The ordered sequence of steps to execute.
    pub steps: Vec<TemplateStep>,

    /// Template-level default parameters.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl TaskFlowTemplate {
    /// Whether this template serves the given intent type (exact membership).
    #[must_use]
    pub fn matches_intent(&self, intent_type: &str) -> bool {
        self.intent_types.iter().any(|t| t == intent_type)
    }
}
