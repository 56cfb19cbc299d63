//! Per-run execution state.
//!
//! An [`ExecutionContext`] is exclusively owned by one orchestration run.
//! It carries the shared key/value store steps use to pass data, the
//! append-only log of step results, the cursor, and the run status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Status and results
// ---------------------------------------------------------------------------

/// The lifecycle status of an orchestration run.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The run has been created but not started.
    #[default]
    Pending,
    /// The drive loop is executing steps.
    Running,
    /// Every step ran (or was skipped) without an unrecoverable failure.
    Completed,
    /// The run stopped on an unrecoverable failure.
    Failed,
}

impl RunStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The recorded outcome of one step.  Immutable once appended to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecutionResult {
    /// Position of the step in the bound template.
    pub step_index: usize,
    /// Whether the step succeeded (skipped steps count as successes).
    pub success: bool,
    /// Output data produced by the adapter.
    #[serde(default)]
    pub output: Map<String, Value>,
    /// Failure description when `success == false`.
    #[serde(default)]
    pub error: Option<String>,
    /// Wall-clock execution time in seconds.
    #[serde(default)]
    pub duration: f64,
}

impl StepExecutionResult {
    /// A failure result with zero duration.
    #[must_use]
    pub fn failure(step_index: usize, error: impl Into<String>) -> Self {
        Self {
            step_index,
            success: false,
            output: Map::new(),
            error: Some(error.into()),
            duration: 0.0,
        }
    }

    /// The synthetic success recorded for a step whose condition was not met.
    #[must_use]
    pub fn skipped(step_index: usize) -> Self {
        let mut output = Map::new();
        output.insert("skipped".to_owned(), Value::Bool(true));
        Self {
            step_index,
            success: true,
            output,
            error: None,
            duration: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Mutable per-run state, exclusively owned by one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Unique run identifier, carried as a log field.
    pub run_id: Uuid,
    /// Cross-step key/value store.
    pub shared_data: Map<String, Value>,
    /// Append-only, ordered step-result log.
    pub step_results: Vec<StepExecutionResult>,
    /// Index of the step the drive loop is at.
    pub current_step: usize,
    /// Run lifecycle status.
    pub status: RunStatus,
    /// When the context was created.
    pub start_time: DateTime<Utc>,
}

impl ExecutionContext {
    /// Create a fresh context in the `Pending` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::now_v7(),
            shared_data: Map::new(),
            step_results: Vec::new(),
            current_step: 0,
            status: RunStatus::Pending,
            start_time: Utc::now(),
        }
    }

    /// Read a shared-data value.
    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.shared_data.get(key)
    }

    /// Write a shared-data value.
    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!(run_id = %self.run_id, key = %key, "context data set");
        self.shared_data.insert(key, value);
    }

    /// Append a step result to the log.  The log is never overwritten or
    /// reordered.
    pub fn save_step_result(&mut self, result: StepExecutionResult) {
        info!(
            run_id = %self.run_id,
            step = result.step_index,
            success = result.success,
            duration = result.duration,
            "step result recorded"
        );
        self.step_results.push(result);
    }

    /// Find the result recorded for a step index (linear scan; indices are
    /// assigned monotonically by the drive loop).
    #[must_use]
    pub fn step_result(&self, step_index: usize) -> Option<&StepExecutionResult> {
        self.step_results
            .iter()
            .find(|r| r.step_index == step_index)
    }

    /// The most recently recorded step result.
    #[must_use]
    pub fn last_step_result(&self) -> Option<&StepExecutionResult> {
        self.step_results.last()
    }

    /// Aggregate the run into a summary: per-outcome counts, total step
    /// duration, and elapsed wall time since the context was created.
    #[must_use]
    pub fn summary(&self) -> ExecutionSummary {
        let total_steps = self.step_results.len();
        let successful_steps = self.step_results.iter().filter(|r| r.success).count();
        ExecutionSummary {
            status: self.status,
            total_steps,
            successful_steps,
            failed_steps: total_steps - successful_steps,
            total_duration: self.step_results.iter().map(|r| r.duration).sum(),
            start_time: self.start_time,
            elapsed: (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0,
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregated view of a run, suitable for logging or display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub status: RunStatus,
    pub total_steps: usize,
    pub successful_steps: usize,
    pub failed_steps: usize,
    /// Sum of per-step durations in seconds.
    pub total_duration: f64,
    pub start_time: DateTime<Utc>,
    /// Wall time since the context was created, in seconds.
    pub elapsed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_result_lookup_is_by_index() {
        let mut ctx = ExecutionContext::new();
        ctx.save_step_result(StepExecutionResult::skipped(0));
        ctx.save_step_result(StepExecutionResult::failure(1, "boom"));

        assert!(ctx.step_result(0).unwrap().success);
        assert_eq!(ctx.step_result(1).unwrap().error.as_deref(), Some("boom"));
        assert!(ctx.step_result(2).is_none());
        assert_eq!(ctx.last_step_result().unwrap().step_index, 1);
    }

    #[test]
    fn summary_aggregates_counts_and_durations() {
        let mut ctx = ExecutionContext::new();
        ctx.status = RunStatus::Completed;
        ctx.save_step_result(StepExecutionResult {
            step_index: 0,
            success: true,
            output: Map::new(),
            error: None,
            duration: 0.5,
        });
        ctx.save_step_result(StepExecutionResult::failure(1, "boom"));

        let summary = ctx.summary();
        assert_eq!(summary.total_steps, 2);
        assert_eq!(summary.successful_steps, 1);
        assert_eq!(summary.failed_steps, 1);
        assert!((summary.total_duration - 0.5).abs() < f64::EPSILON);
        assert_eq!(summary.status, RunStatus::Completed);
    }

    #[test]
    fn skipped_result_shape() {
        let result = StepExecutionResult::skipped(3);
        assert!(result.success);
        assert_eq!(result.output["skipped"], Value::Bool(true));
        assert!(result.error.is_none());
        assert_eq!(result.duration, 0.0);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }
}
