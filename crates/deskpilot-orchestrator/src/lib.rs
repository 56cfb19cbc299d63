//! Task-flow orchestration engine for deskpilot.
//!
//! This crate provides:
//!
//! - **Adapter contract**: [`SystemAdapter`] — the narrow interface every
//!   target-system integration (browser, IDE, terminal, ...) implements.
//! - **Execution context**: [`ExecutionContext`] — per-run mutable state:
//!   shared key/value data, the ordered step-result log, and run status.
//! - **Step dispatcher**: [`StepDispatcher`] — resolves a step's target
//!   system to a registered adapter and contains adapter faults.
//! - **Orchestrator**: [`Orchestrator`] — the drive loop that selects a
//!   template for an intent, binds parameters, and sequences steps under
//!   skip/continue/fail-fast policy.

pub mod adapter;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;

pub use adapter::{StepOutcome, SystemAdapter};
pub use context::{ExecutionContext, ExecutionSummary, RunStatus, StepExecutionResult};
pub use dispatcher::StepDispatcher;
pub use error::{AdapterError, OrchestratorError};
pub use orchestrator::{ExecutionPlan, Orchestrator, PlannedStep};
