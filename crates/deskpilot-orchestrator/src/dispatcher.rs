//! Step dispatcher.
//!
//! The dispatcher owns the runtime adapter registry (system identifier →
//! [`SystemAdapter`]) and executes individual steps against it.  Adapter
//! faults are contained here: every invocation produces a
//! [`StepExecutionResult`], never a propagating error.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use deskpilot_templates::TemplateStep;

use crate::adapter::SystemAdapter;
use crate::context::{ExecutionContext, StepExecutionResult};

/// Resolves a step's target system to a registered adapter and invokes it.
#[derive(Clone, Default)]
pub struct StepDispatcher {
    adapters: Arc<DashMap<String, Arc<dyn SystemAdapter>>>,
}

impl StepDispatcher {
    /// Create a dispatcher with no registered adapters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under a system identifier.
    ///
    /// A later registration for the same system replaces the earlier one.
    pub fn register(&self, system: impl Into<String>, adapter: Arc<dyn SystemAdapter>) {
        let system = system.into();
        info!(system = %system, "system adapter registered");
        self.adapters.insert(system, adapter);
    }

    /// Execute one bound step.
    ///
    /// On success with non-empty output, the output is written into the
    /// context's shared data: under the step's `output_to` key when one is
    /// declared, and always under `step_<index>_output` for positional
    /// retrieval.  A tolerated failure (`continue_on_error` set) with
    /// non-empty output still persists under `output_to`, so later steps can
    /// inspect what went wrong.  This is the only write site for step
    /// output.
    pub async fn execute_step(
        &self,
        step: &TemplateStep,
        context: &mut ExecutionContext,
        step_index: usize,
    ) -> StepExecutionResult {
        let Some(adapter) = self.adapters.get(&step.system).map(|e| Arc::clone(e.value()))
        else {
            warn!(system = %step.system, step = step_index, "no adapter for system");
            return StepExecutionResult::failure(
                step_index,
                format!("no adapter registered for system `{}`", step.system),
            );
        };

        debug!(
            run_id = %context.run_id,
            step = step_index,
            system = %step.system,
            action = %step.action,
            "dispatching step"
        );

        let started = Instant::now();
        match adapter.execute(&step.action, &step.parameters).await {
            Ok(outcome) => {
                let result = StepExecutionResult {
                    step_index,
                    success: outcome.success,
                    output: outcome.output,
                    error: outcome.error,
                    duration: started.elapsed().as_secs_f64(),
                };

                if !result.output.is_empty() {
                    let output = Value::Object(result.output.clone());
                    if result.success {
                        if let Some(key) = &step.output_to {
                            context.set_data(key.clone(), output.clone());
                        }
                        context.set_data(format!("step_{step_index}_output"), output);
                    } else if step.continue_on_error {
                        if let Some(key) = &step.output_to {
                            context.set_data(key.clone(), output);
                        }
                    }
                }

                result
            }
            Err(fault) => {
                warn!(
                    run_id = %context.run_id,
                    step = step_index,
                    system = %step.system,
                    action = %step.action,
                    error = %fault,
                    "adapter fault"
                );
                let mut result = StepExecutionResult::failure(step_index, fault.to_string());
                result.duration = started.elapsed().as_secs_f64();
                result
            }
        }
    }
}
