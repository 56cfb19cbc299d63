//! The orchestration drive loop.
//!
//! [`Orchestrator`] is the top-level state machine: it selects a template
//! for a recognized intent, binds its parameters, then iterates the bound
//! steps applying skip/continue/fail-fast policy.  The caller always gets a
//! terminal, well-formed [`ExecutionContext`] back — faults are converted
//! into a `Failed` status, never raised.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use deskpilot_intent::Intent;
use deskpilot_templates::{TemplateEngine, TemplateRegistry};

use crate::context::{ExecutionContext, RunStatus, StepExecutionResult};
use crate::dispatcher::StepDispatcher;
use crate::error::OrchestratorError;

// ---------------------------------------------------------------------------
// Plan preview
// ---------------------------------------------------------------------------

/// A read-only preview of the steps an intent would trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// The intent type the plan was resolved for.
    pub intent: String,
    /// The matched template's name.
    pub template: String,
    /// The matched template's description.
    pub description: String,
    /// The steps that would run, in order.
    pub steps: Vec<PlannedStep>,
}

/// One step of an [`ExecutionPlan`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Position of the step in the template.
    pub index: usize,
    /// Target system identifier.
    pub system: String,
    /// The action the step would invoke.
    pub action: String,
    /// Human-readable `system: action` label.
    pub description: String,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives task-flow execution for recognized intents.
pub struct Orchestrator {
    registry: TemplateRegistry,
    dispatcher: StepDispatcher,
    engine: TemplateEngine,
}

impl Orchestrator {
    /// Create an orchestrator over a loaded template registry and an adapter
    /// dispatcher.
    #[must_use]
    pub fn new(registry: TemplateRegistry, dispatcher: StepDispatcher) -> Self {
        Self {
            registry,
            dispatcher,
            engine: TemplateEngine::new(),
        }
    }

    /// Orchestrate the task flow for a recognized intent.
    ///
    /// A fresh context is created when none is supplied.  The returned
    /// context is always terminal: `Completed` when every step ran or was
    /// skipped, `Failed` otherwise.  This method never returns an error and
    /// never panics across its boundary.
    pub async fn orchestrate(
        &self,
        intent: &Intent,
        context: Option<ExecutionContext>,
    ) -> ExecutionContext {
        let mut context = context.unwrap_or_default();
        context.status = RunStatus::Running;

        info!(
            run_id = %context.run_id,
            intent = %intent.intent_type,
            confidence = intent.confidence,
            "orchestration started"
        );

        if let Err(fault) = self.drive(intent, &mut context).await {
            error!(run_id = %context.run_id, error = %fault, "orchestration failed");
            context.status = RunStatus::Failed;
        }

        context
    }

    /// The fallible interior of [`Self::orchestrate`].  Any `Err` is
    /// converted into a `Failed` status by the caller; the partially
    /// populated context survives.
    async fn drive(
        &self,
        intent: &Intent,
        context: &mut ExecutionContext,
    ) -> Result<(), OrchestratorError> {
        let template = self
            .registry
            .find_by_intent(&intent.intent_type)
            .ok_or_else(|| OrchestratorError::TemplateNotFound {
                intent_type: intent.intent_type.clone(),
            })?;

        info!(run_id = %context.run_id, template = %template.name, "template matched");

        let bound = self
            .engine
            .bind_parameters(template, intent, &context.shared_data);

        context.current_step = 0;
        let mut previous_success: Option<bool> = None;

        while context.current_step < bound.steps.len() {
            let index = context.current_step;
            let step = &bound.steps[index];

            if !self.engine.should_execute(step, previous_success) {
                info!(run_id = %context.run_id, step = index, "condition not met, skipping");
                context.save_step_result(StepExecutionResult::skipped(index));
                context.current_step += 1;
                // A skipped step does not change what the next condition sees.
                continue;
            }

            // Earlier steps' outputs only exist now, so the input_from merge
            // is re-resolved against the current shared data.
            let resolved = self.engine.resolve_input(step, intent, &context.shared_data);
            let result = self.dispatcher.execute_step(&resolved, context, index).await;
            let success = result.success;
            let step_error = result.error.clone();
            context.save_step_result(result);

            if !success && !step.continue_on_error {
                // Fail fast: remaining steps never run and the cursor stays
                // at the failing index.
                return Err(OrchestratorError::StepFailed {
                    step_index: index,
                    reason: step_error.unwrap_or_else(|| "step failed".to_owned()),
                });
            }

            context.current_step += 1;
            previous_success = Some(success);
        }

        context.status = RunStatus::Completed;
        info!(
            run_id = %context.run_id,
            steps = context.step_results.len(),
            "orchestration completed"
        );
        Ok(())
    }

    /// Preview the steps an intent would trigger, without executing
    /// anything.
    ///
    /// Returns [`OrchestratorError::TemplateNotFound`] when no template
    /// serves the intent type.
    pub fn plan_for(&self, intent: &Intent) -> Result<ExecutionPlan, OrchestratorError> {
        let template = self
            .registry
            .find_by_intent(&intent.intent_type)
            .ok_or_else(|| OrchestratorError::TemplateNotFound {
                intent_type: intent.intent_type.clone(),
            })?;

        let steps = template
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| PlannedStep {
                index,
                system: step.system.clone(),
                action: step.action.clone(),
                description: format!("{}: {}", step.system, step.action),
            })
            .collect();

        Ok(ExecutionPlan {
            intent: intent.intent_type.clone(),
            template: template.name.clone(),
            description: template.description.clone(),
            steps,
        })
    }
}
