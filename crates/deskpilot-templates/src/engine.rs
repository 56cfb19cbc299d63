//! Template binding engine.
//!
//! [`TemplateEngine`] turns a registry template plus a recognized intent and
//! per-run context data into a *bound* template: a new instance whose step
//! parameters have all `{{intent.<name>}}` placeholders resolved and whose
//! scalar strings are coerced into typed values.  Binding is pure — the
//! registry template is never mutated.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Number, Value};

use deskpilot_intent::Intent;

use crate::models::{TaskFlowTemplate, TemplateStep};

/// `{{intent.<name>}}` placeholder pattern.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{intent\.(\w+)\}\}").expect("placeholder regex is valid"));

/// Parameter binding and condition evaluation for task-flow templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    /// Create a new template engine.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Bind a template's step parameters against the intent's parameters and
    /// the run's shared context data.
    ///
    /// The two sources are merged with context data winning on key
    /// collision.  Returns a new template; the input template is unchanged.
    #[must_use]
    pub fn bind_parameters(
        &self,
        template: &TaskFlowTemplate,
        intent: &Intent,
        context_data: &Map<String, Value>,
    ) -> TaskFlowTemplate {
        let mut merged = intent.parameters.clone();
        for (key, value) in context_data {
            merged.insert(key.clone(), value.clone());
        }

        let bound_steps = template
            .steps
            .iter()
            .map(|step| self.bind_step(step, &merged))
            .collect();

        TaskFlowTemplate {
            name: template.name.clone(),
            description: template.description.clone(),
            intent_types: template.intent_types.clone(),
            steps: bound_steps,
            parameters: template.parameters.clone(),
        }
    }

    /// Whether a step should execute given the outcome of the previous
    /// executed step (`None` before any step has executed).
    #[must_use]
    pub fn should_execute(&self, step: &TemplateStep, previous: Option<bool>) -> bool {
        step.condition.is_met(previous)
    }

    /// Re-resolve a step's `input_from` merge against fresh run data.
    ///
    /// Binding happens once before the drive loop starts, but `input_from`
    /// usually names the output of an *earlier step in the same run* — data
    /// that only exists once that step has executed.  The drive loop calls
    /// this just before dispatching each step so the merge sees the current
    /// shared data.
    #[must_use]
    pub fn resolve_input(
        &self,
        step: &TemplateStep,
        intent: &Intent,
        context_data: &Map<String, Value>,
    ) -> TemplateStep {
        if step.input_from.is_none() {
            return step.clone();
        }

        let mut merged = intent.parameters.clone();
        for (key, value) in context_data {
            merged.insert(key.clone(), value.clone());
        }

        let mut resolved = step.clone();
        apply_input_from(step, &mut resolved.parameters, &merged);
        resolved
    }

    fn bind_step(&self, step: &TemplateStep, params: &Map<String, Value>) -> TemplateStep {
        let mut bound = Map::with_capacity(step.parameters.len());

        for (key, value) in &step.parameters {
            let resolved = match value {
                Value::String(text) => substitute_placeholders(text, params),
                other => other.clone(),
            };
            bound.insert(key.clone(), resolved);
        }

        apply_input_from(step, &mut bound, params);

        TemplateStep {
            system: step.system.clone(),
            action: step.action.clone(),
            parameters: bound,
            condition: step.condition,
            input_from: step.input_from.clone(),
            output_to: step.output_to.clone(),
            continue_on_error: step.continue_on_error,
        }
    }
}

/// Merge the value named by a step's `input_from` into its parameters.
/// Objects merge entry-by-entry (overriding prior keys); anything else lands
/// under the fixed `input_data` key.  Absent keys are a no-op.
fn apply_input_from(
    step: &TemplateStep,
    bound: &mut Map<String, Value>,
    params: &Map<String, Value>,
) {
    let Some(input_key) = &step.input_from else {
        return;
    };
    let Some(input) = params.get(input_key) else {
        return;
    };
    match input {
        Value::Object(entries) => {
            for (key, value) in entries {
                bound.insert(key.clone(), value.clone());
            }
        }
        scalar => {
            bound.insert("input_data".to_owned(), scalar.clone());
        }
    }
}

/// Replace `{{intent.<name>}}` placeholders in `text`, then coerce the whole
/// resulting string into a typed scalar where possible.
///
/// Unmatched placeholders are left verbatim.
fn substitute_placeholders(text: &str, params: &Map<String, Value>) -> Value {
    let replaced = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
        match params.get(&caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            // Objects, arrays, and null are stringified as their JSON text.
            Some(other) => other.to_string(),
            None => caps[0].to_owned(),
        }
    });

    coerce_scalar(replaced.into_owned())
}

/// Coerce a fully-substituted string: all-digits → integer, a single
/// decimal point surrounded by digits → float, case-insensitive
/// `true`/`false` → bool, anything else stays a string.
fn coerce_scalar(text: String) -> Value {
    if is_all_digits(&text) {
        // Digits that overflow i64 are kept as the original string.
        return match text.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(text),
        };
    }

    if let Some((head, tail)) = text.split_once('.') {
        let mut digits = String::with_capacity(head.len() + tail.len());
        digits.push_str(head);
        digits.push_str(tail);
        if is_all_digits(&digits) {
            if let Ok(f) = text.parse::<f64>() {
                if let Some(n) = Number::from_f64(f) {
                    return Value::Number(n);
                }
            }
        }
    }

    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(text)
}

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepCondition;

    fn step_with_params(params: Value) -> TemplateStep {
        TemplateStep {
            system: "terminal".into(),
            action: "execute".into(),
            parameters: params.as_object().cloned().unwrap_or_default(),
            condition: StepCondition::None,
            input_from: None,
            output_to: None,
            continue_on_error: false,
        }
    }

    fn template_with_step(step: TemplateStep) -> TaskFlowTemplate {
        TaskFlowTemplate {
            name: "test".into(),
            description: String::new(),
            intent_types: vec!["test_intent".into()],
            steps: vec![step],
            parameters: Map::new(),
        }
    }

    fn intent_with_params(params: Value) -> Intent {
        Intent::direct("test_intent", params.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn substitutes_and_coerces_integer() {
        let engine = TemplateEngine::new();
        let template =
            template_with_step(step_with_params(serde_json::json!({"count": "{{intent.x}}"})));
        let intent = intent_with_params(serde_json::json!({"x": "42"}));

        let bound = engine.bind_parameters(&template, &intent, &Map::new());
        assert_eq!(bound.steps[0].parameters["count"], serde_json::json!(42));
    }

    #[test]
    fn substitutes_and_coerces_float() {
        let engine = TemplateEngine::new();
        let template =
            template_with_step(step_with_params(serde_json::json!({"ratio": "{{intent.x}}"})));
        let intent = intent_with_params(serde_json::json!({"x": "3.14"}));

        let bound = engine.bind_parameters(&template, &intent, &Map::new());
        assert_eq!(bound.steps[0].parameters["ratio"], serde_json::json!(3.14));
    }

    #[test]
    fn substitutes_and_coerces_bool() {
        let engine = TemplateEngine::new();
        let template =
            template_with_step(step_with_params(serde_json::json!({"flag": "{{intent.x}}"})));
        let intent = intent_with_params(serde_json::json!({"x": "true"}));

        let bound = engine.bind_parameters(&template, &intent, &Map::new());
        assert_eq!(bound.steps[0].parameters["flag"], serde_json::json!(true));
    }

    #[test]
    fn unmatched_placeholder_stays_verbatim() {
        let engine = TemplateEngine::new();
        let template =
            template_with_step(step_with_params(serde_json::json!({"value": "{{intent.x}}"})));
        let intent = intent_with_params(serde_json::json!({}));

        let bound = engine.bind_parameters(&template, &intent, &Map::new());
        assert_eq!(
            bound.steps[0].parameters["value"],
            serde_json::json!("{{intent.x}}")
        );
    }

    #[test]
    fn embedded_placeholder_keeps_string_type() {
        let engine = TemplateEngine::new();
        let template = template_with_step(step_with_params(
            serde_json::json!({"command": "git clone {{intent.repo}} --depth {{intent.depth}}"}),
        ));
        let intent =
            intent_with_params(serde_json::json!({"repo": "https://example.com/r.git", "depth": 1}));

        let bound = engine.bind_parameters(&template, &intent, &Map::new());
        assert_eq!(
            bound.steps[0].parameters["command"],
            serde_json::json!("git clone https://example.com/r.git --depth 1")
        );
    }

    #[test]
    fn context_data_wins_over_intent_parameters() {
        let engine = TemplateEngine::new();
        let template =
            template_with_step(step_with_params(serde_json::json!({"target": "{{intent.x}}"})));
        let intent = intent_with_params(serde_json::json!({"x": "from-intent"}));
        let context: Map<String, Value> = serde_json::json!({"x": "from-context"})
            .as_object()
            .cloned()
            .unwrap();

        let bound = engine.bind_parameters(&template, &intent, &context);
        assert_eq!(
            bound.steps[0].parameters["target"],
            serde_json::json!("from-context")
        );
    }

    #[test]
    fn non_string_parameters_pass_through() {
        let engine = TemplateEngine::new();
        let template = template_with_step(step_with_params(
            serde_json::json!({"retries": 3, "opts": {"a": 1}}),
        ));
        let intent = intent_with_params(serde_json::json!({}));

        let bound = engine.bind_parameters(&template, &intent, &Map::new());
        assert_eq!(bound.steps[0].parameters["retries"], serde_json::json!(3));
        assert_eq!(
            bound.steps[0].parameters["opts"],
            serde_json::json!({"a": 1})
        );
    }

    #[test]
    fn input_from_object_merges_entries() {
        let engine = TemplateEngine::new();
        let mut step = step_with_params(serde_json::json!({"kept": "yes", "path": "old"}));
        step.input_from = Some("build_output".into());
        let template = template_with_step(step);
        let intent = intent_with_params(serde_json::json!({}));
        let context: Map<String, Value> =
            serde_json::json!({"build_output": {"path": "/tmp/out", "status": "ok"}})
                .as_object()
                .cloned()
                .unwrap();

        let bound = engine.bind_parameters(&template, &intent, &context);
        let params = &bound.steps[0].parameters;
        assert_eq!(params["kept"], serde_json::json!("yes"));
        assert_eq!(params["path"], serde_json::json!("/tmp/out"));
        assert_eq!(params["status"], serde_json::json!("ok"));
    }

    #[test]
    fn input_from_scalar_lands_under_input_data() {
        let engine = TemplateEngine::new();
        let mut step = step_with_params(serde_json::json!({}));
        step.input_from = Some("commit".into());
        let template = template_with_step(step);
        let intent = intent_with_params(serde_json::json!({}));
        let context: Map<String, Value> = serde_json::json!({"commit": "abc123"})
            .as_object()
            .cloned()
            .unwrap();

        let bound = engine.bind_parameters(&template, &intent, &context);
        assert_eq!(
            bound.steps[0].parameters["input_data"],
            serde_json::json!("abc123")
        );
    }

    #[test]
    fn resolve_input_sees_fresh_context_data() {
        let engine = TemplateEngine::new();
        let mut step = step_with_params(serde_json::json!({"kept": 1}));
        step.input_from = Some("build_output".into());
        let intent = intent_with_params(serde_json::json!({}));

        // Absent at bind time: no-op.
        let unresolved = engine.resolve_input(&step, &intent, &Map::new());
        assert_eq!(unresolved.parameters.len(), 1);

        // Present once an earlier step produced it.
        let context: Map<String, Value> = serde_json::json!({"build_output": {"path": "/tmp/o"}})
            .as_object()
            .cloned()
            .unwrap();
        let resolved = engine.resolve_input(&step, &intent, &context);
        assert_eq!(resolved.parameters["kept"], serde_json::json!(1));
        assert_eq!(resolved.parameters["path"], serde_json::json!("/tmp/o"));
    }

    #[test]
    fn binding_is_pure() {
        let engine = TemplateEngine::new();
        let template =
            template_with_step(step_with_params(serde_json::json!({"count": "{{intent.x}}"})));
        let intent = intent_with_params(serde_json::json!({"x": "42"}));

        let before = serde_json::to_value(&template).unwrap();
        let _ = engine.bind_parameters(&template, &intent, &Map::new());
        let after = serde_json::to_value(&template).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn coercion_edge_cases() {
        assert_eq!(coerce_scalar("0".into()), serde_json::json!(0));
        assert_eq!(coerce_scalar("007".into()), serde_json::json!(7));
        // Negative numbers are not all-digits; they stay strings.
        assert_eq!(coerce_scalar("-42".into()), serde_json::json!("-42"));
        assert_eq!(coerce_scalar(".5".into()), serde_json::json!(0.5));
        assert_eq!(coerce_scalar("1.2.3".into()), serde_json::json!("1.2.3"));
        assert_eq!(coerce_scalar("TRUE".into()), serde_json::json!(true));
        assert_eq!(coerce_scalar("False".into()), serde_json::json!(false));
        assert_eq!(coerce_scalar(String::new()), serde_json::json!(""));
        // i64 overflow keeps the original text.
        assert_eq!(
            coerce_scalar("99999999999999999999".into()),
            serde_json::json!("99999999999999999999")
        );
    }
}
