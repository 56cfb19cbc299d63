//! Template registry and YAML loader.
//!
//! Templates are deserialized from YAML files and registered once at
//! startup.  Registration enforces uniqueness of both template names and
//! intent types, so resolving a template for an intent is a deterministic
//! index lookup rather than a registration-order-dependent scan.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, TemplateError};
use crate::models::TaskFlowTemplate;

/// Registry of immutable task-flow templates, keyed by name and indexed by
/// intent type.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, TaskFlowTemplate>,
    /// intent type → template name.
    by_intent: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template.
    ///
    /// Fails if a template with the same name already exists, or if any of
    /// its intent types is already claimed by another template.
    pub fn register(&mut self, template: TaskFlowTemplate) -> Result<()> {
        if self.templates.contains_key(&template.name) {
            return Err(TemplateError::DuplicateName {
                name: template.name,
            });
        }
        for intent_type in &template.intent_types {
            if let Some(existing) = self.by_intent.get(intent_type) {
                return Err(TemplateError::ConflictingIntentType {
                    intent_type: intent_type.clone(),
                    existing: existing.clone(),
                });
            }
        }

        info!(
            template = %template.name,
            intent_types = ?template.intent_types,
            steps = template.steps.len(),
            "template registered"
        );

        for intent_type in &template.intent_types {
            self.by_intent
                .insert(intent_type.clone(), template.name.clone());
        }
        self.templates.insert(template.name.clone(), template);
        Ok(())
    }

    /// Load a single YAML template file and register it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let template: TaskFlowTemplate =
            serde_yaml::from_str(&raw).map_err(|source| TemplateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        self.register(template)
    }

    /// Load every `*.yaml`/`*.yml` file in a directory.
    ///
    /// Files that fail to load are logged and skipped; loading continues.
    /// Returns the number of templates registered.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if !is_yaml {
                continue;
            }
            match self.load_file(&path) {
                Ok(()) => loaded += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "skipping template file"),
            }
        }

        info!(dir = %dir.display(), loaded, "template directory loaded");
        Ok(loaded)
    }

    /// Look up a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TaskFlowTemplate> {
        self.templates.get(name)
    }

    /// Resolve the template serving an intent type.
    #[must_use]
    pub fn find_by_intent(&self, intent_type: &str) -> Option<&TaskFlowTemplate> {
        let name = self.by_intent.get(intent_type)?;
        self.templates.get(name)
    }

    /// All registered templates.
    pub fn templates(&self) -> impl Iterator<Item = &TaskFlowTemplate> {
        self.templates.values()
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the registry holds no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateStep;
    use serde_json::Map;

    fn template(name: &str, intent_types: &[&str]) -> TaskFlowTemplate {
        TaskFlowTemplate {
            name: name.into(),
            description: String::new(),
            intent_types: intent_types.iter().map(|s| (*s).to_owned()).collect(),
            steps: vec![TemplateStep {
                system: "terminal".into(),
                action: "execute".into(),
                parameters: Map::new(),
                condition: Default::default(),
                input_from: None,
                output_to: None,
                continue_on_error: false,
            }],
            parameters: Map::new(),
        }
    }

    #[test]
    fn resolves_by_intent_type() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("a", &["open_project"])).unwrap();
        registry.register(template("b", &["run_tests"])).unwrap();

        assert_eq!(registry.find_by_intent("run_tests").unwrap().name, "b");
        assert!(registry.find_by_intent("deploy").is_none());
    }

    #[test]
    fn rejects_duplicate_name() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("a", &["x"])).unwrap();

        let err = registry.register(template("a", &["y"])).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateName { .. }));
    }

    #[test]
    fn rejects_conflicting_intent_type() {
        let mut registry = TemplateRegistry::new();
        registry.register(template("a", &["open_project"])).unwrap();

        let err = registry
            .register(template("b", &["open_project", "other"]))
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::ConflictingIntentType { ref intent_type, ref existing }
                if intent_type == "open_project" && existing == "a"
        ));
        // The failed registration must not have claimed its other types.
        assert!(registry.find_by_intent("other").is_none());
    }

    #[test]
    fn loads_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("open_project.yaml");
        std::fs::write(
            &path,
            r#"
name: open-project
description: Open a project in the IDE
intent_types: [open_project]
steps:
  - system: ide
    action: open
    parameters:
      path: "{{intent.path}}"
  - system: terminal
    action: execute
    parameters:
      command: "git status"
    condition: if_success
    output_to: git_status
"#,
        )
        .unwrap();

        let mut registry = TemplateRegistry::new();
        registry.load_file(&path).unwrap();

        let template = registry.find_by_intent("open_project").unwrap();
        assert_eq!(template.name, "open-project");
        assert_eq!(template.steps.len(), 2);
        assert_eq!(template.steps[1].output_to.as_deref(), Some("git_status"));
    }

    #[test]
    fn load_dir_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("good.yaml"),
            "name: good\nintent_types: [good]\nsteps: []\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "steps: {not: [valid\n").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "not yaml").unwrap();

        let mut registry = TemplateRegistry::new();
        let loaded = registry.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, 1);
        assert!(registry.get("good").is_some());
    }
}
