//! Template subsystem error types.

use std::path::PathBuf;

/// Unified error type for template loading and registration.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A template file could not be read.
    #[error("failed to read template file `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template file is not valid YAML or does not match the schema.
    #[error("failed to parse template file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A template with the same name is already registered.
    #[error("template `{name}` is already registered")]
    DuplicateName { name: String },

    /// An intent type is already claimed by another template.  Uniqueness is
    /// enforced at registration so intent resolution stays deterministic.
    #[error("intent type `{intent_type}` is already served by template `{existing}`")]
    ConflictingIntentType {
        intent_type: String,
        existing: String,
    },
}

/// Convenience alias used throughout the templates crate.
pub type Result<T> = std::result::Result<T, TemplateError>;
