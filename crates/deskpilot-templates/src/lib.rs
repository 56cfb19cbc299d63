//! Task-flow templates for deskpilot.
//!
//! This crate provides:
//!
//! - **Workflow model**: [`TaskFlowTemplate`] and [`TemplateStep`] — the
//!   immutable definition of a multi-step workflow serving one or more
//!   intent types.
//! - **Binding engine**: [`TemplateEngine`] — pure parameter binding
//!   (placeholder substitution and scalar coercion) plus step-condition
//!   evaluation.
//! - **Registry/loader**: [`TemplateRegistry`] — YAML-backed template
//!   registry with uniqueness enforcement for deterministic intent
//!   resolution.

pub mod engine;
pub mod error;
pub mod loader;
pub mod models;

pub use engine::TemplateEngine;
pub use error::{Result, TemplateError};
pub use loader::TemplateRegistry;
pub use models::{StepCondition, TaskFlowTemplate, TemplateStep};
