//! CLI entry point for deskpilot.
//!
//! This binary provides the `deskpilot` command: list loaded task-flow
//! templates, preview the execution plan for an intent, or run an intent
//! against the built-in demo systems.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use deskpilot_intent::Intent;
use deskpilot_orchestrator::{Orchestrator, RunStatus, StepDispatcher};
use deskpilot_templates::TemplateRegistry;

mod systems;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// deskpilot — intent-driven task-flow orchestration.
#[derive(Parser)]
#[command(
    name = "deskpilot",
    version,
    about = "Intent-driven task-flow orchestration across desktop systems"
)]
struct Cli {
    /// Directory containing YAML task-flow templates.
    #[arg(long, default_value = "templates", global = true)]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the loaded templates.
    Templates,

    /// Preview the execution plan for an intent without running it.
    Plan {
        /// The intent type to resolve (e.g. `open_project`).
        #[arg(long)]
        intent: String,

        /// Intent parameters as `key=value` pairs.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Run the task flow for an intent.
    Run {
        /// The intent type to resolve (e.g. `open_project`).
        #[arg(long)]
        intent: String,

        /// Intent parameters as `key=value` pairs.
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

fn parse_key_val(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected `key=value`, got `{raw}`"))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    let mut registry = TemplateRegistry::new();
    let loaded = registry
        .load_dir(&cli.dir)
        .with_context(|| format!("failed to load templates from {}", cli.dir.display()))?;
    info!(loaded, dir = %cli.dir.display(), "templates loaded");

    match cli.command {
        Commands::Templates => cmd_templates(&registry),
        Commands::Plan { intent, params } => cmd_plan(registry, &intent, params),
        Commands::Run { intent, params } => cmd_run(registry, &intent, params).await,
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_templates(registry: &TemplateRegistry) -> Result<()> {
    if registry.is_empty() {
        println!("no templates loaded");
        return Ok(());
    }

    for template in registry.templates() {
        println!(
            "{} — {} (intents: {}, steps: {})",
            template.name,
            template.description,
            template.intent_types.join(", "),
            template.steps.len()
        );
    }
    Ok(())
}

fn cmd_plan(registry: TemplateRegistry, intent_type: &str, params: Vec<(String, String)>) -> Result<()> {
    let orchestrator = Orchestrator::new(registry, StepDispatcher::new());
    let intent = build_intent(intent_type, params);

    let plan = orchestrator
        .plan_for(&intent)
        .with_context(|| format!("no plan for intent `{intent_type}`"))?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn cmd_run(
    registry: TemplateRegistry,
    intent_type: &str,
    params: Vec<(String, String)>,
) -> Result<()> {
    let dispatcher = StepDispatcher::new();
    dispatcher.register("terminal", Arc::new(systems::TerminalSystem::new()));
    dispatcher.register("echo", Arc::new(systems::EchoSystem));

    let orchestrator = Orchestrator::new(registry, dispatcher);
    let intent = build_intent(intent_type, params);
    if !intent.is_actionable() {
        bail!("intent `{intent_type}` is below the confidence threshold");
    }

    let context = orchestrator.orchestrate(&intent, None).await;
    println!("{}", serde_json::to_string_pretty(&context.summary())?);

    if context.status == RunStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn build_intent(intent_type: &str, params: Vec<(String, String)>) -> Intent {
    let mut map = Map::new();
    for (key, value) in params {
        map.insert(key, Value::String(value));
    }
    Intent::direct(intent_type, map)
}
