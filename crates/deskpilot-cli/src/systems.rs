//! Built-in demo systems.
//!
//! Real deployments register adapters for browsers, IDEs, window managers,
//! and so on.  The CLI ships two small ones so templates can be exercised
//! out of the box: `terminal` runs shell commands, `echo` reflects its
//! parameters back as output.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use deskpilot_orchestrator::{AdapterError, StepOutcome, SystemAdapter};

/// Default command timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum captured output size in bytes (100 KB).  Stdout and stderr are
/// each independently truncated to this limit.
const MAX_OUTPUT_BYTES: usize = 100 * 1024;

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

/// Runs shell commands.  Supports the `execute` action with a `command`
/// parameter and optional `working_dir` / `timeout_secs`.
pub struct TerminalSystem {
    default_timeout_secs: u64,
}

impl TerminalSystem {
    pub fn new() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    async fn execute_command(&self, parameters: &Map<String, Value>) -> Result<StepOutcome, AdapterError> {
        let command = parameters
            .get("command")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AdapterError::InvalidParams {
                action: "execute".into(),
                reason: "missing required string field `command`".into(),
            })?;

        let working_dir = parameters
            .get("working_dir")
            .and_then(|v| v.as_str())
            .unwrap_or(".");

        let timeout_secs = parameters
            .get("timeout_secs")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.default_timeout_secs);

        debug!(command, working_dir, timeout_secs, "executing shell command");

        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AdapterError::ExecutionFailed {
                action: "execute".into(),
                reason: format!("failed to spawn process: {e}"),
            })?;

        let waited = tokio::time::timeout(
            std::time::Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await;

        let output = match waited {
            Ok(result) => result?,
            Err(_) => {
                return Ok(StepOutcome::failure(format!(
                    "command timed out after {timeout_secs}s"
                )));
            }
        };

        let stdout = truncate(String::from_utf8_lossy(&output.stdout).into_owned());
        let stderr = truncate(String::from_utf8_lossy(&output.stderr).into_owned());
        let exit_code = output.status.code().unwrap_or(-1);

        let data = json!({
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": exit_code,
        });
        let data = data.as_object().cloned().unwrap_or_default();

        if output.status.success() {
            Ok(StepOutcome::success(data))
        } else {
            Ok(StepOutcome {
                success: false,
                output: data,
                error: Some(format!("command exited with code {exit_code}")),
            })
        }
    }
}

impl Default for TerminalSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemAdapter for TerminalSystem {
    async fn execute(
        &self,
        action: &str,
        parameters: &Map<String, Value>,
    ) -> Result<StepOutcome, AdapterError> {
        match action {
            "execute" | "run" => self.execute_command(parameters).await,
            other => Err(AdapterError::UnsupportedAction {
                action: other.to_owned(),
            }),
        }
    }
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_OUTPUT_BYTES {
        let mut cut = MAX_OUTPUT_BYTES;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str("\n... [truncated]");
    }
    text
}

// ---------------------------------------------------------------------------
// Echo
// ---------------------------------------------------------------------------

/// Reflects its parameters back as output.  Useful for template debugging:
/// point a step at `echo` and inspect what the binding engine produced.
pub struct EchoSystem;

#[async_trait]
impl SystemAdapter for EchoSystem {
    async fn execute(
        &self,
        action: &str,
        parameters: &Map<String, Value>,
    ) -> Result<StepOutcome, AdapterError> {
        let mut output = parameters.clone();
        output.insert("action".to_owned(), Value::String(action.to_owned()));
        Ok(StepOutcome::success(output))
    }
}
