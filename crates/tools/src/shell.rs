//! Shell command tool — allowlisted, timeout-bounded subprocess execution.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use steward_core::{ToolCategory, ToolContext, ToolError, ToolHandler, ToolSpec};

/// Output capture cap per stream.
const CAPTURE_LIMIT: usize = 2048;

/// Executes a command whose first token is in the configured allowlist.
///
/// The subprocess is killed at the `max_time_ms` boundary rather than left
/// to run. Only registered when shell commands are enabled in configuration.
pub struct ShellCommandTool {
    allowlist: Vec<String>,
    max_time_ms: u64,
}

impl ShellCommandTool {
    pub fn new(allowlist: Vec<String>, max_time_ms: u64) -> Self {
        Self { allowlist, max_time_ms }
    }

    pub fn spec(max_tool_time_ms: u64) -> ToolSpec {
        // The executor deadline sits above the subprocess deadline so the
        // handler reports the timeout itself.
        ToolSpec::new("run_shell_command", "Run an allowlisted shell command and capture output.")
            .with_timeout_ms(max_tool_time_ms + 250)
            .with_expected_latency_ms(300)
            .with_consent_required()
            .with_category(ToolCategory::System)
    }

    fn is_allowed(&self, program: &str) -> bool {
        self.allowlist.iter().any(|allowed| allowed == program)
    }
}

#[async_trait]
impl ToolHandler for ShellCommandTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        let command = context.param_str("command").unwrap_or("");
        let argv: Vec<&str> = command.split_whitespace().collect();

        let Some(program) = argv.first() else {
            return Ok(json!({"status": "rejected", "reason": "empty command"}));
        };
        if !self.is_allowed(program) {
            warn!(program, "Shell command not in allowlist");
            return Ok(json!({
                "status": "rejected",
                "reason": format!("command '{program}' not allowlisted"),
            }));
        }

        debug!(command, "Executing shell command");
        let child = Command::new(program)
            .args(&argv[1..])
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(Duration::from_millis(self.max_time_ms), child).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(json!({"status": "error", "error": e.to_string()}));
            }
            Err(_elapsed) => {
                return Ok(json!({
                    "status": "error",
                    "error": format!("timed out after {}ms", self.max_time_ms),
                }));
            }
        };

        let stdout = truncate(&String::from_utf8_lossy(&output.stdout));
        let stderr = truncate(&String::from_utf8_lossy(&output.stderr));
        Ok(json!({
            "status": "ok",
            "command": command,
            "returncode": output.status.code().unwrap_or(-1),
            "stdout": stdout,
            "stderr": stderr,
        }))
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(CAPTURE_LIMIT).collect()
}
