//! Actuator command tool.

use async_trait::async_trait;
use serde_json::{Value, json};

use steward_core::{ToolCategory, ToolContext, ToolError, ToolHandler, ToolSpec};

/// Queues a structured actuator command via the control stack.
///
/// Commands are rejected outright unless the tooling configuration enables
/// control commands — consent and privilege gating happen upstream in the
/// executor, this is the final configuration gate.
pub struct IssueCommandTool {
    allow_control_commands: bool,
}

impl IssueCommandTool {
    pub fn new(allow_control_commands: bool) -> Self {
        Self { allow_control_commands }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new("issue_command", "Queue a structured actuator command via the control stack.")
            .with_expected_latency_ms(120)
            .with_consent_required()
            .with_category(ToolCategory::Control)
    }
}

#[async_trait]
impl ToolHandler for IssueCommandTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        if !self.allow_control_commands {
            return Ok(json!({"status": "rejected", "reason": "control commands disabled"}));
        }
        let command = context.param("command").cloned().unwrap_or(Value::Null);
        Ok(json!({"status": "accepted", "command": command}))
    }
}
