//! Home automation tool.
//!
//! Stub contract: queues a routine for a deferred home-automation backend.

use async_trait::async_trait;
use serde_json::{Value, json};

use steward_core::{ToolCategory, ToolContext, ToolError, ToolHandler, ToolSpec};

pub struct RunHomeAutomationTool;

impl RunHomeAutomationTool {
    pub fn spec() -> ToolSpec {
        ToolSpec::new("run_home_automation", "Trigger a named home automation routine.")
            .with_expected_latency_ms(180)
            .with_consent_required()
            .with_category(ToolCategory::HomeAutomation)
    }
}

#[async_trait]
impl ToolHandler for RunHomeAutomationTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        let Some(routine) = context.param_str("routine") else {
            return Err(ToolError::InvalidArguments("missing 'routine' parameter".into()));
        };
        Ok(json!({"status": "queued", "routine": routine}))
    }
}
