//! Inbox summary tool.
//!
//! Stub contract: returns a placeholder payload until a mail backend is
//! integrated.

use async_trait::async_trait;
use serde_json::{Value, json};

use steward_core::{ToolCategory, ToolContext, ToolError, ToolHandler, ToolSpec};

pub struct SummarizeInboxTool;

impl SummarizeInboxTool {
    pub fn spec() -> ToolSpec {
        ToolSpec::new("summarize_inbox", "Summarize recent messages from the user's inbox.")
            .with_expected_latency_ms(200)
            .with_consent_required()
            .with_category(ToolCategory::Email)
    }
}

#[async_trait]
impl ToolHandler for SummarizeInboxTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        let limit = context.param_u64("limit").unwrap_or(10);
        Ok(json!({
            "status": "ok",
            "summary": "inbox summary unavailable (no mail backend connected)",
            "considered": limit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_placeholder_summary() {
        let context = ToolContext { params: json!({"limit": 5}), state: json!({}), retriever: None };
        let output = SummarizeInboxTool.invoke(&context).await.unwrap();
        assert_eq!(output["status"], "ok");
        assert_eq!(output["considered"], 5);
        assert!(output["summary"].as_str().unwrap().contains("unavailable"));
    }
}
