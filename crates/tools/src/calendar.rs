//! Calendar event tool.
//!
//! Stub contract: queues a placeholder payload representing deferred
//! integration with an external calendar backend. Replace the handler with
//! a real backend without changing the surrounding gating logic.

use async_trait::async_trait;
use serde_json::{Value, json};

use steward_core::{ToolCategory, ToolContext, ToolError, ToolHandler, ToolSpec};

pub struct CreateCalendarEventTool;

impl CreateCalendarEventTool {
    pub fn spec() -> ToolSpec {
        ToolSpec::new("create_calendar_event", "Queue a calendar event with the user's calendar.")
            .with_expected_latency_ms(150)
            .with_consent_required()
            .with_category(ToolCategory::Calendar)
    }
}

#[async_trait]
impl ToolHandler for CreateCalendarEventTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        let title = context.param_str("title").unwrap_or("(untitled)");
        let when = context.param("when").cloned().unwrap_or(Value::Null);
        Ok(json!({
            "status": "queued",
            "event": {"title": title, "when": when},
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queues_event_payload() {
        let context = ToolContext {
            params: json!({"title": "Standup", "when": "2026-08-10T09:00:00Z"}),
            state: json!({}),
            retriever: None,
        };
        let output = CreateCalendarEventTool.invoke(&context).await.unwrap();
        assert_eq!(output["status"], "queued");
        assert_eq!(output["event"]["title"], "Standup");
    }

    #[tokio::test]
    async fn untitled_event_defaults() {
        let context = ToolContext { params: json!({}), state: json!({}), retriever: None };
        let output = CreateCalendarEventTool.invoke(&context).await.unwrap();
        assert_eq!(output["event"]["title"], "(untitled)");
    }
}
