//! Runtime state snapshot tool.

use async_trait::async_trait;
use serde_json::{Value, json};

use steward_core::{ToolContext, ToolError, ToolHandler, ToolSpec};

/// Returns the caller-supplied state snapshot verbatim.
pub struct GetRuntimeStateTool;

impl GetRuntimeStateTool {
    pub fn spec() -> ToolSpec {
        ToolSpec::new("get_runtime_state", "Return a snapshot of the latest state estimation.")
            .with_expected_latency_ms(40)
    }
}

#[async_trait]
impl ToolHandler for GetRuntimeStateTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        Ok(json!({"state": context.state}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_state_verbatim() {
        let context = ToolContext {
            params: json!({}),
            state: json!({"pose": {"x": 1.5, "y": 0.0}, "battery": 0.82}),
            retriever: None,
        };
        let output = GetRuntimeStateTool.invoke(&context).await.unwrap();
        assert_eq!(output["state"], context.state);
    }
}
