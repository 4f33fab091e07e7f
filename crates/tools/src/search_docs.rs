//! Knowledge base search tool.

use async_trait::async_trait;
use serde_json::{Value, json};

use steward_core::{ToolContext, ToolError, ToolHandler, ToolSpec};

/// Delegates to the wired retriever and serializes the matches.
pub struct SearchDocsTool;

impl SearchDocsTool {
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "search_docs",
            "Retrieve knowledge base passages relevant to a textual query.",
        )
        .with_expected_latency_ms(180)
    }
}

#[async_trait]
impl ToolHandler for SearchDocsTool {
    async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
        let limit = context.param_u64("limit").unwrap_or(4) as usize;
        let Some(query) = context.param_str("query") else {
            return Ok(json!({"matches": [], "reason": "empty query"}));
        };
        let Some(retriever) = &context.retriever else {
            return Ok(json!({"matches": [], "reason": "retriever unavailable"}));
        };

        let matches: Vec<Value> = retriever
            .retrieve(query, Some(limit))
            .iter()
            .map(|result| result.to_value())
            .collect();
        Ok(json!({"matches": matches}))
    }
}
