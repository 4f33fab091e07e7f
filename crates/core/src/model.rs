//! Model routing domain types and the completion backend trait.
//!
//! A `CompletionBackend` knows how to turn a prompt into text for a given
//! model spec. The gateway in `steward-models` owns the catalog, routing
//! policy, and the latency/usage measurement contract — any backend (the
//! built-in simulator or a real network client) must leave those to the
//! gateway and only produce text or fail.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Routing tier for a model option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Primary,
    Fast,
    Offline,
}

/// A single model option in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Catalog key (e.g. "gpt-4o-mini")
    pub name: String,

    /// Backend provider identifier (e.g. "openai", "vllm")
    pub provider: String,

    /// Soft latency budget for a generation call
    pub latency_budget_ms: u64,

    pub max_output_tokens: u32,

    pub temperature: f32,

    #[serde(default = "default_tier")]
    pub tier: ModelTier,

    /// Next-choice model attempted once if this one's backend fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

fn default_tier() -> ModelTier {
    ModelTier::Primary
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Normalized model response for downstream consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,

    /// Which catalog entry produced the text
    pub model: String,

    pub usage: Usage,

    pub latency_ms: f64,

    #[serde(default = "default_finish_reason")]
    pub finish_reason: String,
}

fn default_finish_reason() -> String {
    "stop".into()
}

/// The completion backend trait.
///
/// Implementations: the deterministic simulator in `steward-models`, or a
/// real text-completion client. Token accounting and latency measurement
/// happen in the gateway regardless of how the text is produced.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// A human-readable backend name (e.g. "simulated").
    fn name(&self) -> &str;

    /// Produce completion text for the prompt under the given spec.
    async fn complete(
        &self,
        prompt: &str,
        spec: &ModelSpec,
    ) -> std::result::Result<String, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_serde_round_trip() {
        let spec = ModelSpec {
            name: "mixtral-8x7b".into(),
            provider: "vllm".into(),
            latency_budget_ms: 2200,
            max_output_tokens: 768,
            temperature: 0.25,
            tier: ModelTier::Offline,
            fallback: Some("gpt-4o-mini".into()),
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"offline\""));
        let parsed: ModelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, spec.name);
        assert_eq!(parsed.tier, ModelTier::Offline);
        assert_eq!(parsed.fallback.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn tier_defaults_to_primary() {
        let json = r#"{
            "name": "m",
            "provider": "p",
            "latency_budget_ms": 100,
            "max_output_tokens": 64,
            "temperature": 0.2
        }"#;
        let parsed: ModelSpec = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tier, ModelTier::Primary);
        assert!(parsed.fallback.is_none());
    }
}
