//! Routes generation requests to the appropriate language model.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use steward_config::ModelRoutingConfig;
use steward_core::{
    CompletionBackend, Intents, ModelError, ModelResponse, ModelSpec, ModelTier, Usage,
};
use tracing::{debug, warn};

use crate::simulated::SimulatedBackend;

/// Model catalog plus routing policy.
///
/// Selection priority: explicit `model` intent if cataloged, then the fast
/// model on `fast_path`, the offline model on `offline_only`, the configured
/// default, and finally the first catalog entry by insertion order.
pub struct ModelGateway {
    catalog: Vec<ModelSpec>,
    index: HashMap<String, usize>,
    backend: Arc<dyn CompletionBackend>,
    config: ModelRoutingConfig,
}

impl ModelGateway {
    /// Create a gateway with the built-in catalog and the simulated backend.
    pub fn new(config: ModelRoutingConfig) -> Self {
        Self::with_backend(config, Arc::new(SimulatedBackend::new()))
    }

    /// Create a gateway with a custom completion backend.
    pub fn with_backend(config: ModelRoutingConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        let mut gateway =
            Self { catalog: Vec::new(), index: HashMap::new(), backend, config };
        for spec in default_catalog(&gateway.config) {
            gateway.register_model(spec);
        }
        gateway
    }

    /// An empty gateway for callers that register their own catalog.
    pub fn empty(config: ModelRoutingConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { catalog: Vec::new(), index: HashMap::new(), backend, config }
    }

    /// Register or override a model specification. Overrides keep the
    /// original insertion slot.
    pub fn register_model(&mut self, spec: ModelSpec) {
        match self.index.get(&spec.name) {
            Some(&slot) => self.catalog[slot] = spec,
            None => {
                self.index.insert(spec.name.clone(), self.catalog.len());
                self.catalog.push(spec);
            }
        }
    }

    /// Return the model spec if available.
    pub fn get_spec(&self, name: &str) -> Option<&ModelSpec> {
        self.index.get(name).map(|&slot| &self.catalog[slot])
    }

    /// List all registered model names in insertion order.
    pub fn model_names(&self) -> Vec<&str> {
        self.catalog.iter().map(|spec| spec.name.as_str()).collect()
    }

    /// Choose a model based on intent metadata and config policy.
    pub fn select_model(&self, intents: &Intents) -> Result<&ModelSpec, ModelError> {
        if let Some(target) = intents.model() {
            if let Some(spec) = self.get_spec(target) {
                return Ok(spec);
            }
        }

        if intents.fast_path() {
            if let Some(spec) = self.get_spec(&self.config.fast_model) {
                return Ok(spec);
            }
        }

        if intents.offline_only() {
            if let Some(spec) = self.get_spec(&self.config.offline_model) {
                return Ok(spec);
            }
        }

        if let Some(spec) = self.get_spec(&self.config.default_model) {
            return Ok(spec);
        }

        self.catalog.first().ok_or(ModelError::EmptyCatalog)
    }

    /// Generate a response for the prompt.
    ///
    /// Measures wall-clock latency and whitespace token estimates around the
    /// backend call — any backend must leave this contract to the gateway.
    /// On backend failure the cataloged fallback is attempted once, then the
    /// error surfaces.
    pub async fn generate(
        &self,
        prompt: &str,
        intents: &Intents,
    ) -> Result<ModelResponse, ModelError> {
        let spec = self.select_model(intents)?.clone();
        debug!(model = %spec.name, "Generating response");

        let start = Instant::now();
        let (text, model_name) = match self.backend.complete(prompt, &spec).await {
            Ok(text) => (text, spec.name.clone()),
            Err(primary_err) => {
                let Some(fallback) = spec.fallback.as_deref().and_then(|f| self.get_spec(f))
                else {
                    return Err(primary_err);
                };
                warn!(
                    model = %spec.name,
                    fallback = %fallback.name,
                    "Backend failed, retrying with fallback: {primary_err}"
                );
                let text = self.backend.complete(prompt, fallback).await?;
                (text, fallback.name.clone())
            }
        };
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let prompt_tokens = estimate_tokens(prompt);
        let completion_tokens = estimate_tokens(&text);
        Ok(ModelResponse {
            text,
            model: model_name,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms,
            finish_reason: "stop".into(),
        })
    }
}

/// Rough token estimation using whitespace split, minimum 1.
fn estimate_tokens(text: &str) -> u32 {
    text.split_whitespace().count().max(1) as u32
}

/// Built-in catalog; swap with a provider registry in production.
fn default_catalog(config: &ModelRoutingConfig) -> Vec<ModelSpec> {
    vec![
        ModelSpec {
            name: "gpt-4.1-mini".into(),
            provider: "openai".into(),
            latency_budget_ms: 1400,
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            tier: ModelTier::Primary,
            fallback: Some("gpt-4o-mini".into()),
        },
        ModelSpec {
            name: "gpt-4o-mini".into(),
            provider: "openai".into(),
            latency_budget_ms: 650,
            max_output_tokens: 512,
            temperature: 0.3,
            tier: ModelTier::Fast,
            fallback: None,
        },
        ModelSpec {
            name: "mixtral-8x7b".into(),
            provider: "vllm".into(),
            latency_budget_ms: 2200,
            max_output_tokens: 768,
            temperature: 0.25,
            tier: ModelTier::Offline,
            fallback: Some("gpt-4o-mini".into()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn intents(value: serde_json::Value) -> Intents {
        Intents::from_value(value)
    }

    #[test]
    fn explicit_model_wins() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let spec = gateway
            .select_model(&intents(json!({"model": "mixtral-8x7b", "fast_path": true})))
            .unwrap();
        assert_eq!(spec.name, "mixtral-8x7b");
    }

    #[test]
    fn unknown_explicit_model_falls_through() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let spec = gateway.select_model(&intents(json!({"model": "no-such-model"}))).unwrap();
        assert_eq!(spec.name, "gpt-4.1-mini");
    }

    #[test]
    fn fast_path_selects_fast_model() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let spec = gateway.select_model(&intents(json!({"fast_path": true}))).unwrap();
        assert_eq!(spec.name, "gpt-4o-mini");
        assert_eq!(spec.tier, ModelTier::Fast);
    }

    #[test]
    fn offline_only_selects_offline_model() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let spec = gateway.select_model(&intents(json!({"offline_only": true}))).unwrap();
        assert_eq!(spec.name, "mixtral-8x7b");
    }

    #[test]
    fn default_model_selected_without_hints() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let spec = gateway.select_model(&intents(json!({}))).unwrap();
        assert_eq!(spec.name, "gpt-4.1-mini");
    }

    #[test]
    fn first_by_insertion_when_default_missing() {
        let mut config = ModelRoutingConfig::default();
        config.default_model = "not-in-catalog".into();
        let mut gateway =
            ModelGateway::empty(config, Arc::new(SimulatedBackend::new()));
        gateway.register_model(ModelSpec {
            name: "local-tiny".into(),
            provider: "vllm".into(),
            latency_budget_ms: 300,
            max_output_tokens: 128,
            temperature: 0.1,
            tier: ModelTier::Offline,
            fallback: None,
        });
        let spec = gateway.select_model(&intents(json!({}))).unwrap();
        assert_eq!(spec.name, "local-tiny");
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let mut config = ModelRoutingConfig::default();
        config.default_model = "absent".into();
        let gateway = ModelGateway::empty(config, Arc::new(SimulatedBackend::new()));
        assert!(matches!(
            gateway.select_model(&intents(json!({}))),
            Err(ModelError::EmptyCatalog)
        ));
    }

    #[test]
    fn register_overrides_keep_insertion_slot() {
        let mut gateway = ModelGateway::new(ModelRoutingConfig::default());
        gateway.register_model(ModelSpec {
            name: "gpt-4.1-mini".into(),
            provider: "openai".into(),
            latency_budget_ms: 999,
            max_output_tokens: 64,
            temperature: 0.0,
            tier: ModelTier::Primary,
            fallback: None,
        });
        assert_eq!(gateway.model_names()[0], "gpt-4.1-mini");
        assert_eq!(gateway.get_spec("gpt-4.1-mini").unwrap().latency_budget_ms, 999);
    }

    #[tokio::test]
    async fn generate_populates_usage_and_latency() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let response =
            gateway.generate("report battery status please", &intents(json!({}))).await.unwrap();
        assert_eq!(response.model, "gpt-4.1-mini");
        assert_eq!(response.usage.prompt_tokens, 4);
        assert!(response.usage.completion_tokens >= 1);
        assert_eq!(
            response.usage.total_tokens,
            response.usage.prompt_tokens + response.usage.completion_tokens
        );
        assert!(response.latency_ms >= 0.0);
        assert_eq!(response.finish_reason, "stop");
    }

    #[tokio::test]
    async fn generate_empty_prompt_counts_one_token() {
        let gateway = ModelGateway::new(ModelRoutingConfig::default());
        let response = gateway.generate("", &intents(json!({}))).await.unwrap();
        assert_eq!(response.usage.prompt_tokens, 1);
    }

    /// Backend that fails for one model name and succeeds for others.
    struct FlakyBackend {
        failing_model: String,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionBackend for FlakyBackend {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, _prompt: &str, spec: &ModelSpec) -> Result<String, ModelError> {
            self.calls.lock().unwrap().push(spec.name.clone());
            if spec.name == self.failing_model {
                return Err(ModelError::Backend {
                    model: spec.name.clone(),
                    reason: "simulated outage".into(),
                });
            }
            Ok(format!("text from {}", spec.name))
        }
    }

    #[tokio::test]
    async fn fallback_attempted_once_on_backend_failure() {
        let backend = Arc::new(FlakyBackend {
            failing_model: "gpt-4.1-mini".into(),
            calls: Mutex::new(Vec::new()),
        });
        let gateway =
            ModelGateway::with_backend(ModelRoutingConfig::default(), backend.clone());

        let response = gateway.generate("hello there", &intents(json!({}))).await.unwrap();
        assert_eq!(response.model, "gpt-4o-mini");
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["gpt-4.1-mini".to_string(), "gpt-4o-mini".to_string()]
        );
    }

    #[tokio::test]
    async fn failure_without_fallback_surfaces() {
        let backend = Arc::new(FlakyBackend {
            failing_model: "gpt-4o-mini".into(),
            calls: Mutex::new(Vec::new()),
        });
        let gateway = ModelGateway::with_backend(ModelRoutingConfig::default(), backend);

        // gpt-4o-mini has no fallback in the built-in catalog.
        let result = gateway.generate("hi", &intents(json!({"fast_path": true}))).await;
        assert!(matches!(result, Err(ModelError::Backend { .. })));
    }
}
