//! Pipeline orchestration: retrieval, tool usage, prompt assembly,
//! generation, and persistence.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;

use steward_config::RuntimeConfig;
use steward_core::{
    ConversationStore, Document, Error, HistoryTurn, Intents, Retriever, ToolResult, TurnRole,
    Usage,
};
use steward_models::ModelGateway;
use steward_retrieval::{HashEmbedder, InMemoryVectorStore, KnowledgeRetriever};
use steward_safety::SafetyManager;
use steward_telemetry::LatencyProbe;
use steward_tools::ToolExecutor;
use tracing::{debug, warn};

/// Structured output aggregated by the pipeline before serialization.
#[derive(Debug, Clone)]
pub struct AssistantOutput {
    pub response: String,
    pub model: String,
    pub usage: Usage,
    pub tool_results: Vec<ToolResult>,
    pub latency_breakdown_ms: HashMap<String, f64>,
}

impl AssistantOutput {
    fn to_payload(&self) -> Value {
        json!({
            "type": "assistant",
            "response": self.response,
            "metadata": {
                "model": self.model,
                "usage": self.usage,
                "latency_ms": self.latency_breakdown_ms,
                "tool_results": self.tool_results.iter().map(ToolResult::to_value).collect::<Vec<_>>(),
            },
        })
    }
}

/// Coordinates retrieval-augmented generation for the assistant.
pub struct AssistantPipeline {
    config: RuntimeConfig,
    gateway: ModelGateway,
    retriever: Arc<dyn Retriever>,
    tools: ToolExecutor,
    safety: Arc<SafetyManager>,
    telemetry: LatencyProbe,
    memory: Option<Arc<dyn ConversationStore>>,
}

impl AssistantPipeline {
    /// Build a pipeline with the default collaborators: hash-embedder
    /// retriever, simulated gateway, built-in tools, no memory store.
    pub fn new(config: RuntimeConfig) -> Result<Self, Error> {
        let retriever: Arc<dyn Retriever> = Arc::new(KnowledgeRetriever::new(
            InMemoryVectorStore::new(HashEmbedder::default()),
            config.retrieval.clone(),
        ));
        Self::with_retriever(config, retriever)
    }

    /// Build a pipeline around an existing retriever.
    pub fn with_retriever(
        config: RuntimeConfig,
        retriever: Arc<dyn Retriever>,
    ) -> Result<Self, Error> {
        let safety = Arc::new(SafetyManager::new(&config.safety)?);
        let tools = ToolExecutor::new(config.tooling.clone())
            .with_retriever(retriever.clone())
            .with_safety(safety.clone())
            .with_builtin_tools();
        let gateway = ModelGateway::new(config.models.clone());
        Ok(Self {
            config,
            gateway,
            retriever,
            tools,
            safety,
            telemetry: LatencyProbe::new(),
            memory: None,
        })
    }

    /// Attach a conversation store for history recall and persistence.
    pub fn with_memory(mut self, memory: Arc<dyn ConversationStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Replace the model gateway (custom catalog or backend).
    pub fn with_gateway(mut self, gateway: ModelGateway) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn tools(&self) -> &ToolExecutor {
        &self.tools
    }

    pub fn safety(&self) -> &Arc<SafetyManager> {
        &self.safety
    }

    /// Add domain documents to the retrieval store.
    pub fn ingest_documents(&self, documents: Vec<Document>) {
        self.retriever.ingest(documents);
    }

    /// Process an intent payload and produce an assistant payload.
    pub async fn handle(&self, intents: &Intents, state: &Value) -> Result<Value, Error> {
        let mut tool_results: Vec<ToolResult> = Vec::new();
        self.telemetry.flush();

        let session_id = intents.session_id().to_string();
        let query = intents.query().map(str::to_string);

        // Auto-search goes through the full consent/safety gate even though
        // search_docs itself requires no consent.
        let mut context_docs: Vec<Value> = Vec::new();
        if self.config.tooling.auto_search {
            if let Some(query) = &query {
                let timer = self.telemetry.time("retrieval");
                let result = self
                    .tools
                    .run(
                        "search_docs",
                        json!({"query": query, "limit": self.config.retrieval.top_k}),
                        state.clone(),
                    )
                    .await;
                drop(timer);
                if result.success {
                    if let Some(matches) = result.output.get("matches").and_then(Value::as_array) {
                        context_docs.extend(matches.iter().cloned());
                    }
                }
                tool_results.push(result);
            }
        }

        let history = match intents.history() {
            Some(history) => history,
            None => self.recall_history(&session_id).await,
        };

        let prompt = {
            let _timer = self.telemetry.time("prompt_build");
            self.build_prompt(query.as_deref(), intents, &context_docs, state, &history)
        };

        let response = {
            let _timer = self.telemetry.time("generation");
            self.gateway.generate(&prompt, intents).await?
        };

        let mut latency_summary: HashMap<String, f64> = HashMap::new();
        for measurement in self.telemetry.flush() {
            *latency_summary.entry(measurement.stage).or_insert(0.0) += measurement.duration_ms;
        }

        let output = AssistantOutput {
            response: response.text,
            model: response.model,
            usage: response.usage,
            tool_results,
            latency_breakdown_ms: latency_summary,
        };

        self.persist_exchange(&session_id, query.as_deref(), intents, &output).await;

        Ok(output.to_payload())
    }

    async fn recall_history(&self, session_id: &str) -> Vec<HistoryTurn> {
        let Some(memory) = &self.memory else {
            return Vec::new();
        };
        match memory.recent_turns(session_id, Some(self.config.memory.history_window)).await {
            Ok(turns) => turns
                .into_iter()
                .map(|turn| HistoryTurn { role: turn.role.to_string(), content: turn.content })
                .collect(),
            Err(e) => {
                warn!("History recall failed: {e}");
                Vec::new()
            }
        }
    }

    async fn persist_exchange(
        &self,
        session_id: &str,
        query: Option<&str>,
        intents: &Intents,
        output: &AssistantOutput,
    ) {
        let Some(memory) = &self.memory else {
            return;
        };

        if let Some(query) = query {
            let mut metadata = HashMap::new();
            metadata
                .insert("source".to_string(), intents.source().unwrap_or("text").to_string());
            if let Some(confidence) = intents.confidence() {
                metadata.insert("confidence".to_string(), confidence);
            }
            if let Err(e) = memory.append_turn(session_id, TurnRole::User, query, metadata).await {
                warn!("Failed to persist user turn: {e}");
            }
        }

        if !output.response.is_empty() {
            let metadata = HashMap::from([("model".to_string(), output.model.clone())]);
            if let Err(e) = memory
                .append_turn(session_id, TurnRole::Assistant, &output.response, metadata)
                .await
            {
                warn!("Failed to persist assistant turn: {e}");
            }
        }

        for (key, value) in intents.preferences() {
            if let Err(e) = memory.set_preference(session_id, &key, &value).await {
                warn!("Failed to persist preference '{key}': {e}");
            }
        }
    }

    /// Construct the model prompt with retrieved context.
    fn build_prompt(
        &self,
        query: Option<&str>,
        intents: &Intents,
        context_docs: &[Value],
        state: &Value,
        history: &[HistoryTurn],
    ) -> String {
        let instructions =
            intents.instructions().unwrap_or("You are a helpful AI assistant.");
        let mut sections: Vec<String> = vec![instructions.to_string()];

        if !history.is_empty() {
            let mut lines = vec!["Conversation history:".to_string()];
            let window = history.len().saturating_sub(5);
            for turn in &history[window..] {
                lines.push(format!("{}: {}", turn.role, turn.content));
            }
            sections.push(lines.join("\n"));
        }

        if !context_docs.is_empty() {
            let mut lines = vec!["Context documents:".to_string()];
            for (idx, doc) in context_docs.iter().enumerate() {
                let doc_id = doc.get("doc_id").and_then(Value::as_str).unwrap_or("?");
                let fallback_title = format!("Doc {}", idx + 1);
                let title = doc
                    .get("metadata")
                    .and_then(|m| m.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or(&fallback_title);
                let content = doc.get("content").and_then(Value::as_str).unwrap_or("");
                lines.push(format!("- [{doc_id}] {title}: {content}"));
            }
            sections.push(lines.join("\n"));
        }

        if state.as_object().is_some_and(|map| !map.is_empty()) {
            sections.push(format!("State summary: {state}"));
        }

        let user_query = query.or_else(|| intents.goal()).unwrap_or("Provide an update.");
        sections.push(format!("User request: {user_query}"));

        let prompt = sections.join("\n\n");
        debug!(chars = prompt.len(), "Prompt assembled");
        prompt
    }
}
