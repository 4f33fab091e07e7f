//! Tool domain types — specs, handlers, contexts, and results.
//!
//! Tools give the assistant the ability to act: search the knowledge base,
//! inspect runtime state, queue actuator commands, run allowlisted shell
//! commands. Handlers are looked up by name from an explicitly registered
//! table; the executor in `steward-tools` owns dispatch, consent, and
//! safety gating.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::document::Retriever;
use crate::error::ToolError;

/// Coarse tool categorization used by the safety gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    General,
    Control,
    System,
    HomeAutomation,
    Calendar,
    Email,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::General => "general",
            Self::Control => "control",
            Self::System => "system",
            Self::HomeAutomation => "home_automation",
            Self::Calendar => "calendar",
            Self::Email => "email",
        };
        write!(f, "{name}")
    }
}

/// Metadata for a registered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The unique tool name (e.g. "search_docs")
    pub name: String,

    /// What this tool does
    pub description: String,

    /// Per-invocation handler deadline
    pub timeout_ms: u64,

    /// Typical latency, used for scheduling hints
    pub expected_latency_ms: u64,

    /// Whether an explicit consent grant is required before dispatch
    pub requires_consent: bool,

    pub category: ToolCategory,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            timeout_ms: 500,
            expected_latency_ms: 200,
            requires_consent: false,
            category: ToolCategory::General,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_expected_latency_ms(mut self, expected_latency_ms: u64) -> Self {
        self.expected_latency_ms = expected_latency_ms;
        self
    }

    pub fn with_consent_required(mut self) -> Self {
        self.requires_consent = true;
        self
    }

    pub fn with_category(mut self, category: ToolCategory) -> Self {
        self.category = category;
        self
    }
}

/// Context passed into tool handlers for a single invocation.
#[derive(Clone)]
pub struct ToolContext {
    /// Call parameters as a JSON object
    pub params: Value,

    /// Snapshot of the latest runtime state estimation
    pub state: Value,

    /// Knowledge retriever, when one is wired into the executor
    pub retriever: Option<Arc<dyn Retriever>>,
}

impl ToolContext {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }
}

/// The handler interface — one `invoke` per tool.
///
/// Handlers return raw JSON payloads; the executor wraps them into
/// [`ToolResult`] with timing and error conversion. Registration is explicit
/// and happens once at executor construction.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, context: &ToolContext) -> std::result::Result<Value, ToolError>;
}

/// Outcome of a single tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,
    pub success: bool,
    pub output: Value,
    pub latency_ms: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl ToolResult {
    /// A successful invocation.
    pub fn ok(name: impl Into<String>, output: Value, latency_ms: f64) -> Self {
        Self {
            name: name.into(),
            success: true,
            output,
            latency_ms,
            error: None,
            metadata: Map::new(),
        }
    }

    /// A failed invocation with no output.
    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: Value::Null,
            latency_ms: 0.0,
            error: Some(error.into()),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Serialize into the wire shape embedded in pipeline metadata.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "success": self.success,
            "latency_ms": self.latency_ms,
            "error": self.error,
            "output": self.output,
        })
    }
}
