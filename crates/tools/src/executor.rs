//! Tool dispatch with consent and safety gating.
//!
//! Dispatch order per invocation: unknown-tool check, consent check,
//! safety check, then the handler under its timeout. Authorization and
//! validation failures are always reported as structured [`ToolResult`]
//! values — nothing is thrown past this boundary.

use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use steward_config::ToolingConfig;
use steward_core::{Retriever, ToolContext, ToolError, ToolHandler, ToolResult, ToolSpec};
use steward_safety::SafetyManager;
use tracing::{debug, warn};

use crate::{
    calendar::CreateCalendarEventTool, email::SummarizeInboxTool, file_search::FileSearchTool,
    home_automation::RunHomeAutomationTool, issue_command::IssueCommandTool,
    runtime_state::GetRuntimeStateTool, search_docs::SearchDocsTool, shell::ShellCommandTool,
};

/// Per-tool consent state. Entry presence = granted; revocation removes the
/// entry and is idempotent. Changes are visible to the next dispatch with
/// no caching lag.
#[derive(Debug, Default)]
pub struct ConsentRegistry {
    granted: Mutex<HashSet<String>>,
}

impl ConsentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, name: &str) {
        self.granted.lock().expect("consent lock poisoned").insert(name.to_string());
    }

    pub fn revoke(&self, name: &str) {
        self.granted.lock().expect("consent lock poisoned").remove(name);
    }

    pub fn is_granted(&self, name: &str) -> bool {
        self.granted.lock().expect("consent lock poisoned").contains(name)
    }
}

/// One row of `list_tools` output.
#[derive(Debug, Clone)]
pub struct ToolListing {
    pub name: String,
    pub description: String,
    pub category: String,
    pub requires_consent: bool,
    pub consent_granted: bool,
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// Executes registered tools with gating, timing, and error handling.
pub struct ToolExecutor {
    tools: HashMap<String, RegisteredTool>,

    /// Registration order, for deterministic listings
    order: Vec<String>,

    consent: ConsentRegistry,
    safety: Option<Arc<SafetyManager>>,
    retriever: Option<Arc<dyn Retriever>>,
    config: ToolingConfig,
}

impl ToolExecutor {
    /// An executor with no tools registered.
    pub fn new(config: ToolingConfig) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            consent: ConsentRegistry::new(),
            safety: None,
            retriever: None,
            config,
        }
    }

    /// Wire in the knowledge retriever used by `search_docs`.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Attach a safety manager; without one, dispatch skips the safety gate
    /// and emits no audit records.
    pub fn with_safety(mut self, safety: Arc<SafetyManager>) -> Self {
        self.safety = Some(safety);
        self
    }

    /// Register the built-in tools permitted by the configuration flags.
    pub fn with_builtin_tools(mut self) -> Self {
        let config = self.config.clone();

        self.register(SearchDocsTool::spec(), Arc::new(SearchDocsTool));
        self.register(GetRuntimeStateTool::spec(), Arc::new(GetRuntimeStateTool));
        self.register(
            IssueCommandTool::spec(),
            Arc::new(IssueCommandTool::new(config.allow_control_commands)),
        );
        self.register(
            FileSearchTool::spec(),
            Arc::new(FileSearchTool::new(config.file_search_roots.clone())),
        );

        if config.allow_shell_commands {
            self.register(
                ShellCommandTool::spec(config.max_tool_time_ms),
                Arc::new(ShellCommandTool::new(
                    config.shell_allowlist.clone(),
                    config.max_tool_time_ms,
                )),
            );
        }
        if config.enable_calendar_tools {
            self.register(CreateCalendarEventTool::spec(), Arc::new(CreateCalendarEventTool));
        }
        if config.enable_email_tools {
            self.register(SummarizeInboxTool::spec(), Arc::new(SummarizeInboxTool));
        }
        if config.enable_home_automation {
            self.register(RunHomeAutomationTool::spec(), Arc::new(RunHomeAutomationTool));
        }

        self
    }

    /// Add or override a tool definition.
    pub fn register(&mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) {
        let name = spec.name.clone();
        if self.tools.insert(name.clone(), RegisteredTool { spec, handler }).is_none() {
            self.order.push(name);
        }
    }

    /// List registered tools with their consent state, in registration order.
    pub fn list_tools(&self) -> Vec<ToolListing> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolListing {
                name: tool.spec.name.clone(),
                description: tool.spec.description.clone(),
                category: tool.spec.category.to_string(),
                requires_consent: tool.spec.requires_consent,
                consent_granted: self.consent.is_granted(&tool.spec.name),
            })
            .collect()
    }

    pub fn grant_consent(&self, name: &str) {
        self.consent.grant(name);
    }

    pub fn revoke_consent(&self, name: &str) {
        self.consent.revoke(name);
    }

    /// Execute a tool by name.
    pub async fn run(&self, name: &str, params: Value, state: Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::failure(name, format!("tool '{name}' not registered"));
        };
        let spec = &tool.spec;

        // Consent gate: no handler runs and nothing is audited.
        if spec.requires_consent && !self.consent.is_granted(name) {
            debug!(tool = name, "Consent not granted");
            return ToolResult::failure(name, "consent required")
                .with_metadata("requires_consent", json!(true));
        }

        // Safety gate.
        if let Some(safety) = &self.safety {
            let status = safety.is_allowed(spec.category);
            if !status.allowed {
                warn!(tool = name, reason = %status.reason, "Tool blocked by safety manager");
                safety.log_tool(
                    name,
                    spec.category,
                    "blocked",
                    BTreeMap::from([("reason".to_string(), status.reason.clone())]),
                );
                let mut metadata = Map::new();
                metadata.insert("requires_consent".into(), json!(spec.requires_consent));
                metadata.insert("category".into(), json!(spec.category.to_string()));
                metadata.insert("blocked".into(), json!(true));
                metadata.insert("reason".into(), json!(status.reason));
                return ToolResult {
                    name: name.to_string(),
                    success: false,
                    output: json!({"status": "blocked", "reason": status.reason}),
                    latency_ms: 0.0,
                    error: Some(status.reason),
                    metadata,
                };
            }
        }

        let context =
            ToolContext { params, state, retriever: self.retriever.clone() };
        let start = Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_millis(spec.timeout_ms),
            tool.handler.invoke(&context),
        )
        .await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let result = match outcome {
            Ok(Ok(output)) => ToolResult::ok(name, output, latency_ms),
            Ok(Err(handler_err)) => {
                let mut result = ToolResult::failure(name, handler_err.to_string());
                result.latency_ms = latency_ms;
                result
            }
            Err(_elapsed) => {
                let timeout_err =
                    ToolError::Timeout { tool_name: name.to_string(), timeout_ms: spec.timeout_ms };
                let mut result = ToolResult::failure(name, timeout_err.to_string());
                result.latency_ms = latency_ms;
                result
            }
        };

        if let Some(safety) = &self.safety {
            let outcome = if result.success { "success" } else { "error" };
            safety.log_tool(
                name,
                spec.category,
                outcome,
                BTreeMap::from([("latency_ms".to_string(), format!("{:.3}", result.latency_ms))]),
            );
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use steward_config::SafetyConfig;
    use steward_core::ToolCategory;

    struct EchoTool;

    #[async_trait]
    impl ToolHandler for EchoTool {
        async fn invoke(&self, context: &ToolContext) -> Result<Value, ToolError> {
            Ok(json!({"echo": context.params.clone()}))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ToolHandler for FailingTool {
        async fn invoke(&self, _context: &ToolContext) -> Result<Value, ToolError> {
            Err(ToolError::ExecutionFailed {
                tool_name: "failing".into(),
                reason: "deliberate".into(),
            })
        }
    }

    struct SlowTool;

    #[async_trait]
    impl ToolHandler for SlowTool {
        async fn invoke(&self, _context: &ToolContext) -> Result<Value, ToolError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(json!({"done": true}))
        }
    }

    fn executor() -> ToolExecutor {
        ToolExecutor::new(ToolingConfig::default())
    }

    fn safety_manager(dir: &tempfile::TempDir) -> Arc<SafetyManager> {
        let config = SafetyConfig {
            default_privilege: "informational".into(),
            audit_log_path: dir.path().join("safety.log").to_string_lossy().into_owned(),
            pause_on_start: false,
        };
        Arc::new(SafetyManager::new(&config).unwrap())
    }

    #[tokio::test]
    async fn unknown_tool_is_a_structured_failure() {
        let exec = executor();
        let result = exec.run("does_not_exist", json!({}), json!({})).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("tool 'does_not_exist' not registered"));
    }

    #[tokio::test]
    async fn consent_gate_blocks_then_allows() {
        let mut exec = executor();
        exec.register(
            ToolSpec::new("guarded", "needs consent").with_consent_required(),
            Arc::new(EchoTool),
        );

        let result = exec.run("guarded", json!({}), json!({})).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("consent required"));
        assert_eq!(result.metadata.get("requires_consent"), Some(&json!(true)));

        exec.grant_consent("guarded");
        let result = exec.run("guarded", json!({"x": 1}), json!({})).await;
        assert!(result.success);
        assert_eq!(result.output["echo"]["x"], 1);

        exec.revoke_consent("guarded");
        let result = exec.run("guarded", json!({}), json!({})).await;
        assert_eq!(result.error.as_deref(), Some("consent required"));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let exec = executor();
        exec.revoke_consent("never_granted");
        exec.revoke_consent("never_granted");
    }

    #[tokio::test]
    async fn safety_gate_blocks_privileged_category() {
        let dir = tempfile::tempdir().unwrap();
        let safety = safety_manager(&dir);
        let mut exec = executor().with_safety(safety.clone());
        exec.register(
            ToolSpec::new("actuate", "privileged").with_category(ToolCategory::Control),
            Arc::new(EchoTool),
        );

        let result = exec.run("actuate", json!({}), json!({})).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("insufficient_privilege"));
        assert_eq!(result.output["status"], "blocked");
        assert_eq!(result.metadata.get("blocked"), Some(&json!(true)));
        assert_eq!(result.metadata.get("category"), Some(&json!("control")));

        // Blocked dispatch is audited.
        let log = std::fs::read_to_string(dir.path().join("safety.log")).unwrap();
        assert!(log.contains("\"outcome\":\"blocked\""));
    }

    #[tokio::test]
    async fn consent_rejection_is_not_audited() {
        let dir = tempfile::tempdir().unwrap();
        let safety = safety_manager(&dir);
        let mut exec = executor().with_safety(safety);
        exec.register(
            ToolSpec::new("guarded", "needs consent").with_consent_required(),
            Arc::new(EchoTool),
        );

        let result = exec.run("guarded", json!({}), json!({})).await;
        assert!(!result.success);

        let log = std::fs::read_to_string(dir.path().join("safety.log")).unwrap();
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn successful_run_is_audited_with_latency() {
        let dir = tempfile::tempdir().unwrap();
        let safety = safety_manager(&dir);
        let mut exec = executor().with_safety(safety);
        exec.register(ToolSpec::new("echo", "echoes"), Arc::new(EchoTool));

        let result = exec.run("echo", json!({}), json!({})).await;
        assert!(result.success);
        assert!(result.latency_ms >= 0.0);

        let log = std::fs::read_to_string(dir.path().join("safety.log")).unwrap();
        assert!(log.contains("\"outcome\":\"success\""));
        assert!(log.contains("latency_ms"));
    }

    #[tokio::test]
    async fn handler_failure_becomes_result_error() {
        let dir = tempfile::tempdir().unwrap();
        let safety = safety_manager(&dir);
        let mut exec = executor().with_safety(safety);
        exec.register(ToolSpec::new("failing", "always fails"), Arc::new(FailingTool));

        let result = exec.run("failing", json!({}), json!({})).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("deliberate"));

        let log = std::fs::read_to_string(dir.path().join("safety.log")).unwrap();
        assert!(log.contains("\"outcome\":\"error\""));
    }

    #[tokio::test]
    async fn slow_handler_is_timed_out() {
        let mut exec = executor();
        exec.register(
            ToolSpec::new("slow", "sleeps past its deadline").with_timeout_ms(20),
            Arc::new(SlowTool),
        );

        let result = exec.run("slow", json!({}), json!({})).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn listing_reflects_flags_and_consent() {
        let mut config = ToolingConfig::default();
        config.enable_calendar_tools = true;
        let exec = ToolExecutor::new(config).with_builtin_tools();

        let listings = exec.list_tools();
        let names: Vec<&str> = listings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "search_docs",
                "get_runtime_state",
                "issue_command",
                "search_files",
                "create_calendar_event"
            ]
        );
        assert!(!names.contains(&"run_shell_command"));

        let issue = listings.iter().find(|l| l.name == "issue_command").unwrap();
        assert!(issue.requires_consent);
        assert!(!issue.consent_granted);
        assert_eq!(issue.category, "control");

        exec.grant_consent("issue_command");
        let listings = exec.list_tools();
        let issue = listings.iter().find(|l| l.name == "issue_command").unwrap();
        assert!(issue.consent_granted);
    }

    #[tokio::test]
    async fn shell_tool_registered_only_when_enabled() {
        let mut config = ToolingConfig::default();
        config.allow_shell_commands = true;
        let exec = ToolExecutor::new(config).with_builtin_tools();
        assert!(exec.list_tools().iter().any(|l| l.name == "run_shell_command"));
    }
}
