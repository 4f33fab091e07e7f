//! Privilege state, pause control, and the tool category gate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::RwLock;

use steward_config::SafetyConfig;
use steward_core::{SafetyError, ToolCategory};
use tracing::warn;

use crate::audit::{AuditLog, AuditRecord};

/// Privilege tier for tool execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeLevel {
    /// Read-only tools only
    Informational,
    /// All tool categories
    Command,
}

impl std::fmt::Display for PrivilegeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Informational => write!(f, "informational"),
            Self::Command => write!(f, "command"),
        }
    }
}

impl FromStr for PrivilegeLevel {
    type Err = SafetyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "informational" => Ok(Self::Informational),
            "command" => Ok(Self::Command),
            other => Err(SafetyError::InvalidPrivilege(other.into())),
        }
    }
}

/// Result of a privilege check. Computed per call, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyStatus {
    pub allowed: bool,
    pub reason: String,
}

impl SafetyStatus {
    pub fn allowed() -> Self {
        Self { allowed: true, reason: String::new() }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: reason.into() }
    }
}

/// Categories requiring `command` privilege.
fn is_privileged(category: ToolCategory) -> bool {
    matches!(category, ToolCategory::Control | ToolCategory::System | ToolCategory::HomeAutomation)
}

struct SafetyState {
    privilege: PrivilegeLevel,
    paused: bool,
}

/// Centralizes privilege state, pause control, and audit logging.
///
/// State is process-wide by design but owned by whoever constructs the
/// manager — the orchestration layer passes it explicitly into the tool
/// executor rather than through globals.
pub struct SafetyManager {
    state: RwLock<SafetyState>,
    audit: AuditLog,
}

impl SafetyManager {
    pub fn new(config: &SafetyConfig) -> Result<Self, SafetyError> {
        let privilege = PrivilegeLevel::from_str(&config.default_privilege)?;
        let audit = AuditLog::open(&config.audit_log_path)?;
        Ok(Self {
            state: RwLock::new(SafetyState { privilege, paused: config.pause_on_start }),
            audit,
        })
    }

    pub fn privilege(&self) -> PrivilegeLevel {
        self.state.read().expect("safety lock poisoned").privilege
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().expect("safety lock poisoned").paused
    }

    /// Update the privilege level. Rejects anything other than the two
    /// supported values.
    pub fn set_privilege(&self, level: &str) -> Result<(), SafetyError> {
        let parsed = PrivilegeLevel::from_str(level)?;
        {
            let mut state = self.state.write().expect("safety lock poisoned");
            state.privilege = parsed;
        }
        self.log_event(
            "privilege_change",
            BTreeMap::from([("level".to_string(), parsed.to_string())]),
        );
        Ok(())
    }

    /// Pause privileged actions.
    pub fn pause(&self) {
        self.state.write().expect("safety lock poisoned").paused = true;
        self.log_event("paused", BTreeMap::new());
    }

    /// Resume privileged actions.
    pub fn resume(&self) {
        self.state.write().expect("safety lock poisoned").paused = false;
        self.log_event("resumed", BTreeMap::new());
    }

    /// Check whether a tool category is allowed under current settings.
    ///
    /// Paused overrides privilege: every category is disallowed while
    /// paused, including non-privileged ones.
    pub fn is_allowed(&self, category: ToolCategory) -> SafetyStatus {
        let state = self.state.read().expect("safety lock poisoned");
        if state.paused {
            return SafetyStatus::denied("safety_paused");
        }
        if state.privilege == PrivilegeLevel::Informational && is_privileged(category) {
            return SafetyStatus::denied("insufficient_privilege");
        }
        SafetyStatus::allowed()
    }

    /// Append a tool execution outcome to the audit log.
    pub fn log_tool(
        &self,
        name: &str,
        category: ToolCategory,
        outcome: &str,
        metadata: BTreeMap<String, String>,
    ) {
        let mut detail = metadata;
        detail.insert("tool".into(), name.into());
        detail.insert("category".into(), category.to_string());
        detail.insert("outcome".into(), outcome.into());
        self.log_event("tool", detail);
    }

    fn log_event(&self, event: &str, detail: BTreeMap<String, String>) {
        let (privilege, paused) = {
            let state = self.state.read().expect("safety lock poisoned");
            (state.privilege, state.paused)
        };
        let record = AuditRecord {
            ts: now_seconds(),
            event: event.into(),
            detail,
            privilege: privilege.to_string(),
            paused,
        };
        if let Err(e) = self.audit.append(&record) {
            warn!("Audit append failed: {e}");
        }
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
