//! Configuration loading, validation, and management for Steward.
//!
//! Loads configuration from `~/.steward/config.toml` with environment
//! variable overrides. Validates all settings at load time. Unknown fields
//! and malformed shapes are rejected synchronously — configuration never
//! silently defaults past a parse error. A missing file, by contrast, is
//! not an error and yields the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod store;

pub use store::ConfigStore;

/// The root configuration structure.
///
/// Maps directly to `~/.steward/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Model routing policy
    pub models: ModelRoutingConfig,

    /// Knowledge retrieval weights and thresholds
    pub retrieval: RetrievalConfig,

    /// Tool orchestration flags
    pub tooling: ToolingConfig,

    /// Conversation memory settings
    pub memory: MemoryConfig,

    /// Privilege and audit settings
    pub safety: SafetyConfig,

    /// Voice interface settings
    pub voice: VoiceConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            models: ModelRoutingConfig::default(),
            retrieval: RetrievalConfig::default(),
            tooling: ToolingConfig::default(),
            memory: MemoryConfig::default(),
            safety: SafetyConfig::default(),
            voice: VoiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelRoutingConfig {
    pub default_model: String,
    pub fast_model: String,
    pub offline_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for ModelRoutingConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4.1-mini".into(),
            fast_model: "gpt-4o-mini".into(),
            offline_model: "mixtral-8x7b".into(),
            temperature: 0.2,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub lexical_weight: f32,
    pub vector_weight: f32,
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            lexical_weight: 0.35,
            vector_weight: 0.65,
            min_score: 0.12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolingConfig {
    /// Run `search_docs` automatically for every query
    pub auto_search: bool,

    /// Hard ceiling for external tool execution (shell subprocess)
    pub max_tool_time_ms: u64,

    /// Whether `issue_command` accepts commands at all
    pub allow_control_commands: bool,

    /// Whether the shell tool is registered
    pub allow_shell_commands: bool,

    /// First-token allowlist for shell commands
    pub shell_allowlist: Vec<String>,

    /// Directories walked by the file search tool
    pub file_search_roots: Vec<String>,

    pub enable_calendar_tools: bool,
    pub enable_email_tools: bool,
    pub enable_home_automation: bool,
}

impl Default for ToolingConfig {
    fn default() -> Self {
        Self {
            auto_search: true,
            max_tool_time_ms: 600,
            allow_control_commands: false,
            allow_shell_commands: false,
            shell_allowlist: vec!["pwd".into(), "ls".into()],
            file_search_roots: vec!["docs".into()],
            enable_calendar_tools: false,
            enable_email_tools: false,
            enable_home_automation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub db_path: String,
    pub history_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: "var/memory.db".into(),
            history_window: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SafetyConfig {
    /// "informational" or "command"
    pub default_privilege: String,

    pub audit_log_path: String,

    pub pause_on_start: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            default_privilege: "informational".into(),
            audit_log_path: "var/safety.log".into(),
            pause_on_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoiceConfig {
    pub wake_word: String,
    pub use_wake_word: bool,

    /// "auto" probes for a native backend; "scripted" forces the offline one
    pub speech_backend: String,

    pub language: String,
    pub tts_voice: String,
    pub enable_tts: bool,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            wake_word: "jarvis".into(),
            use_wake_word: true,
            speech_backend: "auto".into(),
            language: "en-US".into(),
            tts_voice: "Alex".into(),
            enable_tts: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the default path (~/.steward/config.toml).
    ///
    /// Environment overrides applied after the file:
    /// - `STEWARD_MODEL` — models.default_model
    /// - `STEWARD_AUDIT_LOG` — safety.audit_log_path
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("STEWARD_MODEL") {
            config.models.default_model = model;
        }
        if let Ok(path) = std::env::var("STEWARD_AUDIT_LOG") {
            config.safety.audit_log_path = path;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file yields defaults; a present-but-invalid file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Persist configuration to a file path as pretty TOML.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".steward")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.temperature < 0.0 || self.models.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "models.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retrieval.vector_weight + self.retrieval.lexical_weight <= 0.0 {
            return Err(ConfigError::ValidationError(
                "retrieval weights must sum to a positive value".into(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError("retrieval.top_k must be at least 1".into()));
        }

        if self.memory.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "memory.history_window must be at least 1".into(),
            ));
        }

        if self.tooling.max_tool_time_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tooling.max_tool_time_ms must be positive".into(),
            ));
        }

        match self.safety.default_privilege.as_str() {
            "informational" | "command" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "safety.default_privilege must be 'informational' or 'command', got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
