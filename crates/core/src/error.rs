//! Error types for the Steward domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Steward operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Safety errors ---
    #[error("Safety error: {0}")]
    Safety(#[from] SafetyError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model backend '{model}' failed: {reason}")]
    Backend { model: String, reason: String },

    #[error("Model catalog is empty")]
    EmptyCatalog,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },
}

#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("Unsupported privilege level: {0}")]
    InvalidPrivilege(String),

    #[error("Audit log write failed: {0}")]
    AuditWrite(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::Backend {
            model: "gpt-4o-mini".into(),
            reason: "connection reset".into(),
        });
        assert!(err.to_string().contains("gpt-4o-mini"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::Timeout {
            tool_name: "run_shell_command".into(),
            timeout_ms: 600,
        });
        assert!(err.to_string().contains("run_shell_command"));
        assert!(err.to_string().contains("600"));
    }

    #[test]
    fn safety_error_displays_correctly() {
        let err = SafetyError::InvalidPrivilege("root".into());
        assert!(err.to_string().contains("root"));
    }
}
