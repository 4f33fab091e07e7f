//! # Steward Core
//!
//! Domain types, traits, and error definitions for the Steward assistant
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod document;
pub mod error;
pub mod intent;
pub mod memory;
pub mod model;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use document::{Document, Retriever, RetrievalResult, ScoreComponents};
pub use error::{Error, MemoryError, ModelError, Result, SafetyError, ToolError};
pub use intent::{HistoryTurn, Intents};
pub use memory::{ConversationStore, MemoryTurn, TurnRole};
pub use model::{CompletionBackend, ModelResponse, ModelSpec, ModelTier, Usage};
pub use tool::{ToolCategory, ToolContext, ToolHandler, ToolResult, ToolSpec};
