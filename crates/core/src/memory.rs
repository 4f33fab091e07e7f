//! Conversation memory trait — durable turn and preference storage.
//!
//! Turn indices within a session are contiguous starting at 0 and assigned
//! as `max(existing) + 1`, so insertion order is recoverable without relying
//! on wall-clock timestamps. Timestamps are still recorded for audit
//! purposes. Preference writes are last-write-wins upserts keyed by
//! `(session_id, key)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::MemoryError;

/// Who produced a stored conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for TurnRole {
    type Err = MemoryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(MemoryError::QueryFailed(format!("unknown turn role '{other}'"))),
        }
    }
}

/// A stored conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryTurn {
    pub session_id: String,

    /// Monotonic, zero-based per session — the primary ordering key
    pub turn_index: i64,

    pub role: TurnRole,

    pub content: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Float seconds since the Unix epoch
    pub created_at: f64,
}

/// The conversation store trait.
///
/// Implementations: SQLite (`steward-memory`). The pipeline treats the
/// store as optional — a missing store means history comes only from the
/// intent payload.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append a turn; the store assigns the next contiguous index.
    async fn append_turn(
        &self,
        session_id: &str,
        role: TurnRole,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> std::result::Result<(), MemoryError>;

    /// The most recent `limit` turns, returned oldest-to-newest.
    /// `None` uses the configured history window.
    async fn recent_turns(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> std::result::Result<Vec<MemoryTurn>, MemoryError>;

    /// Upsert a preference value for `(session_id, key)`.
    async fn set_preference(
        &self,
        session_id: &str,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), MemoryError>;

    /// All stored preferences for a session.
    async fn preferences(
        &self,
        session_id: &str,
    ) -> std::result::Result<HashMap<String, String>, MemoryError>;
}
