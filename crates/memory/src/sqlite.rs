//! SQLite-backed conversation memory store.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info};

use steward_config::MemoryConfig;
use steward_core::{ConversationStore, MemoryError, MemoryTurn, TurnRole};

/// Conversation turns and preferences backed by persistent SQLite storage.
pub struct ConversationMemory {
    pool: SqlitePool,
    history_window: usize,
}

impl ConversationMemory {
    /// Open (or create) the database configured in `config`.
    pub async fn new(config: &MemoryConfig) -> Result<Self, MemoryError> {
        Self::open(&config.db_path, config.history_window).await
    }

    /// Open a store at an explicit path.
    ///
    /// The database and tables are created automatically.
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests,
    /// but note each pool connection gets its own copy — prefer a temp file
    /// when exercising concurrency).
    pub async fn open(path: &str, history_window: usize) -> Result<Self, MemoryError> {
        if !path.contains(":memory:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| MemoryError::Storage(format!("{}: {e}", parent.display())))?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool, history_window };
        store.run_migrations().await?;
        info!("Conversation memory initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_turns (
                session_id  TEXT NOT NULL,
                turn_index  INTEGER NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                metadata    TEXT,
                created_at  REAL NOT NULL,
                PRIMARY KEY (session_id, turn_index)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("conversation_turns table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                session_id  TEXT NOT NULL,
                key         TEXT NOT NULL,
                value       TEXT NOT NULL,
                updated_at  REAL NOT NULL,
                PRIMARY KEY (session_id, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("preferences table: {e}")))?;

        debug!("Conversation memory migrations complete");
        Ok(())
    }

    fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryTurn, MemoryError> {
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| MemoryError::QueryFailed(format!("session_id column: {e}")))?;
        let turn_index: i64 = row
            .try_get("turn_index")
            .map_err(|e| MemoryError::QueryFailed(format!("turn_index column: {e}")))?;
        let role_str: String = row
            .try_get("role")
            .map_err(|e| MemoryError::QueryFailed(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::QueryFailed(format!("content column: {e}")))?;
        let metadata_json: Option<String> = row
            .try_get("metadata")
            .map_err(|e| MemoryError::QueryFailed(format!("metadata column: {e}")))?;
        let created_at: f64 = row
            .try_get("created_at")
            .map_err(|e| MemoryError::QueryFailed(format!("created_at column: {e}")))?;

        let role = TurnRole::from_str(&role_str)?;
        let metadata: HashMap<String, String> = metadata_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Ok(MemoryTurn { session_id, turn_index, role, content, metadata, created_at })
    }
}

#[async_trait]
impl ConversationStore for ConversationMemory {
    async fn append_turn(
        &self,
        session_id: &str,
        role: TurnRole,
        content: &str,
        metadata: HashMap<String, String>,
    ) -> Result<(), MemoryError> {
        let metadata_json = serde_json::to_string(&metadata)
            .map_err(|e| MemoryError::Storage(format!("metadata encode: {e}")))?;

        // Index assignment and insert happen in one statement, so concurrent
        // appends for the same session cannot observe the same MAX.
        sqlx::query(
            r#"
            INSERT INTO conversation_turns
            (session_id, turn_index, role, content, metadata, created_at)
            SELECT ?1, COALESCE(MAX(turn_index), -1) + 1, ?2, ?3, ?4, ?5
            FROM conversation_turns WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .bind(role.to_string())
        .bind(content)
        .bind(metadata_json)
        .bind(now_seconds())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("append turn: {e}")))?;
        Ok(())
    }

    async fn recent_turns(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<MemoryTurn>, MemoryError> {
        let limit = limit.unwrap_or(self.history_window);
        let rows = sqlx::query(
            r#"
            SELECT session_id, turn_index, role, content, metadata, created_at
            FROM conversation_turns
            WHERE session_id = ?1
            ORDER BY turn_index DESC
            LIMIT ?2
            "#,
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(format!("recent turns: {e}")))?;

        let mut turns = rows
            .iter()
            .map(Self::row_to_turn)
            .collect::<Result<Vec<_>, _>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn set_preference(
        &self,
        session_id: &str,
        key: &str,
        value: &str,
    ) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO preferences (session_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(session_id)
        .bind(key)
        .bind(value)
        .bind(now_seconds())
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("set preference: {e}")))?;
        Ok(())
    }

    async fn preferences(&self, session_id: &str) -> Result<HashMap<String, String>, MemoryError> {
        let rows = sqlx::query("SELECT key, value FROM preferences WHERE session_id = ?1")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(format!("preferences: {e}")))?;

        let mut prefs = HashMap::new();
        for row in rows {
            let key: String = row
                .try_get("key")
                .map_err(|e| MemoryError::QueryFailed(format!("key column: {e}")))?;
            let value: String = row
                .try_get("value")
                .map_err(|e| MemoryError::QueryFailed(format!("value column: {e}")))?;
            prefs.insert(key, value);
        }
        Ok(prefs)
    }
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> ConversationMemory {
        let path = dir.path().join("memory.db");
        ConversationMemory::open(path.to_str().unwrap(), 8).await.unwrap()
    }

    #[tokio::test]
    async fn turn_indices_are_contiguous_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let memory = store(&dir).await;

        for i in 0..4 {
            memory
                .append_turn("s1", TurnRole::User, &format!("turn {i}"), HashMap::new())
                .await
                .unwrap();
        }

        let turns = memory.recent_turns("s1", Some(10)).await.unwrap();
        let indices: Vec<i64> = turns.iter().map(|t| t.turn_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn recent_turns_window_is_oldest_to_newest() {
        let dir = tempfile::tempdir().unwrap();
        let memory = store(&dir).await;

        for i in 0..6 {
            memory
                .append_turn("s1", TurnRole::User, &format!("turn {i}"), HashMap::new())
                .await
                .unwrap();
        }

        let turns = memory.recent_turns("s1", Some(3)).await.unwrap();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 3", "turn 4", "turn 5"]);
    }

    #[tokio::test]
    async fn default_limit_uses_history_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        let memory = ConversationMemory::open(path.to_str().unwrap(), 2).await.unwrap();

        for i in 0..5 {
            memory
                .append_turn("s1", TurnRole::User, &format!("turn {i}"), HashMap::new())
                .await
                .unwrap();
        }

        let turns = memory.recent_turns("s1", None).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "turn 4");
    }

    #[tokio::test]
    async fn sessions_have_independent_indices() {
        let dir = tempfile::tempdir().unwrap();
        let memory = store(&dir).await;

        memory.append_turn("a", TurnRole::User, "first in a", HashMap::new()).await.unwrap();
        memory.append_turn("b", TurnRole::User, "first in b", HashMap::new()).await.unwrap();
        memory.append_turn("a", TurnRole::Assistant, "second in a", HashMap::new()).await.unwrap();

        let a_turns = memory.recent_turns("a", None).await.unwrap();
        let b_turns = memory.recent_turns("b", None).await.unwrap();
        assert_eq!(a_turns.len(), 2);
        assert_eq!(a_turns[1].turn_index, 1);
        assert_eq!(b_turns.len(), 1);
        assert_eq!(b_turns[0].turn_index, 0);
    }

    #[tokio::test]
    async fn metadata_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let memory = store(&dir).await;

        let metadata =
            HashMap::from([("source".to_string(), "voice".to_string())]);
        memory.append_turn("s1", TurnRole::User, "hello", metadata).await.unwrap();

        let turns = memory.recent_turns("s1", None).await.unwrap();
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].metadata.get("source").map(String::as_str), Some("voice"));
        assert!(turns[0].created_at > 0.0);
    }

    #[tokio::test]
    async fn preference_upsert_is_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let memory = store(&dir).await;

        memory.set_preference("s1", "volume", "3").await.unwrap();
        memory.set_preference("s1", "volume", "7").await.unwrap();
        memory.set_preference("s1", "voice", "Alex").await.unwrap();

        let prefs = memory.preferences("s1").await.unwrap();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs.get("volume").map(String::as_str), Some("7"));
    }

    #[tokio::test]
    async fn empty_session_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let memory = store(&dir).await;
        assert!(memory.recent_turns("nobody", None).await.unwrap().is_empty());
        assert!(memory.preferences("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_get_distinct_indices() {
        let dir = tempfile::tempdir().unwrap();
        let memory = std::sync::Arc::new(store(&dir).await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let memory = memory.clone();
            handles.push(tokio::spawn(async move {
                memory
                    .append_turn("shared", TurnRole::User, &format!("turn {i}"), HashMap::new())
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let turns = memory.recent_turns("shared", Some(16)).await.unwrap();
        let mut indices: Vec<i64> = turns.iter().map(|t| t.turn_index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..8).collect::<Vec<i64>>());
    }
}
