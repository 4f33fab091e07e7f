//! Typed reader over an intent payload.
//!
//! Intents arrive as loose JSON objects from the voice/protocol adapters.
//! `Intents` wraps the raw map once at the pipeline boundary so the
//! recognized keys are read in one place instead of string lookups being
//! scattered through the orchestration code.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// A conversation turn supplied inline in the intent payload.
#[derive(Debug, Clone)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// Read-only view over an intent payload map.
///
/// Recognized keys: `query`/`text`/`message` (first non-empty wins),
/// `history`, `instructions`, `session_id`, `preferences`, `fast_path`,
/// `offline_only`, `model`, `source`, `confidence`, `goal`, `skill`.
#[derive(Debug, Clone, Default)]
pub struct Intents(Map<String, Value>);

impl Intents {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value; anything other than an object reads as empty.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }

    /// The raw underlying map.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    fn bool_field(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// The user utterance: first non-empty of `query`, `text`, `message`.
    pub fn query(&self) -> Option<&str> {
        self.str_field("query")
            .or_else(|| self.str_field("text"))
            .or_else(|| self.str_field("message"))
    }

    pub fn session_id(&self) -> &str {
        self.str_field("session_id").unwrap_or("default")
    }

    pub fn instructions(&self) -> Option<&str> {
        self.str_field("instructions")
    }

    pub fn goal(&self) -> Option<&str> {
        self.str_field("goal")
    }

    pub fn source(&self) -> Option<&str> {
        self.str_field("source")
    }

    /// Transcription confidence, stringified for turn metadata.
    pub fn confidence(&self) -> Option<String> {
        match self.0.get("confidence") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&str> {
        self.str_field("model")
    }

    pub fn fast_path(&self) -> bool {
        self.bool_field("fast_path")
    }

    pub fn offline_only(&self) -> bool {
        self.bool_field("offline_only")
    }

    /// Inline conversation history, if the caller supplied one.
    ///
    /// `None` means "not supplied" (fall back to the memory store);
    /// an empty array is a deliberate empty history.
    pub fn history(&self) -> Option<Vec<HistoryTurn>> {
        let items = self.0.get("history")?.as_array()?;
        Some(
            items
                .iter()
                .map(|item| HistoryTurn {
                    role: item
                        .get("role")
                        .and_then(Value::as_str)
                        .unwrap_or("user")
                        .to_string(),
                    content: item
                        .get("content")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                })
                .collect(),
        )
    }

    /// Session preferences to persist, values stringified.
    pub fn preferences(&self) -> HashMap<String, String> {
        let Some(Value::Object(prefs)) = self.0.get("preferences") else {
            return HashMap::new();
        };
        prefs
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_prefers_first_non_empty_key() {
        let intents = Intents::from_value(json!({"query": "", "text": "hello", "message": "bye"}));
        assert_eq!(intents.query(), Some("hello"));

        let intents = Intents::from_value(json!({"message": "only message"}));
        assert_eq!(intents.query(), Some("only message"));
    }

    #[test]
    fn session_id_defaults() {
        let intents = Intents::from_value(json!({}));
        assert_eq!(intents.session_id(), "default");

        let intents = Intents::from_value(json!({"session_id": "kitchen"}));
        assert_eq!(intents.session_id(), "kitchen");
    }

    #[test]
    fn routing_flags() {
        let intents = Intents::from_value(json!({"fast_path": true, "model": "gpt-4o-mini"}));
        assert!(intents.fast_path());
        assert!(!intents.offline_only());
        assert_eq!(intents.model(), Some("gpt-4o-mini"));
    }

    #[test]
    fn history_absent_vs_empty() {
        assert!(Intents::from_value(json!({})).history().is_none());
        let supplied = Intents::from_value(json!({"history": []})).history();
        assert_eq!(supplied.map(|h| h.len()), Some(0));
    }

    #[test]
    fn history_entries_default_role() {
        let intents = Intents::from_value(json!({
            "history": [{"content": "hi"}, {"role": "assistant", "content": "hello"}]
        }));
        let history = intents.history().unwrap();
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");
    }

    #[test]
    fn preferences_stringify_values() {
        let intents = Intents::from_value(json!({"preferences": {"volume": 3, "voice": "Alex"}}));
        let prefs = intents.preferences();
        assert_eq!(prefs.get("volume").map(String::as_str), Some("3"));
        assert_eq!(prefs.get("voice").map(String::as_str), Some("Alex"));
    }

    #[test]
    fn confidence_accepts_number_or_string() {
        let intents = Intents::from_value(json!({"confidence": 0.92}));
        assert_eq!(intents.confidence(), Some("0.92".into()));
        let intents = Intents::from_value(json!({"confidence": ""}));
        assert_eq!(intents.confidence(), None);
    }

    #[test]
    fn non_object_payload_reads_empty() {
        let intents = Intents::from_value(json!("not a map"));
        assert!(intents.query().is_none());
        assert_eq!(intents.session_id(), "default");
    }
}
