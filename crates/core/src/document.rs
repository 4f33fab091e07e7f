//! Knowledge base domain types and the retriever trait.
//!
//! Documents are immutable once ingested; identity is the `id` field and
//! re-ingesting the same id replaces the stored copy. Retrieval results are
//! produced transiently per query and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A knowledge base entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique ID for this document
    pub id: String,

    /// The text content
    pub content: String,

    /// Arbitrary string metadata (e.g. "title")
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Per-signal score breakdown for a retrieval hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    /// Raw cosine similarity against the stored embedding
    pub vector: f32,

    /// Multiset token-overlap ratio against the document text
    pub lexical: f32,
}

/// A scored retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub document: Document,

    /// Weighted combination of the component scores
    pub score: f32,

    pub components: ScoreComponents,
}

impl RetrievalResult {
    /// Serialize into the wire shape used by tool outputs and prompts.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "doc_id": self.document.id,
            "score": self.score,
            "metadata": self.document.metadata,
            "content": self.document.content,
            "components": {
                "vector": self.components.vector,
                "lexical": self.components.lexical,
            },
        })
    }
}

/// The retriever trait.
///
/// Implementations rank stored documents against a textual query. The
/// in-memory hybrid retriever lives in `steward-retrieval`; any dense-vector
/// embedder satisfying "similar text ⇒ higher cosine similarity" can
/// substitute behind this seam.
pub trait Retriever: Send + Sync {
    /// Insert or replace documents by id.
    fn ingest(&self, documents: Vec<Document>);

    /// Fetch documents ordered by descending combined score, truncated to
    /// `top_k` (implementation default when `None`). Empty query or empty
    /// store yields an empty list, never an error.
    fn retrieve(&self, query: &str, top_k: Option<usize>) -> Vec<RetrievalResult>;
}
