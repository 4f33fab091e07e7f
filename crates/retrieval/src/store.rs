//! In-process vector store for experimentation.
//!
//! Keeps documents in insertion order so equal-score candidates rank
//! deterministically; re-ingesting an id replaces the stored copy in place
//! without disturbing its slot.

use std::collections::HashMap;
use std::sync::RwLock;

use steward_core::Document;

use crate::embedding::HashEmbedder;

struct StoreInner {
    /// Documents with their embeddings, in first-insertion order
    slots: Vec<(Document, Vec<f32>)>,

    /// id → slot position
    index: HashMap<String, usize>,
}

/// Stores document embeddings in-process.
pub struct InMemoryVectorStore {
    embedder: HashEmbedder,
    inner: RwLock<StoreInner>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: HashEmbedder) -> Self {
        Self {
            embedder,
            inner: RwLock::new(StoreInner { slots: Vec::new(), index: HashMap::new() }),
        }
    }

    pub fn embedder(&self) -> &HashEmbedder {
        &self.embedder
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("store lock poisoned").slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace documents by id.
    pub fn add_documents(&self, documents: Vec<Document>) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        for document in documents {
            let embedding = self.embedder.embed(&document.content);
            match inner.index.get(&document.id) {
                Some(&slot) => {
                    inner.slots[slot] = (document, embedding);
                }
                None => {
                    let slot = inner.slots.len();
                    inner.index.insert(document.id.clone(), slot);
                    inner.slots.push((document, embedding));
                }
            }
        }
    }

    /// Return the `top_k` documents by cosine similarity to the query,
    /// descending, ties in insertion order.
    pub fn similarity_search(&self, query: &str, top_k: usize) -> Vec<(Document, f32)> {
        let query_vec = self.embedder.embed(query);
        let inner = self.inner.read().expect("store lock poisoned");

        let mut scored: Vec<(Document, f32)> = inner
            .slots
            .iter()
            .map(|(document, embedding)| {
                (document.clone(), cosine_similarity(&query_vec, embedding))
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude input, so documents
/// with empty content score 0 instead of poisoning the ranking with NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(docs: &[(&str, &str)]) -> InMemoryVectorStore {
        let store = InMemoryVectorStore::new(HashEmbedder::default());
        store.add_documents(
            docs.iter().map(|(id, content)| Document::new(*id, *content)).collect(),
        );
        store
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn exact_match_ranks_first() {
        let store = store_with(&[
            ("a", "charging dock location"),
            ("b", "battery maintenance schedule"),
            ("c", "unrelated gardening notes"),
        ]);
        let results = store.similarity_search("battery maintenance schedule", 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "b");
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn replace_by_id_keeps_store_size() {
        let store = store_with(&[("a", "old content")]);
        store.add_documents(vec![Document::new("a", "completely new words")]);
        assert_eq!(store.len(), 1);
        let results = store.similarity_search("completely new words", 1);
        assert!(results[0].1 > 0.9);
    }

    #[test]
    fn empty_store_returns_nothing() {
        let store = InMemoryVectorStore::new(HashEmbedder::default());
        assert!(store.similarity_search("anything", 4).is_empty());
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let store = store_with(&[("first", "same text"), ("second", "same text")]);
        let results = store.similarity_search("same text", 2);
        assert_eq!(results[0].0.id, "first");
        assert_eq!(results[1].0.id, "second");
    }
}
