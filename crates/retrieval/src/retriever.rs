//! Hybrid retriever combining lexical and dense similarity.

use std::collections::HashMap;

use steward_config::RetrievalConfig;
use steward_core::{Document, RetrievalResult, Retriever, ScoreComponents};
use tracing::debug;

use crate::embedding::tokenize;
use crate::store::InMemoryVectorStore;

/// Ranks stored documents by `vector_weight · cosine + lexical_weight · overlap`.
///
/// The dense stage keeps `3 × top_k` candidates to bound the lexical scoring
/// cost; candidates below `min_score` are dropped before truncation.
pub struct KnowledgeRetriever {
    store: InMemoryVectorStore,
    config: RetrievalConfig,
}

impl KnowledgeRetriever {
    pub fn new(store: InMemoryVectorStore, config: RetrievalConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn document_count(&self) -> usize {
        self.store.len()
    }

    fn lexical_score(query_counts: &HashMap<String, usize>, content: &str) -> f32 {
        let mut doc_counts: HashMap<String, usize> = HashMap::new();
        for token in tokenize(content) {
            *doc_counts.entry(token).or_insert(0) += 1;
        }

        let intersection: usize = query_counts
            .iter()
            .map(|(token, count)| (*count).min(doc_counts.get(token).copied().unwrap_or(0)))
            .sum();
        let union = query_counts.values().sum::<usize>() + doc_counts.values().sum::<usize>()
            - intersection;

        if union == 0 {
            return 0.0;
        }
        intersection as f32 / union as f32
    }
}

impl Retriever for KnowledgeRetriever {
    fn ingest(&self, documents: Vec<Document>) {
        debug!(count = documents.len(), "Ingesting documents");
        self.store.add_documents(documents);
    }

    fn retrieve(&self, query: &str, top_k: Option<usize>) -> Vec<RetrievalResult> {
        let top_k = top_k.unwrap_or(self.config.top_k);
        let candidates = self.store.similarity_search(query, top_k * 3);

        let mut query_counts: HashMap<String, usize> = HashMap::new();
        for token in tokenize(query) {
            *query_counts.entry(token).or_insert(0) += 1;
        }

        let mut scored: Vec<RetrievalResult> = Vec::new();
        for (document, vector_score) in candidates {
            let lexical_score = Self::lexical_score(&query_counts, &document.content);
            let combined = self.config.vector_weight * vector_score
                + self.config.lexical_weight * lexical_score;
            if combined < self.config.min_score {
                continue;
            }
            scored.push(RetrievalResult {
                document,
                score: combined,
                components: ScoreComponents { vector: vector_score, lexical: lexical_score },
            });
        }

        // Stable sort: candidate order breaks ties.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;

    fn retriever_with(docs: &[(&str, &str)]) -> KnowledgeRetriever {
        let retriever = KnowledgeRetriever::new(
            InMemoryVectorStore::new(HashEmbedder::default()),
            RetrievalConfig::default(),
        );
        retriever.ingest(docs.iter().map(|(id, content)| Document::new(*id, *content)).collect());
        retriever
    }

    #[test]
    fn results_sorted_descending_above_threshold() {
        let retriever = retriever_with(&[
            ("dock", "charging dock is in the hallway closet"),
            ("battery", "battery swap procedure for the service robot"),
            ("garden", "watering schedule for the tomato garden"),
        ]);

        let results = retriever.retrieve("battery swap procedure", None);
        assert!(!results.is_empty());
        assert_eq!(results[0].document.id, "battery");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        let min_score = retriever.config().min_score;
        assert!(results.iter().all(|r| r.score >= min_score));
    }

    #[test]
    fn empty_query_returns_empty() {
        let retriever = retriever_with(&[("a", "some content")]);
        assert!(retriever.retrieve("", None).is_empty());
    }

    #[test]
    fn empty_store_returns_empty() {
        let retriever = KnowledgeRetriever::new(
            InMemoryVectorStore::new(HashEmbedder::default()),
            RetrievalConfig::default(),
        );
        assert!(retriever.retrieve("anything at all", None).is_empty());
    }

    #[test]
    fn top_k_truncates() {
        let docs: Vec<(String, String)> = (0..10)
            .map(|i| (format!("d{i}"), format!("battery notes entry {i}")))
            .collect();
        let retriever = retriever_with(
            &docs.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect::<Vec<_>>(),
        );
        let results = retriever.retrieve("battery notes", Some(3));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn components_recorded() {
        let retriever = retriever_with(&[("a", "battery battery battery")]);
        let results = retriever.retrieve("battery", None);
        assert_eq!(results.len(), 1);
        let components = results[0].components;
        assert!(components.vector > 0.9);
        assert!(components.lexical > 0.0 && components.lexical < 1.0);
    }

    #[test]
    fn lexical_score_multiset_overlap() {
        let mut query_counts = HashMap::new();
        query_counts.insert("battery".to_string(), 1);
        query_counts.insert("status".to_string(), 1);

        // intersection = 2, union = 2 + 3 - 2 = 3
        let score = KnowledgeRetriever::lexical_score(&query_counts, "battery status report");
        assert!((score - 2.0 / 3.0).abs() < 1e-6);

        // no shared tokens
        let score = KnowledgeRetriever::lexical_score(&query_counts, "garden hose");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn lexical_score_empty_union() {
        let query_counts = HashMap::new();
        assert_eq!(KnowledgeRetriever::lexical_score(&query_counts, ""), 0.0);
    }

    #[test]
    fn reingest_replaces_document() {
        let retriever = retriever_with(&[("note", "old irrelevant words")]);
        retriever.ingest(vec![Document::new("note", "fresh battery facts")]);
        assert_eq!(retriever.document_count(), 1);
        let results = retriever.retrieve("fresh battery facts", None);
        assert_eq!(results[0].document.content, "fresh battery facts");
    }
}
