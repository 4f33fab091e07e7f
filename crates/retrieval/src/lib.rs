//! Hybrid retrieval for the Steward knowledge base.
//!
//! Combines dense similarity over deterministic hashed embeddings with a
//! lexical token-overlap signal. The embedder is a stand-in for a real
//! embedding model — any dense-vector embedder satisfying "similar text ⇒
//! higher cosine similarity" can substitute behind the `Retriever` trait.

pub mod embedding;
pub mod retriever;
pub mod store;

pub use embedding::HashEmbedder;
pub use retriever::KnowledgeRetriever;
pub use store::InMemoryVectorStore;
