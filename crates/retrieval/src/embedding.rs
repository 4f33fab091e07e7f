//! Deterministic sparse embeddings via token-bucket hashing.

use sha2::{Digest, Sha256};

/// Default embedding dimension.
pub const DEFAULT_DIMENSION: usize = 64;

/// Lightweight embedding generator.
///
/// Buckets whitespace-lowercased tokens by a stable hash and accumulates
/// term counts, then L2-normalizes. SHA-256 keeps the bucket assignment
/// identical across processes and releases; `DefaultHasher` does not
/// guarantee that.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Produce a deterministic L2-normalized embedding vector.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let index = (stable_hash(&token) % self.dimension as u64) as usize;
            vector[index] += 1.0;
        }

        let norm = vector.iter().map(|v| (*v as f64) * (*v as f64)).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v = (*v as f64 / norm) as f32;
            }
        }
        vector
    }
}

/// Whitespace-split, lowercased tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|token| token.to_lowercase()).collect()
}

/// First 8 bytes of SHA-256, big-endian.
pub fn stable_hash(token: &str) -> u64 {
    let digest = Sha256::digest(token.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("digest is at least 8 bytes"))
}
