//! Deterministic placeholder generation.
//!
//! Fabricates a completion from a hash-seeded pseudo-random mix of prompt
//! tokens and synthetic words. Identical `(prompt, model)` pairs always
//! produce identical text in any process. A deployment swaps this for a
//! real text-completion client behind the same trait.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use steward_core::{CompletionBackend, ModelError, ModelSpec};

/// The built-in simulated completion backend. Never fails.
#[derive(Debug, Default)]
pub struct SimulatedBackend;

impl SimulatedBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CompletionBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn complete(&self, prompt: &str, spec: &ModelSpec) -> Result<String, ModelError> {
        Ok(simulate_response(prompt, spec))
    }
}

fn simulate_response(prompt: &str, spec: &ModelSpec) -> String {
    let mut rng = Lcg::from_seed(prompt, &spec.name);
    let tokens: Vec<&str> = prompt.split_whitespace().collect();
    let projected_len = (tokens.len() / 2 + 32).min(spec.max_output_tokens as usize);

    let mut synthetic: Vec<String> = Vec::with_capacity(projected_len);
    for _ in 0..projected_len {
        if !tokens.is_empty() && rng.next_f64() > 0.6 {
            let pick = rng.next_index(tokens.len());
            synthetic.push(tokens[pick].to_string());
        } else {
            synthetic.push(rng.next_word(5));
        }
    }

    let text = synthetic.join(" ");
    text.chars().take(spec.max_output_tokens as usize * 5).collect()
}

/// Minimal linear congruential generator.
///
/// The simulator only needs stable pseudo-randomness, not statistical
/// quality; seeding from SHA-256 keeps output identical across processes.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn from_seed(prompt: &str, model: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hasher.update(model.as_bytes());
        let digest = hasher.finalize();
        let state = u64::from_be_bytes(digest[..8].try_into().expect("digest has 8 bytes"));
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 11
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() % 1_000_000) as f64 / 1_000_000.0
    }

    fn next_index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    fn next_word(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| (b'a' + (self.next_u64() % 26) as u8) as char)
            .collect()
    }
}
