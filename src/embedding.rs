//! Embedding Provider (C1): maps text to fixed-dimension real vectors.
//!
//! The core depends only on the [`EmbeddingProvider`] trait, not a specific
//! vendor. A real, network-backed implementation (the
//! HTTP call to an embedding API) is an external collaborator and out of
//! scope for this crate; [`HashingEmbedder`] is the one concrete
//! implementation shipped here, suitable for tests, examples, and offline
//! development.

use crate::error::RetrieveError;

/// Maps text to fixed-dimension real vectors.
///
/// Implementations must be deterministic for a given provider configuration
/// (same model/version in, same vector out) and must preserve element order:
/// `embed(texts)[i]` corresponds to `texts[i]`.
pub trait EmbeddingProvider: Send + Sync {
    /// The fixed dimension of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts. `len(result) == len(texts)`, in the same
    /// order. Fails with [`RetrieveError::EmbeddingProvider`] on
    /// network/auth/quota problems; the caller treats this as fatal for the
    /// current operation.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrieveError>;

    /// Convenience wrapper for embedding a single query string.
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, RetrieveError> {
        let mut out = self.embed(std::slice::from_ref(&text.to_string()))?;
        Ok(out.pop().expect("embed() preserves length for non-empty input"))
    }
}

/// A deterministic, dependency-free embedding provider based on hashed word
/// shingles.
///
/// This is not a semantic embedder in the machine-learning sense: it has no
/// notion of meaning beyond shared tokens. It exists so the crate's tests,
/// doctests, and examples can exercise the full dense+sparse fusion pipeline
/// without a network dependency. Two texts sharing more tokens land closer
/// together in cosine space than two texts sharing none, which is enough to
/// exercise semantic-paraphrase-style scenarios in tests built around a
/// shared vocabulary.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create a hashing embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self { dimension }
    }

    fn hash_token(token: &str) -> u64 {
        // FNV-1a: fast, deterministic, no external dependency.
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.as_bytes() {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return vector;
        }
        for token in &tokens {
            let lower = token.to_lowercase();
            let hash = Self::hash_token(&lower);
            let bucket = (hash % self.dimension as u64) as usize;
            // Sign bit spreads mass across +/- so unrelated tokens partially
            // cancel rather than only ever adding up.
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrieveError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
