//! Dense Index (C2): stores `(id, vector, content, metadata)` tuples and
//! answers cosine-nearest-neighbor queries.
//!
//! The reference implementation here is an in-process brute-force store
//! (a `Vec` scanned per query) rather than a tuned approximate-nearest-
//! neighbor index. It is wrapped behind the [`VectorStore`] trait so a
//! future externally-backed store can be swapped in without touching
//! [`crate::HybridRetriever`].

use crate::document::Metadata;
use crate::error::RetrieveError;
use std::collections::HashMap;
use std::sync::RwLock;

/// One dense-index query result: the stored id, content, metadata, and the
/// raw cosine distance (`[0, 2]`) to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseHit {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub distance: f32,
}

/// Persistent store of `(id, vector, content, metadata)` tuples supporting
/// cosine-similarity queries.
///
/// Guarded by a `RwLock` so the store manages its own concurrency without
/// requiring an external service.
pub trait VectorStore: Send + Sync {
    /// Append items. Duplicate ids within `ids` are an error. A duplicate id
    /// already present in the store is last-write-wins: the existing
    /// entry's vector/content/metadata are replaced.
    fn add(
        &self,
        ids: Vec<String>,
        vectors: Vec<Vec<f32>>,
        contents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<(), RetrieveError>;

    /// The `n_results` items with smallest cosine distance, ascending.
    /// Empty store yields an empty result. Ties are broken by stable
    /// insertion order.
    fn query(&self, query_vector: &[f32], n_results: usize) -> Result<Vec<DenseHit>, RetrieveError>;

    /// Number of items currently stored.
    fn count(&self) -> usize;

    /// All ids currently stored, for consistency checks against the sparse
    /// index.
    fn ids(&self) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct StoredVector {
    vector: Vec<f32>,
    content: String,
    metadata: Metadata,
    /// Monotonically increasing insertion sequence, used as the stable
    /// tie-break for equal-distance results.
    sequence: u64,
}

/// The in-process brute-force [`VectorStore`] shipped with this crate.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<InMemoryVectorStoreInner>,
}

#[derive(Debug, Default)]
struct InMemoryVectorStoreInner {
    items: HashMap<String, StoredVector>,
    next_sequence: u64,
    dimension: Option<usize>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 1.0; // orthogonal-by-convention for a zero vector
        }
        let cosine_similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
        (1.0 - cosine_similarity).clamp(0.0, 2.0)
    }
}

impl VectorStore for InMemoryVectorStore {
    fn add(
        &self,
        ids: Vec<String>,
        vectors: Vec<Vec<f32>>,
        contents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<(), RetrieveError> {
        if ids.len() != vectors.len() || ids.len() != contents.len() || ids.len() != metadatas.len()
        {
            return Err(RetrieveError::DenseIndex(
                "add() requires ids, vectors, contents, and metadatas of equal length".to_string(),
            ));
        }

        let mut seen_in_batch = std::collections::HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen_in_batch.insert(id.clone()) {
                return Err(RetrieveError::DenseIndex(format!(
                    "duplicate id within batch: {id}"
                )));
            }
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| RetrieveError::DenseIndex("vector store lock poisoned".to_string()))?;

        for (vector, id) in vectors.iter().zip(ids.iter()) {
            let dim = *inner.dimension.get_or_insert(vector.len());
            if vector.len() != dim {
                return Err(RetrieveError::DenseIndex(format!(
                    "dimension mismatch for id {id}: expected {dim}, got {}",
                    vector.len()
                )));
            }
        }

        for (((id, vector), content), metadata) in ids
            .into_iter()
            .zip(vectors.into_iter())
            .zip(contents.into_iter())
            .zip(metadatas.into_iter())
        {
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner.items.insert(
                id,
                StoredVector {
                    vector,
                    content,
                    metadata,
                    sequence,
                },
            );
        }

        Ok(())
    }

    fn query(&self, query_vector: &[f32], n_results: usize) -> Result<Vec<DenseHit>, RetrieveError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RetrieveError::DenseIndex("vector store lock poisoned".to_string()))?;

        if inner.items.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(dim) = inner.dimension {
            if query_vector.len() != dim {
                return Err(RetrieveError::DenseIndex(format!(
                    "dimension mismatch: query has {} dimensions, index has {}",
                    query_vector.len(),
                    dim
                )));
            }
        }

        let mut scored: Vec<(String, f32, u64, &StoredVector)> = inner
            .items
            .iter()
            .map(|(id, stored)| {
                let distance = Self::cosine_distance(&stored.vector, query_vector);
                (id.clone(), distance, stored.sequence, stored)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.cmp(&b.2))
        });

        Ok(scored
            .into_iter()
            .take(n_results)
            .map(|(id, distance, _, stored)| DenseHit {
                id,
                content: stored.content.clone(),
                metadata: stored.metadata.clone(),
                distance,
            })
            .collect())
    }

    fn count(&self) -> usize {
        self.inner.read().map(|inner| inner.items.len()).unwrap_or(0)
    }

    fn ids(&self) -> Vec<String> {
        self.inner
            .read()
            .map(|inner| inner.items.keys().cloned().collect())
            .unwrap_or_default()
    }
}
