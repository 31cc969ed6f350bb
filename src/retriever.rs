//! Hybrid Retriever (C4): the orchestrator. Owns an [`EmbeddingProvider`], a
//! dense [`VectorStore`], and a [`SparseIndex`], and fuses their signals into
//! ranked [`RetrievalResponse`]s under a configurable linear combination.

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::dense::{DenseHit, InMemoryVectorStore, VectorStore};
use crate::document::{Document, RetrievalResponse, Scores, ScoredDocument, SearchType};
use crate::embedding::EmbeddingProvider;
use crate::error::{EnvVarParseError, RetrieveError};
use crate::sparse::{InMemorySparseIndex, SparseIndex};

/// Construction- and query-time configuration for a [`HybridRetriever`].
/// Every field can be overridden programmatically or loaded from
/// environment variables with [`RetrieverConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieverConfig {
    pub use_hybrid: bool,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    pub default_top_k: usize,
    pub candidate_multiplier: usize,
    pub candidate_cap: usize,
    pub keyword_normalization_divisor: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            use_hybrid: true,
            semantic_weight: 0.6,
            keyword_weight: 0.4,
            default_top_k: 5,
            candidate_multiplier: 2,
            candidate_cap: 20,
            keyword_normalization_divisor: 10.0,
        }
    }
}

impl RetrieverConfig {
    /// Validate this configuration, normalizing the fusion weights so they
    /// sum to `1.0`. Both weights being zero, or either being negative, is a
    /// [`RetrieveError::Configuration`].
    pub fn validated(mut self) -> Result<Self, RetrieveError> {
        if self.semantic_weight < 0.0 || self.keyword_weight < 0.0 {
            return Err(RetrieveError::Configuration(
                "fusion weights must be non-negative".to_string(),
            ));
        }
        let total = self.semantic_weight + self.keyword_weight;
        if total <= 0.0 {
            return Err(RetrieveError::Configuration(
                "semantic_weight and keyword_weight cannot both be zero".to_string(),
            ));
        }
        self.semantic_weight /= total;
        self.keyword_weight /= total;

        if self.default_top_k == 0 {
            return Err(RetrieveError::Configuration(
                "default_top_k must be positive".to_string(),
            ));
        }
        if self.candidate_multiplier == 0 {
            return Err(RetrieveError::Configuration(
                "candidate_multiplier must be positive".to_string(),
            ));
        }
        if self.candidate_cap == 0 {
            return Err(RetrieveError::Configuration(
                "candidate_cap must be positive".to_string(),
            ));
        }
        if self.keyword_normalization_divisor <= 0.0 {
            return Err(RetrieveError::Configuration(
                "keyword_normalization_divisor must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    /// Load configuration from environment variables, falling back to
    /// [`RetrieverConfig::default`] for any variable that is unset. A variable
    /// that is set but unparsable is a [`RetrieveError::Configuration`] —
    /// malformed input is never silently ignored.
    pub fn from_env() -> Result<Self, RetrieveError> {
        let defaults = Self::default();

        fn parse_env<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, RetrieveError> {
            match env::var(var) {
                Ok(value) => value.parse::<T>().map_err(|_| {
                    RetrieveError::Configuration(EnvVarParseError { var, value }.to_string())
                }),
                Err(_) => Ok(default),
            }
        }

        let config = Self {
            use_hybrid: parse_env("RETRIEVAL_USE_HYBRID", defaults.use_hybrid)?,
            semantic_weight: parse_env("RETRIEVAL_SEMANTIC_WEIGHT", defaults.semantic_weight)?,
            keyword_weight: parse_env("RETRIEVAL_KEYWORD_WEIGHT", defaults.keyword_weight)?,
            default_top_k: parse_env("RETRIEVAL_DEFAULT_TOP_K", defaults.default_top_k)?,
            candidate_multiplier: parse_env(
                "RETRIEVAL_CANDIDATE_MULTIPLIER",
                defaults.candidate_multiplier,
            )?,
            candidate_cap: parse_env("RETRIEVAL_CANDIDATE_CAP", defaults.candidate_cap)?,
            keyword_normalization_divisor: parse_env(
                "RETRIEVAL_KEYWORD_NORMALIZATION_DIVISOR",
                defaults.keyword_normalization_divisor,
            )?,
        };

        config.validated()
    }
}

/// A single scored candidate before the final top-k truncation, kept
/// internal to the fusion step.
struct Candidate {
    id: String,
    content: String,
    metadata: crate::document::Metadata,
    semantic: f32,
    keyword: Option<f32>,
}

/// The unmerged per-signal output of a single query, shared by
/// [`HybridRetriever::retrieve`] and [`HybridRetriever::explain`] so the two
/// never disagree about what counted as degraded.
struct QuerySignals {
    dense_hits: Vec<DenseHit>,
    sparse_scores: Option<HashMap<String, f32>>,
    search_type: SearchType,
}

/// The orchestrator: owns the embedding provider, dense index, and sparse
/// index by dependency injection, and fuses their outputs. Generic over the
/// embedding provider so callers can substitute a real, network-backed
/// implementation without the retriever's code changing, and over the
/// sparse index so tests can inject a fault-producing double — mirroring the
/// [`dense::VectorStore`](crate::dense::VectorStore) split above it.
pub struct HybridRetriever<E: EmbeddingProvider, S: SparseIndex = InMemorySparseIndex> {
    embedder: E,
    dense_index: InMemoryVectorStore,
    sparse_index: S,
    /// The full current document set, keyed by id. BM25 needs corpus-wide
    /// statistics (document frequency, average length), so every rebuild of
    /// `sparse_index` starts from this map rather than just the latest
    /// `index_documents` batch — otherwise a second batch would silently
    /// drop the first batch's documents from keyword search.
    documents: RwLock<HashMap<String, Document>>,
    config: RetrieverConfig,
    /// Set once the sparse index has failed to build and scoring has fallen
    /// back to dense-only, so the warning is logged once per transition
    /// rather than on every subsequent query.
    degraded: AtomicBool,
}

impl<E: EmbeddingProvider> HybridRetriever<E, InMemorySparseIndex> {
    /// Construct a retriever over a fresh, empty index, using the in-process
    /// [`InMemorySparseIndex`] for keyword search.
    pub fn new(embedder: E, config: RetrieverConfig) -> Result<Self, RetrieveError> {
        Self::with_sparse_index(embedder, InMemorySparseIndex::new(), config)
    }
}

impl<E: EmbeddingProvider, S: SparseIndex> HybridRetriever<E, S> {
    /// Construct a retriever over a fresh, empty index with a caller-supplied
    /// sparse index — the hook production deployments use to swap in an
    /// externally-backed BM25 service, and tests use to inject a failure
    /// that the in-memory implementation can never produce.
    pub fn with_sparse_index(
        embedder: E,
        sparse_index: S,
        config: RetrieverConfig,
    ) -> Result<Self, RetrieveError> {
        let config = config.validated()?;
        Ok(Self {
            embedder,
            dense_index: InMemoryVectorStore::new(),
            sparse_index,
            documents: RwLock::new(HashMap::new()),
            config,
            degraded: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Index (or re-index) a batch of documents into both the dense and
    /// sparse stores. Re-indexing an id already present is last-write-wins.
    /// If the sparse rebuild fails, the dense index is still updated and the
    /// collection is marked degraded rather than failing the whole call.
    pub fn index_documents(&self, documents: &[Document]) -> Result<(), RetrieveError> {
        if documents.is_empty() {
            return Ok(());
        }
        for document in documents {
            if document.id.trim().is_empty() {
                return Err(RetrieveError::Validation("document id must not be empty".to_string()));
            }
            if document.content.trim().is_empty() {
                return Err(RetrieveError::Validation(
                    "document content must not be empty".to_string(),
                ));
            }
        }

        tracing::debug!(batch_size = documents.len(), "indexing documents");

        let contents: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let vectors = self
            .embedder
            .embed(&contents)
            .map_err(|e| e.into_retrieval())?;

        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        let metadatas: Vec<_> = documents.iter().map(|d| d.metadata.clone()).collect();
        self.dense_index.add(ids, vectors, contents, metadatas)?;

        let corpus = {
            let mut stored = self
                .documents
                .write()
                .map_err(|_| RetrieveError::DenseIndex("document store lock poisoned".to_string()))?;
            for document in documents {
                stored.insert(document.id.clone(), document.clone());
            }
            stored.values().cloned().collect::<Vec<_>>()
        };

        match self.sparse_index.rebuild(&corpus) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::Relaxed) {
                    tracing::info!("sparse index recovered; hybrid scoring resumed");
                }
            }
            Err(err) => {
                if !self.degraded.swap(true, Ordering::Relaxed) {
                    tracing::warn!(error = %err, "sparse index rebuild failed; degrading to dense-only scoring");
                }
            }
        }

        Ok(())
    }

    /// `candidate_k = min(top_k × candidate_multiplier, candidate_cap)`
    /// (SPEC_FULL.md §4.4.4 step 1). Deliberately unfloored against `top_k`:
    /// a small `candidate_cap` can leave fewer dense candidates than
    /// requested results, with the shortfall made up by sparse-only
    /// candidates entering through the union in [`Self::retrieve`].
    fn candidate_k(&self, top_k: usize) -> usize {
        (top_k * self.config.candidate_multiplier).min(self.config.candidate_cap)
    }

    /// Embed the query, pull the dense candidate set, and score it against
    /// the sparse index, updating the degraded flag exactly once per
    /// transition. Shared by [`Self::retrieve`] and [`Self::explain`] so the
    /// two never observe different signals for the same query.
    fn query_signals(&self, query: &str, candidate_k: usize) -> Result<QuerySignals, RetrieveError> {
        let query_vector = self
            .embedder
            .embed_one(query)
            .map_err(|e| e.into_retrieval())?;
        let dense_hits = self
            .dense_index
            .query(&query_vector, candidate_k)
            .map_err(|e| e.into_retrieval())?;

        let sparse_scores = if self.config.use_hybrid {
            match self.sparse_index.score(query) {
                Ok(scores) => {
                    if self.degraded.swap(false, Ordering::Relaxed) {
                        tracing::info!("sparse index recovered; hybrid scoring resumed");
                    }
                    Some(scores)
                }
                Err(err) => {
                    if !self.degraded.swap(true, Ordering::Relaxed) {
                        tracing::warn!(error = %err, "sparse index query failed; falling back to dense-only for this query");
                    }
                    None
                }
            }
        } else {
            None
        };

        let search_type = if sparse_scores.is_some() {
            SearchType::Hybrid
        } else {
            SearchType::Semantic
        };

        Ok(QuerySignals {
            dense_hits,
            sparse_scores,
            search_type,
        })
    }

    /// Retrieve the `top_k` best-matching documents for `query`, fusing
    /// dense and sparse signals per the configured weights. `top_k = None`
    /// uses [`RetrieverConfig::default_top_k`].
    pub fn retrieve(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> Result<RetrievalResponse, RetrieveError> {
        if query.trim().is_empty() {
            return Err(RetrieveError::Validation("query must not be empty".to_string()));
        }
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 {
            return Err(RetrieveError::Validation("top_k must be positive".to_string()));
        }

        tracing::debug!(query, top_k, "retrieving");

        let candidate_k = self.candidate_k(top_k);
        let use_hybrid = self.config.use_hybrid;
        let QuerySignals {
            dense_hits,
            sparse_scores,
            search_type,
        } = self.query_signals(query, candidate_k)?;

        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        for hit in dense_hits {
            let semantic = (1.0 - hit.distance).clamp(0.0, 1.0);
            candidates.insert(
                hit.id.clone(),
                Candidate {
                    id: hit.id,
                    content: hit.content,
                    metadata: hit.metadata,
                    semantic,
                    keyword: None,
                },
            );
        }

        if let Some(ref scores) = sparse_scores {
            let divisor = self.config.keyword_normalization_divisor;
            let mut sparse_only_ids = Vec::new();
            for (id, raw_score) in scores {
                let normalized = (raw_score / divisor).min(1.0);
                if let Some(candidate) = candidates.get_mut(id) {
                    candidate.keyword = Some(normalized);
                } else {
                    sparse_only_ids.push((id.clone(), normalized));
                }
            }

            // The candidate set is the union of dense and sparse hits
            // (SPEC_FULL.md §4.4.4 step 5), not just the dense
            // candidate-generation stage re-weighted by keyword score: a
            // document with no dense candidate slot this query but a
            // strong BM25 match must still be eligible for fusion.
            if !sparse_only_ids.is_empty() {
                let documents = self.documents.read().map_err(|_| {
                    RetrieveError::DenseIndex("document store lock poisoned".to_string())
                })?;
                for (id, keyword) in sparse_only_ids {
                    if let Some(document) = documents.get(&id) {
                        candidates.insert(
                            id.clone(),
                            Candidate {
                                id,
                                content: document.content.clone(),
                                metadata: document.metadata.clone(),
                                semantic: 0.0,
                                keyword: Some(keyword),
                            },
                        );
                    }
                }
            }
        }

        let mut scored: Vec<ScoredDocument> = candidates
            .into_values()
            .map(|candidate| {
                let combined = if let Some(keyword) = candidate.keyword {
                    self.config.semantic_weight * candidate.semantic
                        + self.config.keyword_weight * keyword
                } else if use_hybrid {
                    self.config.semantic_weight * candidate.semantic
                } else {
                    candidate.semantic
                };

                ScoredDocument {
                    id: candidate.id,
                    content: candidate.content,
                    metadata: candidate.metadata,
                    scores: Scores {
                        combined,
                        semantic: candidate.semantic,
                        keyword: candidate.keyword,
                    },
                    search_type,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.scores
                .combined
                .partial_cmp(&a.scores.combined)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);

        Ok(RetrievalResponse {
            query: query.to_string(),
            search_mode: search_type,
            results: scored,
        })
    }

    /// Diagnostic variant of [`retrieve`](Self::retrieve) that, instead of
    /// returning the fused ranking, exposes the unmerged dense and sparse
    /// ranked lists and the weights that would be used to combine them
    /// (SPEC_FULL.md §4.4.5) — for callers tuning weights or debugging a
    /// surprising ranking who need to see each signal before it is collapsed
    /// into a single `combined` score.
    pub fn explain(&self, query: &str, top_k: Option<usize>) -> Result<ExplainedRetrieval, RetrieveError> {
        if query.trim().is_empty() {
            return Err(RetrieveError::Validation("query must not be empty".to_string()));
        }
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        if top_k == 0 {
            return Err(RetrieveError::Validation("top_k must be positive".to_string()));
        }

        let candidate_k = self.candidate_k(top_k);
        let QuerySignals {
            dense_hits,
            sparse_scores,
            ..
        } = self.query_signals(query, candidate_k)?;

        Ok(ExplainedRetrieval {
            query: query.to_string(),
            degraded: self.is_degraded(),
            candidate_k,
            semantic_weight: self.config.semantic_weight,
            keyword_weight: self.config.keyword_weight,
            dense_candidates: dense_hits,
            sparse_scores,
        })
    }
}

/// Diagnostic output of [`HybridRetriever::explain`]: the unmerged dense and
/// sparse rankings for a query plus the weights [`HybridRetriever::retrieve`]
/// would fuse them under. Unlike [`RetrievalResponse`], nothing here has been
/// combined into a single score — `dense_candidates` is ranked by ascending
/// distance exactly as [`crate::dense::VectorStore::query`] returned it, and
/// `sparse_scores` is the raw, unnormalized BM25 score per matching document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainedRetrieval {
    pub query: String,
    pub degraded: bool,
    pub candidate_k: usize,
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    pub dense_candidates: Vec<DenseHit>,
    /// `None` when hybrid scoring was disabled or the sparse index failed
    /// for this query; present and possibly empty otherwise.
    pub sparse_scores: Option<HashMap<String, f32>>,
}


#[cfg(test)]
mod env_config_tests {
    use super::*;

    const VARS: &[&str] = &[
        "RETRIEVAL_USE_HYBRID",
        "RETRIEVAL_SEMANTIC_WEIGHT",
        "RETRIEVAL_KEYWORD_WEIGHT",
        "RETRIEVAL_DEFAULT_TOP_K",
        "RETRIEVAL_CANDIDATE_MULTIPLIER",
        "RETRIEVAL_CANDIDATE_CAP",
        "RETRIEVAL_KEYWORD_NORMALIZATION_DIVISOR",
    ];

    /// Environment variables are process-global, so tests that mutate them
    /// must not interleave. Mirrors the `set_var`-under-mutex idiom used
    /// elsewhere in the pack for env-driven config tests.
    static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn clear_vars() {
        for var in VARS {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn from_env_uses_defaults_when_unset() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_vars();

        let config = RetrieverConfig::from_env().unwrap();
        assert_eq!(config, RetrieverConfig::default().validated().unwrap());

        clear_vars();
    }

    #[test]
    fn from_env_applies_a_valid_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_vars();
        unsafe {
            env::set_var("RETRIEVAL_DEFAULT_TOP_K", "7");
            env::set_var("RETRIEVAL_USE_HYBRID", "false");
        }

        let config = RetrieverConfig::from_env().unwrap();
        assert_eq!(config.default_top_k, 7);
        assert!(!config.use_hybrid);

        clear_vars();
    }

    #[test]
    fn from_env_rejects_a_malformed_value_without_panicking() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_vars();
        unsafe {
            env::set_var("RETRIEVAL_DEFAULT_TOP_K", "not-a-number");
        }

        let result = RetrieverConfig::from_env();
        assert!(matches!(result, Err(RetrieveError::Configuration(_))));

        clear_vars();
    }
}
