//! Error taxonomy for the hybrid retrieval core.
//!
//! [`RetrieveError`] is the single enum every public operation returns. Each
//! variant corresponds to one of the error kinds named in the design: bad
//! caller input never gets silently swallowed, and every wrapped cause keeps
//! its source chain via `#[source]` so `tracing` and `std::error::Error`
//! consumers alike can walk it.

use std::fmt;

/// Boxed cause for errors originating in an external collaborator (an
/// embedding backend, a dense-index backing store) whose concrete error type
/// the core does not want to name.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while building or querying a [`crate::HybridRetriever`].
#[derive(thiserror::Error, Debug)]
pub enum RetrieveError {
    /// Caller-supplied input violated a stated precondition: a non-positive
    /// `top_k`, a duplicate id within a batch, or an empty id/content string.
    /// Never retried internally.
    #[error("validation error: {0}")]
    Validation(String),

    /// Construction-time misconfiguration (both fusion weights zero, a
    /// non-positive `keyword_normalization_divisor`, ...). Fatal at
    /// construction; the retriever is never built.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The embedding provider failed (network, auth, quota). Fatal for the
    /// current operation; the caller decides whether to retry.
    #[error("embedding provider error: {0}")]
    EmbeddingProvider(#[source] BoxError),

    /// The dense index is unavailable, corrupted, or was queried with a
    /// vector of the wrong dimension. Fatal for the current operation.
    #[error("dense index error: {0}")]
    DenseIndex(String),

    /// The sparse index is unavailable. During `retrieve` this is recovered
    /// locally by falling back to dense-only search; during
    /// `index_documents` it marks the collection degraded instead.
    #[error("sparse index error: {0}")]
    SparseIndex(String),

    /// Any of the above surfaced from `retrieve`, with the original cause
    /// preserved.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] Box<RetrieveError>),
}

impl RetrieveError {
    /// Wrap an arbitrary embedding-backend error as an [`RetrieveError::EmbeddingProvider`].
    pub fn embedding_provider<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RetrieveError::EmbeddingProvider(Box::new(cause))
    }

    /// Wrap `self` as the cause of a top-level [`RetrieveError::Retrieval`].
    pub fn into_retrieval(self) -> Self {
        RetrieveError::Retrieval(Box::new(self))
    }

    /// `true` for the error kinds that `retrieve` recovers from locally by
    /// falling back to dense-only search, rather than propagating.
    pub fn is_sparse_fallback_eligible(&self) -> bool {
        matches!(self, RetrieveError::SparseIndex(_))
    }
}

/// A stand-in for reading a malformed environment-variable configuration
/// value; wrapped into [`RetrieveError::Configuration`] by the config loader.
#[derive(Debug)]
pub struct EnvVarParseError {
    pub var: &'static str,
    pub value: String,
}

impl fmt::Display for EnvVarParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "environment variable {} has invalid value {:?}",
            self.var, self.value
        )
    }
}

impl std::error::Error for EnvVarParseError {}
