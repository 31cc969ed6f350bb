//! Hybrid dense + BM25 retrieval core for product-intelligence question
//! answering.
//!
//! A query's relevance is judged two ways and combined: a dense embedding
//! comparison (semantic similarity) and Okapi BM25 (lexical overlap). Each
//! signal is normalized into `[0, 1]` and fused under configurable weights
//! (see [`RetrieverConfig`]), so a query like "what's our refund window"
//! can match a document that never says the word "window" at all, while a
//! query that names an exact SKU or error code still rewards the document
//! that contains it verbatim.
//!
//! The four building blocks:
//! - [`EmbeddingProvider`] (C1) maps text to vectors. [`HashingEmbedder`] is
//!   the dependency-free reference implementation; production deployments
//!   swap in a real network-backed embedder behind the same trait.
//! - [`dense::VectorStore`] (C2) is the dense nearest-neighbor index.
//! - [`sparse::SparseIndex`] (C3) is the BM25 keyword index, rebuilt whole
//!   and published atomically on every reindex.
//! - [`HybridRetriever`] (C4) owns all three and performs the fusion.
//!
//! ```
//! use hybrid_retrieve::{Document, HybridRetriever, RetrieverConfig, HashingEmbedder};
//!
//! let retriever = HybridRetriever::new(HashingEmbedder::new(64), RetrieverConfig::default())
//!     .expect("default config is valid");
//! retriever
//!     .index_documents(&[Document::new("faq-1", "Refunds are available within 30 days of purchase.")])
//!     .expect("indexing succeeds");
//!
//! let response = retriever.retrieve("refund window", Some(1)).expect("query succeeds");
//! assert_eq!(response.results[0].id, "faq-1");
//! ```

pub mod dense;
pub mod document;
pub mod embedding;
pub mod error;
pub mod sparse;
pub mod retriever;

pub use document::{Document, Metadata, MetadataValue, RetrievalResponse, Scores, ScoredDocument, SearchType};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{BoxError, RetrieveError};
pub use retriever::{ExplainedRetrieval, HybridRetriever, RetrieverConfig};

/// Convenience re-exports for `use hybrid_retrieve::prelude::*;`.
pub mod prelude {
    pub use crate::dense::{DenseHit, InMemoryVectorStore, VectorStore};
    pub use crate::document::{
        Document, Metadata, MetadataValue, RetrievalResponse, Scores, ScoredDocument, SearchType,
    };
    pub use crate::embedding::{EmbeddingProvider, HashingEmbedder};
    pub use crate::error::{BoxError, RetrieveError};
    pub use crate::retriever::{ExplainedRetrieval, HybridRetriever, RetrieverConfig};
    pub use crate::sparse::{InMemorySparseIndex, SparseIndex};
}
