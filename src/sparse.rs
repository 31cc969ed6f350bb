//! Sparse Index (C3): Okapi BM25 over a full-rebuild inverted index.
//!
//! BM25 needs corpus-wide statistics (document frequency, average document
//! length), so unlike the dense index this one has no incremental `add`: the
//! whole index is rebuilt from the current document set and published
//! atomically via `arc_swap::ArcSwap`. Readers never
//! block on a rebuild in progress; they keep scoring against the previous
//! snapshot until the swap completes.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::document::Document;
use crate::error::RetrieveError;

/// Okapi BM25 constants, fixed rather than exposed as retriever-level
/// tuning knobs.
const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Lowercased tokens split on Unicode whitespace only. No stemming, no
/// stopword removal, no punctuation stripping: `"pricing,"` and `"pricing"`
/// are distinct tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// BM25 keyword search over a document corpus.
///
/// Mirrors [`crate::dense::VectorStore`]'s split between a trait (the
/// capability C4 depends on) and a concrete in-process implementation, so
/// callers — and this crate's own tests — can substitute a fault-injecting
/// double without `HybridRetriever` changing.
pub trait SparseIndex: Send + Sync {
    /// Replace the current index from scratch with the given document set.
    /// Tokenization per [`tokenize`]; full rebuild, not incremental.
    fn rebuild(&self, documents: &[Document]) -> Result<(), RetrieveError>;

    /// BM25 score for every document containing at least one query term.
    /// Documents with no query-term overlap are absent from the map (score
    /// `0.0`, not an explicit entry).
    fn score(&self, query: &str) -> Result<HashMap<String, f32>, RetrieveError>;
}

#[derive(Debug, Default)]
struct InvertedIndex {
    /// term -> (doc id -> term frequency in that doc)
    postings: HashMap<String, HashMap<String, u32>>,
    /// doc id -> token count
    doc_lengths: HashMap<String, u32>,
    avg_doc_length: f32,
    num_docs: usize,
}

impl InvertedIndex {
    fn build(documents: &[Document]) -> Self {
        let mut postings: HashMap<String, HashMap<String, u32>> = HashMap::new();
        let mut doc_lengths = HashMap::with_capacity(documents.len());
        let mut total_length: u64 = 0;

        for doc in documents {
            let tokens = tokenize(&doc.content);
            doc_lengths.insert(doc.id.clone(), tokens.len() as u32);
            total_length += tokens.len() as u64;

            let mut term_frequencies: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *term_frequencies.entry(token).or_insert(0) += 1;
            }
            for (term, frequency) in term_frequencies {
                postings
                    .entry(term)
                    .or_default()
                    .insert(doc.id.clone(), frequency);
            }
        }

        let num_docs = documents.len();
        let avg_doc_length = if num_docs > 0 {
            total_length as f32 / num_docs as f32
        } else {
            0.0
        };

        Self {
            postings,
            doc_lengths,
            avg_doc_length,
            num_docs,
        }
    }

    fn idf(&self, term: &str) -> f32 {
        let df = self.postings.get(term).map(|p| p.len()).unwrap_or(0);
        let n = self.num_docs as f32;
        (((n - df as f32 + 0.5) / (df as f32 + 0.5)) + 1.0).ln()
    }

    fn score(&self, query_terms: &[String]) -> HashMap<String, f32> {
        if self.num_docs == 0 {
            return HashMap::new();
        }

        let mut scores: HashMap<String, f32> = HashMap::new();
        for term in query_terms {
            let Some(doc_term_frequencies) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(term);
            for (doc_id, &term_frequency) in doc_term_frequencies {
                let doc_length = *self.doc_lengths.get(doc_id).unwrap_or(&0) as f32;
                let term_frequency = term_frequency as f32;
                let denominator = term_frequency
                    + K1 * (1.0 - B + B * (doc_length / self.avg_doc_length.max(1.0)));
                let term_score = idf * (term_frequency * (K1 + 1.0)) / denominator;
                *scores.entry(doc_id.clone()).or_insert(0.0) += term_score;
            }
        }
        scores
    }
}

/// The in-process, full-rebuild [`SparseIndex`] shipped with this crate.
/// Published through an `ArcSwap` so rebuilds never block concurrent
/// scoring.
#[derive(Debug, Default)]
pub struct InMemorySparseIndex {
    current: ArcSwap<InvertedIndex>,
}

impl InMemorySparseIndex {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(InvertedIndex::default()),
        }
    }

    /// Number of documents in the currently published snapshot.
    pub fn len(&self) -> usize {
        self.current.load().num_docs
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SparseIndex for InMemorySparseIndex {
    /// Rebuild the index from the given document set and publish it
    /// atomically. Readers mid-[`SparseIndex::score`] see either the old or
    /// the new snapshot in full, never a partial one.
    fn rebuild(&self, documents: &[Document]) -> Result<(), RetrieveError> {
        let index = InvertedIndex::build(documents);
        self.current.store(Arc::new(index));
        Ok(())
    }

    fn score(&self, query: &str) -> Result<HashMap<String, f32>, RetrieveError> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() {
            return Ok(HashMap::new());
        }
        let index = self.current.load();
        Ok(index.score(&query_terms))
    }
}
