//! The data model: [`Document`], [`MetadataValue`], and the score triplet
//! attached to every retrieval result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single primitive metadata value. Opaque to the retriever; forwarded
/// verbatim on retrieval. Kept to JSON-representable primitives so
/// `Document` round-trips through `serde_json` without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Metadata attached to a [`Document`]. A `BTreeMap` is used (rather than a
/// `HashMap`) so that two documents with identical metadata serialize to
/// byte-identical JSON for identical metadata, which repeated identical
/// queries depend on.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// An indexed unit: a caller-supplied id, the text used for both embedding
/// and tokenization, and opaque metadata forwarded verbatim on retrieval.
///
/// `id` and `content` must be non-empty; this is enforced by
/// [`crate::HybridRetriever::index_documents`], not by this type itself, so
/// that callers can still construct and inspect an invalid `Document` while
/// building one up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Construct a document with empty metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Construct a document with metadata attached.
    pub fn with_metadata(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }
}

/// The three per-component scores attached to every retrieval result,
/// expressed as a small named record rather than an untyped mapping so
/// downstream attribution code cannot silently miss a component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub combined: f32,
    pub semantic: f32,
    /// `None` when the sparse signal was unavailable or unused for this
    /// result (dense-only mode, or a sparse-index fallback).
    pub keyword: Option<f32>,
}

/// Whether a retrieval result was produced by fusing both signals, or by
/// dense search alone (either because `use_hybrid = false`, or because the
/// sparse index failed and the retriever degraded this query).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Hybrid,
    Semantic,
}

/// One ranked document in a [`crate::RetrievalResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub scores: Scores,
    pub search_type: SearchType,
}

/// The full response of a [`crate::HybridRetriever::retrieve`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub query: String,
    pub search_mode: SearchType,
    pub results: Vec<ScoredDocument>,
}
