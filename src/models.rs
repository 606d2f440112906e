//! Core data models used throughout the retrieval pipeline.
//!
//! These types represent the guideline documents, chunks, cache snapshots
//! and search results that flow between the chunker, the embedding client
//! and the vector store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guideline document as it appears in the corpus file.
///
/// Only `url` and `content` are required. The structured fields are
/// optional; when all of them are absent the chunker infers what it can
/// from the URL and the content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuidelineDocument {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_guideline: Option<String>,
}

/// Metadata shared by every chunk cut from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub url: String,
    /// Legacy label, e.g. `"Guideline 7.1"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline: Option<String>,
    /// e.g. `"7.1"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_number: Option<String>,
    /// e.g. `"Optimize choice and autonomy"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_guideline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
}

/// A retrievable slice of a guideline document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A chunk paired with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Persisted snapshot of a fully embedded corpus.
///
/// `embeddings[i]` is the vector for `chunks[i]`. The field names match
/// the JSON artifact written by earlier deployments, hence `createdAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingCache {
    pub chunks: Vec<Chunk>,
    pub embeddings: Vec<Vec<f32>>,
    pub version: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Point-in-time view of the store, cheap to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub chunk_count: usize,
    pub embedding_dimensions: usize,
    pub cache_exists: bool,
}

/// Result of a status probe: whether initialisation succeeded, plus stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RagStatus {
    pub initialized: bool,
    pub stats: StoreStats,
}
