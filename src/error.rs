//! Error taxonomy for the retrieval pipeline.
//!
//! Initialisation failures ([`RagError::EmptyCorpus`], [`RagError::Consistency`],
//! embedding failures while building the corpus) are surfaced to the caller.
//! Query-time failures are swallowed by [`crate::search::search_guidelines`]
//! and turned into fallback text.

use thiserror::Error;

/// Errors produced by the chunk/embed/store/search pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// A required credential or setting is missing. Not retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport, provider-side, or malformed-response failure from the
    /// embedding service.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Chunking the corpus produced nothing to embed.
    #[error("no chunks produced from the guideline corpus")]
    EmptyCorpus,

    /// The embedding service returned a different number of vectors than
    /// there are chunks.
    #[error("chunk/embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    Consistency { chunks: usize, embeddings: usize },

    /// The store has no chunks or no embeddings after initialisation.
    #[error("vector store is not properly initialized")]
    NotInitialized,

    /// A query vector does not match the dimensionality of the stored vectors.
    #[error("embedding dimension mismatch: store has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The guideline corpus could not be read or parsed.
    #[error("failed to load guideline corpus: {0}")]
    Corpus(String),

    /// Reading, writing, or deleting the cache artifact failed.
    #[error("embedding cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl From<reqwest::Error> for RagError {
    fn from(e: reqwest::Error) -> Self {
        RagError::Embedding(e.to_string())
    }
}
