//! Persistence for embedded corpora.
//!
//! The [`CacheStore`] trait is the only thing the vector store knows about
//! where snapshots live, so the backing medium can change without touching
//! chunking or search.
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`FileCache`] | One JSON file on disk (production) |
//! | [`MemoryCache`] | Process-local snapshot (tests, ephemeral deployments) |
//!
//! Backends store whatever snapshot they are given. Version checking is
//! the caller's job; see [`CACHE_VERSION`].

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::EmbeddingCache;

/// Schema version written into every snapshot.
///
/// Bump this whenever the shape of [`Chunk`](crate::models::Chunk),
/// [`ChunkMetadata`](crate::models::ChunkMetadata) or the embeddings
/// changes. A snapshot with any other version is discarded and rebuilt.
pub const CACHE_VERSION: &str = "1.0.0";

/// Storage backend for [`EmbeddingCache`] snapshots.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Read the stored snapshot, or `None` if nothing is stored.
    async fn load(&self) -> Result<Option<EmbeddingCache>>;

    /// Replace the stored snapshot.
    async fn save(&self, cache: &EmbeddingCache) -> Result<()>;

    /// Whether a snapshot is currently stored.
    async fn exists(&self) -> bool;

    /// Delete the stored snapshot. Returns `true` if one was removed.
    async fn clear(&self) -> Result<bool>;
}
