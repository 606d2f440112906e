//! In-memory [`CacheStore`] implementation for tests and ephemeral runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::CacheStore;
use crate::error::Result;
use crate::models::EmbeddingCache;

/// Keeps the snapshot in process memory. Counts saves so callers can tell
/// whether a store rebuilt its corpus.
#[derive(Default)]
pub struct MemoryCache {
    snapshot: RwLock<Option<EmbeddingCache>>,
    saves: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `cache` already stored.
    pub fn with_snapshot(cache: EmbeddingCache) -> Self {
        Self {
            snapshot: RwLock::new(Some(cache)),
            saves: AtomicUsize::new(0),
        }
    }

    /// A copy of the stored snapshot.
    pub fn snapshot(&self) -> Option<EmbeddingCache> {
        self.snapshot.read().unwrap().clone()
    }

    /// Number of successful [`save`](CacheStore::save) calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn load(&self) -> Result<Option<EmbeddingCache>> {
        Ok(self.snapshot())
    }

    async fn save(&self, cache: &EmbeddingCache) -> Result<()> {
        *self.snapshot.write().unwrap() = Some(cache.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists(&self) -> bool {
        self.snapshot.read().unwrap().is_some()
    }

    async fn clear(&self) -> Result<bool> {
        Ok(self.snapshot.write().unwrap().take().is_some())
    }
}
