//! In-memory vector store over the chunked guideline corpus.
//!
//! [`VectorStore`] owns the chunks, their embeddings, and an initialized
//! flag. On first use it adopts a persisted snapshot from its
//! [`CacheStore`] when the snapshot's version matches [`CACHE_VERSION`];
//! otherwise it chunks the corpus, embeds every chunk, and persists the
//! result. Search is a brute-force cosine scan.
//!
//! # Failure policy
//!
//! - Initialisation errors (unreadable corpus, zero chunks, embedding
//!   failure, count mismatch) propagate to the caller.
//! - A cache that cannot be read, is stale, or is malformed is treated as a
//!   miss and rebuilt.
//! - A cache that cannot be written is logged and ignored.
//!
//! # Concurrency
//!
//! State sits behind a `tokio::sync::RwLock`. `initialize` takes the write
//! lock and re-checks the flag, so concurrent cold callers embed the corpus
//! once. Searches embed the query unlocked and share the read lock only
//! while ranking, so a slow embedding call never stalls `get_stats` or
//! `clear_cache`.
//!
//! Construct one store per process at the composition root and hand out
//! `Arc<VectorStore>` to whatever needs it.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStore, FileCache, CACHE_VERSION};
use crate::chunk::chunk_corpus;
use crate::config::{ChunkingConfig, Config};
use crate::corpus::Corpus;
use crate::embedding::{rank_by_similarity, EmbeddingClient};
use crate::error::{RagError, Result};
use crate::models::{Chunk, EmbeddingCache, RagStatus, SearchResult, StoreStats};

const DEFAULT_SLOW_SEARCH: Duration = Duration::from_millis(2000);

#[derive(Default)]
struct StoreState {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    initialized: bool,
}

/// Chunk/embedding pairs plus the machinery to build and persist them.
pub struct VectorStore {
    corpus: Corpus,
    chunking: ChunkingConfig,
    embedder: EmbeddingClient,
    cache: Arc<dyn CacheStore>,
    slow_search: Duration,
    state: RwLock<StoreState>,
}

impl VectorStore {
    pub fn new(corpus: Corpus, embedder: EmbeddingClient, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            corpus,
            chunking: ChunkingConfig::default(),
            embedder,
            cache,
            slow_search: DEFAULT_SLOW_SEARCH,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Searches slower than `threshold` are logged as warnings.
    pub fn with_slow_search_threshold(mut self, threshold: Duration) -> Self {
        self.slow_search = threshold;
        self
    }

    /// Wire up a file-backed store from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = EmbeddingClient::from_config(&config.embedding)?;
        let cache = Arc::new(FileCache::new(config.cache.path.clone()));
        Ok(
            Self::new(Corpus::File(config.corpus.path.clone()), embedder, cache)
                .with_chunking(config.chunking)
                .with_slow_search_threshold(Duration::from_millis(
                    config.retrieval.slow_search_ms,
                )),
        )
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.initialized
    }

    /// Load or build the embedded corpus. No-op once initialized.
    pub async fn initialize(&self) -> Result<()> {
        if self.state.read().await.initialized {
            return Ok(());
        }

        let mut state = self.state.write().await;
        if state.initialized {
            return Ok(());
        }

        let started = Instant::now();

        if let Some(snapshot) = self.load_snapshot().await {
            info!(
                chunks = snapshot.chunks.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "vector store initialized from cache"
            );
            state.chunks = snapshot.chunks;
            state.embeddings = snapshot.embeddings;
            state.initialized = true;
            return Ok(());
        }

        info!(model = self.embedder.model_name(), "generating embeddings for guideline corpus");
        let docs = self.corpus.load()?;
        let chunks = chunk_corpus(&docs, &self.chunking);
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        ensure_aligned(&chunks, &embeddings)?;

        let snapshot = EmbeddingCache {
            chunks,
            embeddings,
            version: CACHE_VERSION.to_string(),
            created_at: Utc::now(),
        };
        match self.cache.save(&snapshot).await {
            Ok(()) => info!(chunks = snapshot.chunks.len(), "saved embedding cache"),
            Err(e) => warn!(error = %e, "failed to persist embedding cache"),
        }

        state.chunks = snapshot.chunks;
        state.embeddings = snapshot.embeddings;
        state.initialized = true;
        info!(
            chunks = state.chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vector store initialized"
        );
        Ok(())
    }

    /// Return a usable snapshot from the cache, or `None` to rebuild.
    async fn load_snapshot(&self) -> Option<EmbeddingCache> {
        let snapshot = match self.cache.load().await {
            Ok(Some(s)) => s,
            Ok(None) => {
                debug!("no embedding cache present");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "failed to load embedding cache, will regenerate");
                return None;
            }
        };

        if snapshot.version != CACHE_VERSION {
            info!(
                found = %snapshot.version,
                expected = CACHE_VERSION,
                "cache version mismatch, will regenerate"
            );
            return None;
        }

        let dims = snapshot.embeddings.first().map(Vec::len).unwrap_or(0);
        if snapshot.chunks.is_empty()
            || snapshot.chunks.len() != snapshot.embeddings.len()
            || dims == 0
            || snapshot.embeddings.iter().any(|e| e.len() != dims)
        {
            warn!(
                chunks = snapshot.chunks.len(),
                embeddings = snapshot.embeddings.len(),
                "embedding cache is malformed, will regenerate"
            );
            return None;
        }

        Some(snapshot)
    }

    /// Rank every stored chunk against `query` and return the best `top_k`.
    ///
    /// Initializes the store first if needed. The query is embedded without
    /// holding the state lock; if the store is cleared meanwhile it is
    /// rebuilt once before ranking.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.initialize().await?;

        let started = Instant::now();
        let query_vec = self.embedder.embed_one(query).await?;

        let results = match self.rank(&query_vec, top_k).await {
            Err(RagError::NotInitialized) => {
                debug!("store cleared during search, reinitializing");
                self.initialize().await?;
                self.rank(&query_vec, top_k).await?
            }
            other => other?,
        };

        let elapsed = started.elapsed();
        if elapsed > self.slow_search {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = self.slow_search.as_millis() as u64,
                "slow guideline search"
            );
        }
        debug!(results = results.len(), top_k, "guideline search complete");

        Ok(results)
    }

    async fn rank(&self, query_vec: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let state = self.state.read().await;
        if !state.initialized || state.chunks.is_empty() || state.embeddings.is_empty() {
            return Err(RagError::NotInitialized);
        }

        let dims = state.embeddings[0].len();
        if query_vec.len() != dims {
            return Err(RagError::DimensionMismatch {
                expected: dims,
                actual: query_vec.len(),
            });
        }

        Ok(rank_by_similarity(query_vec, &state.embeddings, top_k)
            .into_iter()
            .map(|(index, score)| SearchResult {
                chunk: state.chunks[index].clone(),
                score,
            })
            .collect())
    }

    /// Counts and cache presence. Does not initialize.
    pub async fn get_stats(&self) -> StoreStats {
        let (chunk_count, embedding_dimensions) = {
            let state = self.state.read().await;
            (
                state.chunks.len(),
                state.embeddings.first().map(Vec::len).unwrap_or(0),
            )
        };
        StoreStats {
            chunk_count,
            embedding_dimensions,
            cache_exists: self.cache.exists().await,
        }
    }

    /// Try to initialize, then report whether that worked along with stats.
    pub async fn status(&self) -> RagStatus {
        let initialized = match self.initialize().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "guideline store failed to initialize");
                false
            }
        };
        RagStatus {
            initialized,
            stats: self.get_stats().await,
        }
    }

    /// Delete the persisted cache and drop the in-memory corpus, so the next
    /// `initialize` or `search` rebuilds from the documents.
    ///
    /// Returns whether an artifact was removed. Deletion errors are logged.
    pub async fn clear_cache(&self) -> bool {
        let mut state = self.state.write().await;
        *state = StoreState::default();

        match self.cache.clear().await {
            Ok(removed) => {
                if removed {
                    info!("embedding cache cleared");
                }
                removed
            }
            Err(e) => {
                warn!(error = %e, "failed to clear embedding cache");
                false
            }
        }
    }

    /// Clear the cache and re-embed the corpus.
    pub async fn rebuild(&self) -> Result<()> {
        self.clear_cache().await;
        self.initialize().await
    }
}

/// `embeddings[i]` must exist for every `chunks[i]` and nothing more.
fn ensure_aligned(chunks: &[Chunk], embeddings: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != embeddings.len() {
        return Err(RagError::Consistency {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }
    Ok(())
}
