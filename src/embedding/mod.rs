//! Embedding provider abstraction, batching client, and vector utilities.
//!
//! Defines the [`EmbeddingProvider`] trait and concrete implementations:
//! - **[`OpenAIProvider`]**: calls a hosted OpenAI-compatible `/embeddings` endpoint.
//! - **[`HashingProvider`]**: deterministic feature-hashed bag of words; no network.
//! - **[`DisabledProvider`]**: always fails with a configuration error.
//!
//! [`EmbeddingClient`] wraps a provider and adds the batching and response
//! validation every caller relies on: inputs are split into fixed-size
//! batches sent one at a time, results come back in input order, and a
//! missing or short response is an error rather than a silently dropped
//! vector. There is no retry at this layer.
//!
//! Also provides the similarity primitives used by the vector store:
//! - [`cosine_similarity`]: similarity between two vectors, `0.0` when either is zero
//! - [`rank_by_similarity`]: stable top-K over a slice of vectors
//!
//! # Provider Selection
//!
//! ```rust
//! # use udl_rag::config::EmbeddingConfig;
//! # use udl_rag::embedding::create_provider;
//! let config = EmbeddingConfig {
//!     provider: "disabled".to_string(),
//!     ..EmbeddingConfig::default()
//! };
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.model_name(), "disabled");
//! ```

mod openai;

pub use openai::OpenAIProvider;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::EmbeddingConfig;
use crate::error::{RagError, Result};

/// A backend that turns text into vectors.
///
/// One call to [`embed`](EmbeddingProvider::embed) is one request to the
/// backend. Batching policy lives in [`EmbeddingClient`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    /// Embed `texts` in a single request, returning one vector per input in
    /// input order. An empty vector marks an item the backend returned no
    /// embedding for.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Batching front-end over an [`EmbeddingProvider`].
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl EmbeddingClient {
    /// Wrap `provider`, sending at most `batch_size` texts per request.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            provider,
            batch_size: batch_size.max(1),
        }
    }

    /// Build the provider named in `config` and wrap it.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self::new(create_provider(config)?, config.batch_size))
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.provider.embed(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RagError::Embedding("no embedding returned".to_string()))
    }

    /// Embed many texts, one request per batch, batches awaited in order.
    ///
    /// The result has exactly one vector per input, aligned by index.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            info!(
                batch = i + 1,
                of = total_batches,
                size = batch.len(),
                "generating embeddings"
            );

            let vectors = self.provider.embed(batch).await?;
            if vectors.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "batch {} returned {} embeddings for {} inputs",
                    i + 1,
                    vectors.len(),
                    batch.len()
                )));
            }
            if vectors.iter().any(|v| v.is_empty()) {
                return Err(RagError::Embedding(
                    "missing embedding in batch response".to_string(),
                ));
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }
}

// ============ Disabled Provider ============

/// Provider used when `embedding.provider = "disabled"`.
pub struct DisabledProvider;

#[async_trait]
impl EmbeddingProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RagError::Configuration(
            "embedding provider is disabled".to_string(),
        ))
    }
}

// ============ Hashing Provider ============

/// Offline provider: each lowercase word of three or more characters is
/// hashed (FNV-1a) into one of `dims` buckets, and the counts are
/// L2-normalised.
///
/// Texts sharing vocabulary score high under cosine similarity. Useful for
/// development and tests; it carries no semantic knowledge.
pub struct HashingProvider {
    dims: usize,
}

impl HashingProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 3)
        {
            let bucket = (fnv1a(&word.to_lowercase()) % self.dims as u64) as usize;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn model_name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Create the provider named by `config.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"openai"` | [`OpenAIProvider`] |
/// | `"hashing"` | [`HashingProvider`] |
/// | `"disabled"` | [`DisabledProvider`] |
pub fn create_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIProvider::from_config(config)?)),
        "hashing" => Ok(Arc::new(HashingProvider::new(config.dims))),
        "disabled" => Ok(Arc::new(DisabledProvider)),
        other => Err(RagError::Configuration(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal, or either vector has zero norm
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors or vectors of different lengths.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Score every vector against `query` and return the best `top_k` as
/// `(index, score)` pairs, highest score first.
///
/// This is a brute-force O(N·D) scan. Equal scores keep corpus order
/// (the sort is stable).
pub fn rank_by_similarity(query: &[f32], vectors: &[Vec<f32>], top_k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine_similarity(query, v)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records batch sizes; returns `[index, len]` per text so order is checkable.
    struct RecordingProvider {
        calls: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
        next_index: AtomicUsize,
    }

    impl RecordingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                batch_sizes: Mutex::new(Vec::new()),
                next_index: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        fn model_name(&self) -> &str {
            "recording"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            Ok(texts
                .iter()
                .map(|t| {
                    let i = self.next_index.fetch_add(1, Ordering::SeqCst);
                    vec![i as f32, t.len() as f32]
                })
                .collect())
        }
    }

    /// Returns a fixed response regardless of input.
    struct FixedProvider(Vec<Vec<f32>>);

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(self.0.clone())
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text number {}", i)).collect()
    }

    #[tokio::test]
    async fn test_embed_batch_splits_into_fixed_batches() {
        let provider = Arc::new(RecordingProvider::new());
        let client = EmbeddingClient::new(provider.clone(), 64);

        let out = client.embed_batch(&texts(150)).await.unwrap();

        assert_eq!(out.len(), 150);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*provider.batch_sizes.lock().unwrap(), vec![64, 64, 22]);
        for (i, v) in out.iter().enumerate() {
            assert_eq!(v[0], i as f32, "output order must match input order");
        }
    }

    #[tokio::test]
    async fn test_embed_batch_empty_input_makes_no_calls() {
        let provider = Arc::new(RecordingProvider::new());
        let client = EmbeddingClient::new(provider.clone(), 64);
        assert!(client.embed_batch(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embed_batch_short_response_is_error() {
        let client = EmbeddingClient::new(Arc::new(FixedProvider(vec![vec![1.0]])), 64);
        let err = client.embed_batch(&texts(2)).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_embed_batch_missing_item_is_error() {
        let client = EmbeddingClient::new(
            Arc::new(FixedProvider(vec![vec![1.0], Vec::new()])),
            64,
        );
        let err = client.embed_batch(&texts(2)).await.unwrap_err();
        assert!(err.to_string().contains("missing embedding"));
    }

    #[tokio::test]
    async fn test_embed_one_no_vector_is_error() {
        let client = EmbeddingClient::new(Arc::new(FixedProvider(Vec::new())), 64);
        assert!(matches!(
            client.embed_one("query").await,
            Err(RagError::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_disabled_provider_is_configuration_error() {
        let client = EmbeddingClient::new(Arc::new(DisabledProvider), 64);
        assert!(matches!(
            client.embed_one("query").await,
            Err(RagError::Configuration(_))
        ));
        assert!(matches!(
            client.embed_batch(&texts(3)).await,
            Err(RagError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_hashing_provider_shared_vocabulary_scores_higher() {
        let p = HashingProvider::new(256);
        let v = p
            .embed(&[
                "student engagement and motivation".to_string(),
                "motivation and engagement of every student".to_string(),
                "visual display of information".to_string(),
            ])
            .await
            .unwrap();
        assert_eq!(v[0].len(), 256);
        assert!(cosine_similarity(&v[0], &v[1]) > cosine_similarity(&v[0], &v[2]));
        assert!((cosine_similarity(&v[0], &v[0]) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_hashing_provider_deterministic() {
        let p = HashingProvider::new(64);
        let a = p.embed(&["same text".to_string()]).await.unwrap();
        let b = p.embed(&["same text".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_create_provider_by_name() {
        let mut config = EmbeddingConfig {
            provider: "hashing".to_string(),
            dims: 16,
            ..EmbeddingConfig::default()
        };
        assert_eq!(create_provider(&config).unwrap().model_name(), "hashing");
        config.provider = "nope".to_string();
        assert!(matches!(
            create_provider(&config),
            Err(RagError::Configuration(_))
        ));
    }

    #[test]
    fn test_cosine_identical() {
        let v = vec![0.3, -1.2, 2.5, 4.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_opposite() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &a), 0.0);
    }

    #[test]
    fn test_cosine_tiny_but_nonzero() {
        let a = vec![1e-5, 0.0];
        let b = vec![2e-5, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_bounds() {
        let vs = [
            vec![1.0, 2.0, 3.0],
            vec![-4.0, 0.5, 9.0],
            vec![100.0, -100.0, 0.001],
            vec![-1.0, -2.0, -3.0],
        ];
        for a in &vs {
            for b in &vs {
                let s = cosine_similarity(a, b);
                assert!((-1.0..=1.0).contains(&s), "out of range: {}", s);
            }
        }
    }

    #[test]
    fn test_cosine_different_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_descending_and_truncated() {
        let vectors = vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![-1.0, 0.0],
        ];
        let ranked = rank_by_similarity(&[1.0, 0.0], &vectors, 3);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_rank_ties_keep_corpus_order() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let ranked = rank_by_similarity(&[1.0, 0.0], &vectors, 4);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_rank_k_larger_than_corpus() {
        let vectors = vec![vec![1.0], vec![2.0]];
        assert_eq!(rank_by_similarity(&[1.0], &vectors, 10).len(), 2);
        assert!(rank_by_similarity(&[1.0], &vectors, 0).is_empty());
    }
}
