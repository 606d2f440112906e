//! TOML configuration.
//!
//! Every section has defaults, so an empty file is a valid configuration
//! and [`Config::default`] is what the CLI uses when no file exists.
//!
//! ```toml
//! [corpus]
//! path = "data/udl_guidelines.json"
//!
//! [cache]
//! path = "data/embeddings_cache.json"
//!
//! [chunking]
//! min_chars = 500
//! max_chars = 800
//! overlap_chars = 100
//!
//! [embedding]
//! provider = "openai"            # openai | hashing | disabled
//! model = "text-embedding-3-small"
//! batch_size = 64
//!
//! [retrieval]
//! top_k = 3
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default embedding model when neither config nor environment names one.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Environment variable holding the OpenAI credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the embedding model.
pub const MODEL_ENV: &str = "OPENAI_EMBEDDING_MODEL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/udl_guidelines.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/embeddings_cache.json")
}

/// Chunk sizing, in characters.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_overlap_chars")]
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
            overlap_chars: default_overlap_chars(),
        }
    }
}

fn default_min_chars() -> usize {
    500
}
fn default_max_chars() -> usize {
    800
}
fn default_overlap_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Vector width for the `hashing` provider.
    #[serde(default = "default_hashing_dims")]
    pub dims: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: default_base_url(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            dims: default_hashing_dims(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_hashing_dims() -> usize {
    256
}

impl EmbeddingConfig {
    /// Resolve the model name: `OPENAI_EMBEDDING_MODEL`, then config, then
    /// [`DEFAULT_EMBEDDING_MODEL`].
    pub fn resolved_model(&self) -> String {
        resolve_model(std::env::var(MODEL_ENV).ok(), self.model.as_deref())
    }
}

fn resolve_model(env_value: Option<String>, configured: Option<&str>) -> String {
    env_value
        .filter(|m| !m.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string())
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Deadline the CLI applies around a search.
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    /// Searches slower than this are logged as warnings.
    #[serde(default = "default_slow_search_ms")]
    pub slow_search_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            timeout_secs: default_search_timeout_secs(),
            slow_search_ms: default_slow_search_ms(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_search_timeout_secs() -> u64 {
    30
}
fn default_slow_search_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Load `path` if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.min_chars == 0 {
        anyhow::bail!("chunking.min_chars must be > 0");
    }
    if config.chunking.max_chars < config.chunking.min_chars {
        anyhow::bail!(
            "chunking.max_chars ({}) must be >= chunking.min_chars ({})",
            config.chunking.max_chars,
            config.chunking.min_chars
        );
    }

    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "openai" | "disabled" => {}
        "hashing" => {
            if config.embedding.dims == 0 {
                anyhow::bail!("embedding.dims must be > 0 for the hashing provider");
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai, hashing, or disabled.",
            other
        ),
    }

    Ok(())
}
