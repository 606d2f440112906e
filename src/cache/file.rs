//! Single-file JSON [`CacheStore`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::CacheStore;
use crate::error::{RagError, Result};
use crate::models::EmbeddingCache;

/// Stores the snapshot as JSON at a fixed path.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "embeddings_cache.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(&self, action: &str, e: impl std::fmt::Display) -> RagError {
        RagError::Cache(format!("{} {}: {}", action, self.path.display(), e))
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn load(&self) -> Result<Option<EmbeddingCache>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err("failed to read", e)),
        };

        let cache: EmbeddingCache =
            serde_json::from_slice(&bytes).map_err(|e| self.io_err("failed to parse", e))?;
        Ok(Some(cache))
    }

    async fn save(&self, cache: &EmbeddingCache) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_err("failed to create directory for", e))?;
        }

        let bytes = serde_json::to_vec(cache).map_err(|e| self.io_err("failed to serialize", e))?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| self.io_err("failed to write", e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_err("failed to replace", e))?;
        Ok(())
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    async fn clear(&self) -> Result<bool> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_err("failed to delete", e)),
        }
    }
}
