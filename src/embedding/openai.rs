//! OpenAI-compatible hosted embedding provider.
//!
//! Sends `POST {base_url}/embeddings` with `{"model", "input"}` and a bearer
//! token from `OPENAI_API_KEY`. A missing key is reported when an embedding
//! is requested, not when the provider is built.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::EmbeddingProvider;
use crate::config::{EmbeddingConfig, API_KEY_ENV};
use crate::error::{RagError, Result};

/// Embedding provider backed by the OpenAI embeddings API.
pub struct OpenAIProvider {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

impl OpenAIProvider {
    pub fn new(
        model: impl Into<String>,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            model: model.into(),
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Build from config, taking the key from `OPENAI_API_KEY` and the model
    /// from [`EmbeddingConfig::resolved_model`].
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.resolved_model(),
            &config.base_url,
            std::env::var(API_KEY_ENV).ok(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RagError::Configuration(format!("{} is not configured", API_KEY_ENV)))?;

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "OpenAI API error {}: {}",
                status, body_text
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        into_vectors(parsed)
    }
}

/// Put items back in request order and unwrap their vectors.
fn into_vectors(mut response: EmbeddingResponse) -> Result<Vec<Vec<f32>>> {
    if response.data.iter().all(|item| item.index.is_some()) {
        response.data.sort_by_key(|item| item.index);
    }

    response
        .data
        .into_iter()
        .map(|item| {
            item.embedding
                .filter(|v| !v.is_empty())
                .ok_or_else(|| RagError::Embedding("missing embedding in response".to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<Vec<Vec<f32>>> {
        into_vectors(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn test_items_reordered_by_index() {
        let out = parse(serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        }))
        .unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_items_without_index_keep_order() {
        let out = parse(serde_json::json!({
            "data": [{"embedding": [2.0]}, {"embedding": [3.0]}]
        }))
        .unwrap();
        assert_eq!(out, vec![vec![2.0], vec![3.0]]);
    }

    #[test]
    fn test_missing_embedding_is_error() {
        let err = parse(serde_json::json!({
            "data": [{"index": 0, "embedding": [1.0]}, {"index": 1}]
        }))
        .unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let provider = OpenAIProvider::new(
            "text-embedding-3-small",
            "http://127.0.0.1:9",
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        let err = provider.embed(&["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let provider =
            OpenAIProvider::new("m", "https://api.example/v1/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.endpoint, "https://api.example/v1/embeddings");
    }
}
