//! Text embedding capability.
//!
//! The engine only ever sees [`TextEmbedder`]; concrete backends (a remote model server or
//! the local feature-hashing embedder) are interchangeable behind it.

pub mod cached;
pub mod hashing;
pub mod provider;
pub mod text;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::FolioConfig;

pub use cached::CachedEmbedder;
pub use hashing::HashingEmbedder;
pub use provider::HttpEmbedder;
pub use text::{book_document_text, document_text, query_text};


#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),

    #[error("Model returned {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Embedding task failed: {0}")]
    Task(String),
}


#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a search prompt. Applies any query-side instruction the model expects.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed catalog documents, one vector per input, in order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn model(&self) -> &str;

    fn dimensions(&self) -> usize;
}


pub struct EmbedderFactory;

impl EmbedderFactory {
    /// Builds the configured backend, wrapped in the exact-text query cache.
    pub fn from_config(config: &FolioConfig) -> Result<Arc<dyn TextEmbedder>, EmbeddingError> {
        let inner: Arc<dyn TextEmbedder> = match config.embedding_provider.as_str() {
            "hashing" => Arc::new(HashingEmbedder::new(config.embedding_dim)),
            "ollama" | "openai" => Arc::new(HttpEmbedder::from_config(config)?),
            other => return Err(EmbeddingError::NotImplemented(other.to_string())),
        };
        Ok(Arc::new(CachedEmbedder::new(inner, config.cache_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_builds_hashing_embedder() {
        let config = FolioConfig::default();
        let embedder = EmbedderFactory::from_config(&config).unwrap();
        assert_eq!(embedder.dimensions(), 384);
        let v = embedder.embed_query("a quiet village").await.unwrap();
        assert_eq!(v.len(), 384);
    }

    #[test]
    fn test_factory_rejects_unknown_provider() {
        let config = FolioConfig { embedding_provider: "onnx".to_string(), ..Default::default() };
        assert!(matches!(
            EmbedderFactory::from_config(&config),
            Err(EmbeddingError::NotImplemented(_))
        ));
    }
}
