

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{EmbeddingError, TextEmbedder};
use crate::core::cache::{CacheStats, EmbeddingCache};

/// Wraps another embedder with the exact-text query cache.
///
/// Only query embeddings are cached; document batches always go to the model so a
/// re-embedding job sees fresh vectors.
pub struct CachedEmbedder {
    inner: Arc<dyn TextEmbedder>,
    cache: EmbeddingCache,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn TextEmbedder>, capacity: usize) -> Self {
        info!(
            "Query embedding cache enabled: model={}, capacity={}",
            inner.model(),
            capacity
        );
        Self {
            inner,
            cache: EmbeddingCache::new(capacity),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[async_trait]
impl TextEmbedder for CachedEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = EmbeddingCache::make_key(self.inner.model(), text);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache HIT for: {}...", crate::safe_truncate(text, 50));
            return Ok(cached);
        }

        let embedding = self.inner.embed_query(text).await?;
        self.cache.set(key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.inner.embed_documents(texts).await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let embedder = CachedEmbedder::new(Arc::new(HashingEmbedder::new(64)), 8);

        let first = embedder.embed_query("lighthouse keepers").await.unwrap();
        let second = embedder.embed_query("lighthouse keepers").await.unwrap();
        assert_eq!(first, second);

        let stats = embedder.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let embedder = CachedEmbedder::new(Arc::new(HashingEmbedder::new(64)), 8);
        assert!(embedder.embed_query("").await.is_err());
        assert_eq!(embedder.stats().size, 0);
    }

    #[tokio::test]
    async fn test_documents_bypass_cache() {
        let embedder = CachedEmbedder::new(Arc::new(HashingEmbedder::new(64)), 8);
        let docs = vec!["a story".to_string()];
        embedder.embed_documents(&docs).await.unwrap();
        assert_eq!(embedder.stats().size, 0);
    }
}
