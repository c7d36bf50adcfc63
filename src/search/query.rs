

use std::sync::Arc;

use futures::future::try_join;
use tracing::debug;

use super::fusion::{FusionWeights, fuse};
use crate::core::error::{FolioError, Result};
use crate::db::catalog::{Book, Catalog};
use crate::db::store::{EmbeddingStore, EntityType};
use crate::embeddings::TextEmbedder;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource {
    Text,
    Seed,
    Fused,
}


#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub vector: Vec<f32>,
    pub text: Option<String>,
    pub seed: Option<Book>,
    pub source: QuerySource,
    pub weights: FusionWeights,
}

/// Trimmed text, or `None` when nothing is left.
pub fn normalize_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}


pub struct QueryVectorBuilder {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<EmbeddingStore>,
    catalog: Arc<dyn Catalog>,
}

impl QueryVectorBuilder {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<EmbeddingStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Self {
        Self { embedder, store, catalog }
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed_query(text).await?;
        if vector.len() != self.store.dimensions() {
            return Err(FolioError::DimensionMismatch {
                expected: self.store.dimensions(),
                got: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Catalog first, then the embedding: "no such book" and "not indexed yet" stay apart.
    pub async fn fetch_seed(&self, seed_id: i64) -> Result<(Book, Vec<f32>)> {
        let book = self
            .catalog
            .get_book(seed_id)
            .await?
            .ok_or(FolioError::UnknownSeed(seed_id))?;

        let vector = self
            .store
            .get(EntityType::Book, seed_id)
            .await?
            .ok_or(FolioError::SeedNotFound(seed_id))?;

        Ok((book, vector))
    }

    pub async fn build(
        &self,
        text: Option<&str>,
        seed_id: Option<i64>,
        weights: FusionWeights,
    ) -> Result<BuiltQuery> {
        let text = normalize_text(text);

        match (text, seed_id) {
            (None, None) => Err(FolioError::invalid_query(
                "provide a non-empty text prompt, a seed book id, or both",
            )),
            (Some(text), None) => {
                debug!("Building text query: {}", crate::safe_truncate(&text, 50));
                let vector = self.embed_text(&text).await?;
                Ok(BuiltQuery {
                    vector,
                    text: Some(text),
                    seed: None,
                    source: QuerySource::Text,
                    weights: FusionWeights::new(1.0, 0.0)?,
                })
            }
            (None, Some(seed_id)) => {
                debug!("Building seed query for book {}", seed_id);
                let (book, vector) = self.fetch_seed(seed_id).await?;
                Ok(BuiltQuery {
                    vector,
                    text: None,
                    seed: Some(book),
                    source: QuerySource::Seed,
                    weights: FusionWeights::new(0.0, 1.0)?,
                })
            }
            (Some(text), Some(seed_id)) => {
                debug!(
                    "Building fused query: text={}, seed={}, w_text={}, w_seed={}",
                    crate::safe_truncate(&text, 50),
                    seed_id,
                    weights.w_text(),
                    weights.w_seed()
                );
                let (v_text, (book, v_seed)) =
                    try_join(self.embed_text(&text), self.fetch_seed(seed_id)).await?;
                let vector = fuse(&v_text, &v_seed, weights)?;
                Ok(BuiltQuery {
                    vector,
                    text: Some(text),
                    seed: Some(book),
                    source: QuerySource::Fused,
                    weights,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine_similarity;
    use crate::db::catalog::InMemoryCatalog;
    use crate::embeddings::HashingEmbedder;

    const DIMS: usize = 64;

    async fn builder() -> QueryVectorBuilder {
        let embedder = Arc::new(HashingEmbedder::new(DIMS));
        let store = Arc::new(EmbeddingStore::in_memory(DIMS));
        let catalog = InMemoryCatalog::from_books([
            Book { id: 1, title: "Indexed".to_string(), ..Default::default() },
            Book { id: 2, title: "Not yet indexed".to_string(), ..Default::default() },
        ]);
        let seed_vector = embedder.embed_sync("lighthouse keeper storm").unwrap();
        store.upsert(EntityType::Book, 1, seed_vector).await.unwrap();
        QueryVectorBuilder::new(embedder, store, Arc::new(catalog))
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("  war  ")), Some("war".to_string()));
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(None), None);
    }

    #[tokio::test]
    async fn test_no_inputs_is_invalid() {
        let b = builder().await;
        let err = b.build(None, None, FusionWeights::default()).await.unwrap_err();
        assert!(matches!(err, FolioError::InvalidQuery(_)));

        let err = b.build(Some("  "), None, FusionWeights::default()).await.unwrap_err();
        assert!(matches!(err, FolioError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_seed_errors_are_distinct() {
        let b = builder().await;
        assert!(matches!(
            b.build(None, Some(99), FusionWeights::default()).await,
            Err(FolioError::UnknownSeed(99))
        ));
        assert!(matches!(
            b.build(None, Some(2), FusionWeights::default()).await,
            Err(FolioError::SeedNotFound(2))
        ));
    }

    #[tokio::test]
    async fn test_text_and_seed_sources() {
        let b = builder().await;

        let text = b.build(Some(" desert planet "), None, FusionWeights::default()).await.unwrap();
        assert_eq!(text.source, QuerySource::Text);
        assert_eq!(text.text.as_deref(), Some("desert planet"));

        let seed = b.build(None, Some(1), FusionWeights::default()).await.unwrap();
        assert_eq!(seed.source, QuerySource::Seed);
        assert_eq!(seed.seed.map(|s| s.id), Some(1));
    }

    #[tokio::test]
    async fn test_fused_query_sits_between_inputs() {
        let b = builder().await;
        let text_only = b.build(Some("desert planet"), None, FusionWeights::default()).await.unwrap();
        let seed_only = b.build(None, Some(1), FusionWeights::default()).await.unwrap();
        let fused = b.build(Some("desert planet"), Some(1), FusionWeights::default()).await.unwrap();

        assert_eq!(fused.source, QuerySource::Fused);
        let to_text = cosine_similarity(&fused.vector, &text_only.vector);
        let to_seed = cosine_similarity(&fused.vector, &seed_only.vector);
        assert!((to_text - to_seed).abs() < 1e-5);
        assert!(to_text < 0.999);
    }

    #[tokio::test]
    async fn test_fused_query_reports_unknown_seed() {
        let b = builder().await;
        assert!(matches!(
            b.build(Some("desert planet"), Some(99), FusionWeights::default()).await,
            Err(FolioError::UnknownSeed(99))
        ));
    }
}
