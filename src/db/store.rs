//! Embedding store: one vector per (entity type, entity id), backed by a pluggable
//! nearest-neighbor index.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::core::error::{FolioError, Result};
use crate::cosine_distance;


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityType {
    #[default]
    Book,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub vector: Vec<f32>,
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub entity_id: i64,
    pub distance: f64,
}

/// Ascending distance, then ascending id.
pub fn neighbor_order(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Nearest-neighbor index over cosine distance.
///
/// Implementations may be approximate: `query` promises a high-recall nearest-k, not the
/// exact top-k. Results must be ordered by [`neighbor_order`].
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts or atomically replaces the vector for `id`.
    async fn insert(&self, id: i64, vector: Vec<f32>) -> Result<()>;

    async fn remove(&self, id: i64) -> Result<bool>;

    async fn get(&self, id: i64) -> Result<Option<Vec<f32>>>;

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    async fn ids(&self) -> Result<Vec<i64>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exact brute-force index. Every query scans all vectors, so recall is always 1.
#[derive(Default)]
pub struct FlatIndex {
    vectors: RwLock<HashMap<i64, Arc<[f32]>>>,
}

impl FlatIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn insert(&self, id: i64, vector: Vec<f32>) -> Result<()> {
        let vector: Arc<[f32]> = vector.into();
        self.vectors.write().insert(id, vector);
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<bool> {
        Ok(self.vectors.write().remove(&id).is_some())
    }

    async fn get(&self, id: i64) -> Result<Option<Vec<f32>>> {
        Ok(self.vectors.read().get(&id).map(|v| v.to_vec()))
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let mut neighbors: Vec<Neighbor> = {
            let vectors = self.vectors.read();
            vectors
                .iter()
                .map(|(id, v)| Neighbor {
                    entity_id: *id,
                    distance: cosine_distance(vector, v),
                })
                .collect()
        };
        neighbors.sort_by(neighbor_order);
        neighbors.truncate(k);
        Ok(neighbors)
    }

    async fn ids(&self) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self.vectors.read().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn len(&self) -> usize {
        self.vectors.read().len()
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub model: String,
    pub dimensions: usize,
    pub created_at: DateTime<Utc>,
    pub records: Vec<EmbeddingRecord>,
}


pub struct EmbeddingStore {
    books: Arc<dyn VectorIndex>,
    dimensions: usize,
}

impl EmbeddingStore {
    pub fn new(books: Arc<dyn VectorIndex>, dimensions: usize) -> Self {
        info!("EmbeddingStore initialized: dimensions={}", dimensions);
        Self { books, dimensions }
    }

    pub fn in_memory(dimensions: usize) -> Self {
        Self::new(Arc::new(FlatIndex::new()), dimensions)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn index(&self, entity_type: EntityType) -> &Arc<dyn VectorIndex> {
        match entity_type {
            EntityType::Book => &self.books,
        }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(FolioError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        Ok(())
    }

    /// `None` means the entity has no embedding (yet); callers decide what that means.
    pub async fn get(&self, entity_type: EntityType, entity_id: i64) -> Result<Option<Vec<f32>>> {
        self.index(entity_type).get(entity_id).await
    }

    pub async fn upsert(&self, entity_type: EntityType, entity_id: i64, vector: Vec<f32>) -> Result<()> {
        if entity_id < 1 {
            return Err(FolioError::InvalidRecord(format!(
                "entity_id must be >= 1, got {entity_id}"
            )));
        }
        self.check_dimensions(&vector)?;
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(FolioError::InvalidRecord(format!(
                "{entity_type} {entity_id}: vector contains non-finite values"
            )));
        }

        self.index(entity_type).insert(entity_id, vector).await?;
        debug!("Upserted embedding for {} {}", entity_type, entity_id);
        Ok(())
    }

    pub async fn remove(&self, entity_type: EntityType, entity_id: i64) -> Result<bool> {
        self.index(entity_type).remove(entity_id).await
    }

    /// Nearest neighbors of `vector`, ascending by cosine distance then id. An empty index is
    /// reported as unavailable rather than as "no matches".
    pub async fn search(&self, entity_type: EntityType, vector: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimensions(vector)?;
        let index = self.index(entity_type);
        if index.is_empty() {
            return Err(FolioError::unavailable(format!("{entity_type} index is empty")));
        }
        index.query(vector, k).await
    }

    pub fn len(&self, entity_type: EntityType) -> usize {
        self.index(entity_type).len()
    }

    pub fn is_empty(&self, entity_type: EntityType) -> bool {
        self.index(entity_type).is_empty()
    }

    pub async fn snapshot(&self, model: &str) -> Result<IndexSnapshot> {
        let mut records = Vec::with_capacity(self.books.len());
        for id in self.books.ids().await? {
            if let Some(vector) = self.books.get(id).await? {
                records.push(EmbeddingRecord {
                    entity_type: EntityType::Book,
                    entity_id: id,
                    vector,
                });
            }
        }
        Ok(IndexSnapshot {
            model: model.to_string(),
            dimensions: self.dimensions,
            created_at: Utc::now(),
            records,
        })
    }

    pub async fn restore(&self, snapshot: IndexSnapshot) -> Result<usize> {
        if snapshot.dimensions != self.dimensions {
            return Err(FolioError::DimensionMismatch {
                expected: self.dimensions,
                got: snapshot.dimensions,
            });
        }
        let count = snapshot.records.len();
        for record in snapshot.records {
            self.upsert(record.entity_type, record.entity_id, record.vector).await?;
        }
        info!("Restored {} embeddings (model={})", count, snapshot.model);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> EmbeddingStore {
        EmbeddingStore::in_memory(3)
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let store = store();
        store.upsert(EntityType::Book, 1, vec![1.0, 0.0, 0.0]).await.unwrap();
        store.upsert(EntityType::Book, 1, vec![0.0, 1.0, 0.0]).await.unwrap();

        assert_eq!(store.len(EntityType::Book), 1);
        assert_eq!(
            store.get(EntityType::Book, 1).await.unwrap(),
            Some(vec![0.0, 1.0, 0.0])
        );
    }

    #[tokio::test]
    async fn test_upsert_validates_record() {
        let store = store();
        assert!(matches!(
            store.upsert(EntityType::Book, 1, vec![1.0, 0.0]).await,
            Err(FolioError::DimensionMismatch { expected: 3, got: 2 })
        ));
        assert!(matches!(
            store.upsert(EntityType::Book, 0, vec![1.0, 0.0, 0.0]).await,
            Err(FolioError::InvalidRecord(_))
        ));
        assert!(matches!(
            store.upsert(EntityType::Book, 2, vec![f32::NAN, 0.0, 0.0]).await,
            Err(FolioError::InvalidRecord(_))
        ));
        assert!(store.is_empty(EntityType::Book));
    }

    #[tokio::test]
    async fn test_missing_embedding_is_none() {
        assert!(store().get(EntityType::Book, 42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_orders_by_distance_then_id() {
        let store = store();
        store.upsert(EntityType::Book, 3, vec![1.0, 1.0, 0.0]).await.unwrap();
        store.upsert(EntityType::Book, 2, vec![1.0, 1.0, 0.0]).await.unwrap();
        store.upsert(EntityType::Book, 1, vec![0.0, 0.0, 1.0]).await.unwrap();
        store.upsert(EntityType::Book, 4, vec![1.0, 0.0, 0.0]).await.unwrap();

        let hits = store.search(EntityType::Book, &[1.0, 0.9, 0.0], 10).await.unwrap();
        let ids: Vec<i64> = hits.iter().map(|n| n.entity_id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_search_truncates_to_k() {
        let store = store();
        for id in 1..=5 {
            store.upsert(EntityType::Book, id, vec![id as f32, 1.0, 0.0]).await.unwrap();
        }
        assert_eq!(store.search(EntityType::Book, &[1.0, 0.0, 0.0], 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_index_is_unavailable() {
        let result = store().search(EntityType::Book, &[1.0, 0.0, 0.0], 5).await;
        assert!(matches!(result, Err(FolioError::RetrievalUnavailable(_))));
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let source = store();
        source.upsert(EntityType::Book, 1, vec![1.0, 0.0, 0.0]).await.unwrap();
        source.upsert(EntityType::Book, 2, vec![0.0, 1.0, 0.0]).await.unwrap();
        let snapshot = source.snapshot("feature-hashing").await.unwrap();
        assert_eq!(snapshot.records.len(), 2);

        let target = store();
        assert_eq!(target.restore(snapshot.clone()).await.unwrap(), 2);
        assert_eq!(target.get(EntityType::Book, 2).await.unwrap(), Some(vec![0.0, 1.0, 0.0]));

        let wrong = EmbeddingStore::in_memory(4);
        assert!(wrong.restore(snapshot).await.is_err());
    }

    #[test]
    fn test_entity_type_strings() {
        assert_eq!(EntityType::Book.to_string(), "book");
        assert_eq!("book".parse::<EntityType>().unwrap(), EntityType::Book);
    }
}
