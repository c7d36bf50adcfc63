//! Nearest-neighbor retrieval.
//!
//! The underlying index may be approximate, so a result set is "a nearest-k with high
//! recall", not a guaranteed exact top-k. Ordering within what the index returns is exact:
//! ascending cosine distance, ties by ascending id.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::SearchConfig;
use super::filters::SearchFilters;
use super::models::Candidate;
use crate::core::error::{FolioError, Result};
use crate::db::catalog::{Book, Catalog};
use crate::db::store::{EmbeddingStore, EntityType, Neighbor};


pub struct SimilarityRetriever {
    store: Arc<EmbeddingStore>,
    catalog: Arc<dyn Catalog>,
    config: SearchConfig,
}

impl SimilarityRetriever {
    pub fn new(store: Arc<EmbeddingStore>, catalog: Arc<dyn Catalog>, config: SearchConfig) -> Self {
        Self { store, catalog, config }
    }

    async fn nearest(&self, vector: &[f32], fetch: usize) -> Result<Vec<Neighbor>> {
        self.store
            .search(EntityType::Book, vector, fetch)
            .await
            .map_err(|e| match e {
                FolioError::RetrievalUnavailable(_) | FolioError::DimensionMismatch { .. } => e,
                other => FolioError::unavailable(other.to_string()),
            })
    }

    /// Up to `k` candidates nearest to `vector`, never including `exclude_id`.
    ///
    /// With non-empty `filters`, candidates whose catalog row fails them (or has no row) are
    /// dropped before truncating to `k`, and the fetch widens until `k` survive or the index
    /// is exhausted.
    pub async fn retrieve(
        &self,
        vector: &[f32],
        k: usize,
        exclude_id: Option<i64>,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<Candidate>> {
        let filters = filters.filter(|f| !f.is_empty());
        let mut fetch = self.config.fetch_size(k);

        loop {
            let raw = self.nearest(vector, fetch).await?;
            let exhausted = raw.len() < fetch;
            let neighbors: Vec<Neighbor> = raw
                .into_iter()
                .filter(|n| Some(n.entity_id) != exclude_id)
                .collect();

            let Some(filters) = filters else {
                let candidates = self.with_metadata(neighbors.into_iter().take(k).collect()).await;
                info!("Vector search: {} candidates (fetched {}, k={})", candidates.len(), fetch, k);
                return Ok(candidates);
            };

            let candidates: Vec<Candidate> = self
                .with_metadata(neighbors)
                .await
                .into_iter()
                .filter(|c| c.metadata.as_ref().is_some_and(|book| filters.matches(book)))
                .take(k)
                .collect();

            if candidates.len() >= k || exhausted {
                info!(
                    "Filtered vector search: {} candidates (fetched {}, k={})",
                    candidates.len(),
                    fetch,
                    k
                );
                return Ok(candidates);
            }
            debug!("Filters kept {} of k={} after fetching {}; widening", candidates.len(), k, fetch);
            fetch = fetch.saturating_mul(2);
        }
    }

    async fn with_metadata(&self, neighbors: Vec<Neighbor>) -> Vec<Candidate> {
        let ids: Vec<i64> = neighbors.iter().map(|n| n.entity_id).collect();
        let mut metadata = self.join_metadata(&ids).await;
        neighbors
            .into_iter()
            .map(|n| Candidate {
                entity_id: n.entity_id,
                distance: n.distance,
                metadata: metadata.remove(&n.entity_id),
            })
            .collect()
    }

    /// A failed or partial catalog join degrades the affected results instead of failing.
    async fn join_metadata(&self, ids: &[i64]) -> HashMap<i64, Book> {
        if ids.is_empty() {
            return HashMap::new();
        }
        match self.catalog.get_books(ids).await {
            Ok(found) => {
                if found.len() < ids.len() {
                    warn!(
                        "Catalog metadata missing for {} of {} candidates",
                        ids.len() - found.len(),
                        ids.len()
                    );
                }
                found
            }
            Err(e) => {
                warn!("Catalog metadata join failed: {}", e);
                HashMap::new()
            }
        }
    }
}
