

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use super::config::SearchConfig;
use super::explain::ExplainContext;
use super::filters::SearchFilters;
use super::fusion::FusionWeights;
use super::models::{ResponseWeights, SearchResponse};
use super::query::{QueryVectorBuilder, normalize_text};
use super::ranking::{assemble, rank_candidates};
use super::retriever::SimilarityRetriever;
use crate::core::config::FolioConfig;
use crate::core::error::{FolioError, Result};
use crate::db::catalog::Catalog;
use crate::db::store::EmbeddingStore;
use crate::embeddings::TextEmbedder;


#[derive(Debug, Clone, Default)]
pub struct RecommendRequest {
    pub text: Option<String>,
    pub seed_book_id: Option<i64>,
    pub k: Option<usize>,
    /// Overrides the engine's default text/seed blend for this request.
    pub weights: Option<FusionWeights>,
    /// Externally supplied secondary (cf) channel scores.
    pub secondary_scores: Option<HashMap<i64, f64>>,
    pub filters: Option<SearchFilters>,
}

impl RecommendRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: Some(text.into()), ..Default::default() }
    }

    pub fn seed(seed_book_id: i64) -> Self {
        Self { seed_book_id: Some(seed_book_id), ..Default::default() }
    }

    pub fn hybrid(text: impl Into<String>, seed_book_id: i64) -> Self {
        Self {
            text: Some(text.into()),
            seed_book_id: Some(seed_book_id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = Some(weights);
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    #[must_use]
    pub fn with_secondary_scores(mut self, scores: HashMap<i64, f64>) -> Self {
        self.secondary_scores = Some(scores);
        self
    }
}

/// Entry point for the three request shapes. Stateless per request; safe to share.
pub struct RecommendationEngine {
    builder: QueryVectorBuilder,
    retriever: SimilarityRetriever,
    config: SearchConfig,
    default_weights: FusionWeights,
}

impl RecommendationEngine {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<EmbeddingStore>,
        catalog: Arc<dyn Catalog>,
        config: SearchConfig,
        default_weights: FusionWeights,
    ) -> Self {
        info!(
            "RecommendationEngine initialized: model={}, default_k={}, buffer={}, cf_weight={}, timeout={:?}",
            embedder.model(),
            config.default_k,
            config.candidate_buffer,
            config.cf_weight,
            config.request_timeout
        );
        Self {
            builder: QueryVectorBuilder::new(embedder, store.clone(), catalog.clone()),
            retriever: SimilarityRetriever::new(store, catalog, config.clone()),
            config,
            default_weights,
        }
    }

    pub fn from_config(
        config: &FolioConfig,
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<EmbeddingStore>,
        catalog: Arc<dyn Catalog>,
    ) -> Result<Self> {
        Ok(Self::new(
            embedder,
            store,
            catalog,
            config.search_config(),
            config.fusion_weights()?,
        ))
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Free-text search. Blank text is rejected rather than answered with nothing.
    pub async fn search_semantic(&self, text: &str, k: Option<usize>) -> Result<SearchResponse> {
        if normalize_text(Some(text)).is_none() {
            return Err(FolioError::invalid_query("search text is required"));
        }
        self.recommend(RecommendRequest {
            text: Some(text.to_string()),
            k,
            ..Default::default()
        })
        .await
    }

    /// Books near `book_id`, never including `book_id` itself.
    pub async fn similar(&self, book_id: i64, k: Option<usize>) -> Result<SearchResponse> {
        self.recommend(RecommendRequest {
            seed_book_id: Some(book_id),
            k,
            ..Default::default()
        })
        .await
    }

    pub async fn recommend(&self, request: RecommendRequest) -> Result<SearchResponse> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let timeout = self.config.request_timeout;

        let outcome = match tokio::time::timeout(timeout, self.execute(&request)).await {
            Ok(result) => result,
            Err(_) => Err(FolioError::Timeout(timeout.as_secs().max(1))),
        };

        match &outcome {
            Ok(response) => info!(
                "Request {} done: {} results in {:?} (text={}, seed={:?})",
                request_id,
                response.results.len(),
                started.elapsed(),
                request.text.is_some(),
                request.seed_book_id
            ),
            Err(e) => warn!(
                "Request {} failed after {:?}: [{}] {}",
                request_id,
                started.elapsed(),
                e.kind(),
                e
            ),
        }
        outcome
    }

    async fn execute(&self, request: &RecommendRequest) -> Result<SearchResponse> {
        let k = self.config.clamp_k(request.k);
        let weights = request.weights.unwrap_or(self.default_weights);

        let query = self
            .builder
            .build(request.text.as_deref(), request.seed_book_id, weights)
            .await?;

        let exclude_id = query.seed.as_ref().map(|b| b.id);
        let candidates = self
            .retriever
            .retrieve(&query.vector, k, exclude_id, request.filters.as_ref())
            .await?;

        let ranked = rank_candidates(
            candidates,
            request.secondary_scores.as_ref(),
            self.config.cf_weight,
            k,
        );
        let ctx = ExplainContext::new(query.text.as_deref(), query.seed.clone());
        let results = assemble(ranked, &ctx);

        Ok(SearchResponse {
            query: query.text,
            seed_book_id: exclude_id,
            k: Some(k),
            weights: Some(ResponseWeights {
                text: query.weights.w_text(),
                seed: query.weights.w_seed(),
                cf: self.config.cf_weight,
            }),
            results,
        })
    }
}
