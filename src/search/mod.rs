//! Query construction, fusion, retrieval, and ranking.
//!
//! request → [`QueryVectorBuilder`] → [`fuse`] (text + seed only) → [`SimilarityRetriever`] (+ [`SearchFilters`])
//! → [`rank_candidates`] / [`assemble`] → [`SearchResponse`].

pub mod config;
pub mod engine;
pub mod explain;
pub mod filters;
pub mod fusion;
pub mod models;
pub mod query;
pub mod ranking;
pub mod retriever;

pub use config::SearchConfig;
pub use engine::{RecommendRequest, RecommendationEngine};
pub use explain::{ExplainContext, explain};
pub use filters::SearchFilters;
pub use fusion::{FusionWeights, fuse};
pub use models::{Candidate, Channels, RankedResult, ResponseWeights, SearchResponse};
pub use query::{BuiltQuery, QuerySource, QueryVectorBuilder};
pub use ranking::{
    SNIPPET_CHARS, ScoredCandidate, assemble, calculate_combined_score, dedupe, rank_candidates, snippet,
};
pub use retriever::SimilarityRetriever;
