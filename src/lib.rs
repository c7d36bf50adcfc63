//! Vector fusion and ranking engine for book retrieval.
//!
//! A request carries a free-text prompt, a seed book, or both. The engine turns it into a
//! single query vector, asks the nearest-neighbor index for candidates, and assembles an
//! explained, deduplicated, ranked result list.

pub mod core;
pub mod db;
pub mod embeddings;
pub mod jobs;
pub mod search;
pub mod utils;

pub use utils::{
    cosine_distance, cosine_similarity, l2_norm, l2_normalize, safe_truncate, safe_truncate_ellipsis,
};


pub use core::config::FolioConfig;
pub use core::error::{FolioError, Result};
pub use db::{Book, Catalog, EmbeddingRecord, EmbeddingStore, EntityType, FlatIndex, InMemoryCatalog, VectorIndex};
pub use embeddings::{CachedEmbedder, EmbeddingError, HashingEmbedder, HttpEmbedder, TextEmbedder};
pub use search::{
    Channels, FusionWeights, RankedResult, RecommendRequest, RecommendationEngine, SearchFilters,
    SearchResponse,
};


pub const EMBED_DIM: usize = 384;


pub const DEFAULT_K: usize = 12;


pub const MAX_K: usize = 100;

/// Extra candidates pulled from the index to absorb the excluded seed and dedup losses.
pub const CANDIDATE_BUFFER: usize = 5;


pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 12;


pub const DEFAULT_EMBEDDING_MODEL: &str = "BAAI/bge-small-en-v1.5";


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_CACHE_SIZE: usize = 1000;
