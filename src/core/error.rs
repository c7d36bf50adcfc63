

use thiserror::Error;

use crate::embeddings::EmbeddingError;


#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Unknown seed book: no book with id {0}")]
    UnknownSeed(i64),

    #[error("Seed book {0} exists but has not been indexed yet")]
    SeedNotFound(i64),

    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Embedding generation error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid embedding record: {0}")]
    InvalidRecord(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FolioError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::RetrievalUnavailable(message.into())
    }

    /// True when the request itself was at fault (4xx-equivalent); everything else is a
    /// server-side condition.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuery(_) | Self::UnknownSeed(_) | Self::SeedNotFound(_)
        )
    }

    /// Short stable tag for logs and API envelopes.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidQuery(_) => "invalid_query",
            Self::UnknownSeed(_) => "unknown_seed",
            Self::SeedNotFound(_) => "seed_not_found",
            Self::RetrievalUnavailable(_) => "retrieval_unavailable",
            Self::Timeout(_) => "timeout",
            Self::Embedding(_) => "embedding",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::InvalidRecord(_) => "invalid_record",
            Self::Catalog(_) => "catalog",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

impl From<config::ConfigError> for FolioError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}


pub type Result<T> = std::result::Result<T, FolioError>;
