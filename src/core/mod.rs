

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, EmbeddingCache};
pub use config::FolioConfig;
pub use error::{FolioError, Result};
