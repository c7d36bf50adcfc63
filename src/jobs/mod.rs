

pub mod embeddings_job;

pub use embeddings_job::{EmbeddingJob, EmbeddingJobReport};
