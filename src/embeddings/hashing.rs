

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::text::content_terms;
use super::{EmbeddingError, TextEmbedder};
use crate::l2_normalize;

const MODEL_NAME: &str = "feature-hashing";

/// Deterministic local embedder.
///
/// Each content term is hashed (SHA-256) to a signed bucket; the bucket counts are
/// L2-normalized. Texts that share vocabulary land close together, which is enough for
/// offline indexing and for tests that need discriminative but reproducible vectors.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let mut terms = content_terms(text);
        if terms.is_empty() {
            terms.push(text.to_lowercase());
        }

        let mut v = vec![0.0f32; self.dims];
        for term in &terms {
            let hash = Sha256::digest(term.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&hash[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dims as u64) as usize;
            let sign = if hash[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }

        if !l2_normalize(&mut v) {
            // Every term cancelled out; fall back to a single bucket for the whole text.
            let hash = Sha256::digest(text.to_lowercase().as_bytes());
            v[usize::from(hash[0]) % self.dims] = 1.0;
        }
        Ok(v)
    }
}

#[async_trait]
impl TextEmbedder for HashingEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embedder = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || embedder.embed_sync(&text))
            .await
            .map_err(|e| EmbeddingError::Task(e.to_string()))?
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let embedder = self.clone();
        let texts = texts.to_vec();
        debug!("Hashing {} documents", texts.len());
        tokio::task::spawn_blocking(move || {
            texts.iter().map(|t| embedder.embed_sync(t)).collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| EmbeddingError::Task(e.to_string()))?
    }

    fn model(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
