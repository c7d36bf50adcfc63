

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::Result;
use crate::db::catalog::Catalog;
use crate::db::store::{EmbeddingStore, EntityType};
use crate::embeddings::{EmbeddingError, TextEmbedder, book_document_text};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingJobReport {
    pub seen: usize,
    pub embedded: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Re-embeds every catalog book and overwrites its stored vector.
pub struct EmbeddingJob {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<EmbeddingStore>,
    catalog: Arc<dyn Catalog>,
    batch_size: usize,
}

impl EmbeddingJob {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<EmbeddingStore>,
        catalog: Arc<dyn Catalog>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            catalog,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run(&self) -> Result<EmbeddingJobReport> {
        let started_at = Utc::now();
        let books = self.catalog.all_books().await?;
        let seen = books.len();

        let mut docs = Vec::with_capacity(seen);
        let mut skipped = 0;
        for book in books {
            let text = book_document_text(&book);
            if text.is_empty() {
                warn!("Skipping book {}: no text to embed", book.id);
                skipped += 1;
                continue;
            }
            docs.push((book.id, text));
        }

        let mut embedded = 0;
        for (batch_no, chunk) in docs.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = chunk.iter().map(|(_, t)| t.clone()).collect();
            let vectors = self.embedder.embed_documents(&texts).await?;
            if vectors.len() != chunk.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "embedder returned {} vectors for a batch of {}",
                    vectors.len(),
                    chunk.len()
                ))
                .into());
            }
            for ((id, _), vector) in chunk.iter().zip(vectors) {
                self.store.upsert(EntityType::Book, *id, vector).await?;
            }
            embedded += chunk.len();
            info!("Embedding batch {} done: {}/{}", batch_no + 1, embedded, docs.len());
        }

        let report = EmbeddingJobReport {
            seen,
            embedded,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Embeddings upserted: seen={}, embedded={}, skipped={}",
            report.seen, report.embedded, report.skipped
        );
        Ok(report)
    }
}
