

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::text::{document_text, query_text};
use super::{EmbeddingError, TextEmbedder};
use crate::core::config::FolioConfig;


#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Protocol {
    Ollama,
    OpenAI,
}

/// Embedder backed by a model server: Ollama's `/api/embeddings` or any
/// OpenAI-compatible `/embeddings` endpoint.
pub struct HttpEmbedder {
    protocol: Protocol,
    base_url: String,
    model: String,
    api_key: Option<String>,
    dims: usize,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(
        provider: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        dims: usize,
    ) -> Result<Self, EmbeddingError> {
        let protocol = match provider.to_lowercase().as_str() {
            "ollama" => Protocol::Ollama,
            "openai" => Protocol::OpenAI,
            other => return Err(EmbeddingError::NotImplemented(other.to_string())),
        };
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();

        info!(
            "HttpEmbedder initialized: provider={}, model={}, url={}",
            provider, model, base_url
        );

        Ok(Self {
            protocol,
            base_url,
            model,
            api_key,
            dims,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?,
        })
    }

    pub fn from_config(config: &FolioConfig) -> Result<Self, EmbeddingError> {
        Self::new(
            &config.embedding_provider,
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            config.embedding_timeout_secs,
            config.embedding_dim,
        )
    }

    fn check_dims(&self, embedding: Vec<f32>) -> Result<Vec<f32>, EmbeddingError> {
        if embedding.len() != self.dims {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dims,
                got: embedding.len(),
            });
        }
        Ok(embedding)
    }

    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        self.check_dims(response.embedding)
    }

    async fn generate_openai(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let request = OpenAIEmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIEmbeddingResponse>()
            .await?;

        if response.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);
        response
            .data
            .into_iter()
            .map(|d| self.check_dims(d.embedding))
            .collect()
    }

    async fn generate(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match self.protocol {
            Protocol::Ollama => {
                let mut out = Vec::with_capacity(texts.len());
                for text in &texts {
                    out.push(self.generate_ollama(text).await?);
                }
                Ok(out)
            }
            Protocol::OpenAI => self.generate_openai(&texts).await,
        }
    }
}

#[async_trait]
impl TextEmbedder for HttpEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmbeddingError::EmptyText);
        }
        debug!("Embedding query: {}", crate::safe_truncate(text, 50));
        self.generate(vec![query_text(&self.model, text)])
            .await?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let prepared = texts.iter().map(|t| document_text(&self.model, t)).collect();
        self.generate(prepared).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}
