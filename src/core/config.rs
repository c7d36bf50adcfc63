

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{FolioError, Result};
use crate::search::config::SearchConfig;
use crate::search::fusion::FusionWeights;
use crate::{
    CANDIDATE_BUFFER, DEFAULT_CACHE_SIZE, DEFAULT_EMBEDDING_MODEL, DEFAULT_K, DEFAULT_OLLAMA_URL,
    DEFAULT_REQUEST_TIMEOUT_SECS, EMBED_DIM, MAX_K,
};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    /// `hashing` (local, offline), `ollama`, or `openai`.
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_timeout_secs: u64,
    pub embedding_dim: usize,
    pub embed_batch_size: usize,

    pub cache_size: usize,

    pub default_k: usize,
    pub max_k: usize,
    pub candidate_buffer: usize,
    pub request_timeout_secs: u64,

    pub w_text: f32,
    pub w_seed: f32,
    pub cf_weight: f64,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            embedding_provider: "hashing".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_api_key: None,
            embedding_timeout_secs: 30,
            embedding_dim: EMBED_DIM,
            embed_batch_size: 256,

            cache_size: DEFAULT_CACHE_SIZE,

            default_k: DEFAULT_K,
            max_k: MAX_K,
            candidate_buffer: CANDIDATE_BUFFER,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,

            w_text: 0.5,
            w_seed: 0.5,
            cf_weight: 0.0,
        }
    }
}

impl FolioConfig {
    /// Defaults overridden by `FOLIO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::load(None::<&Path>)
    }

    /// Defaults, then the optional file (TOML/JSON/YAML by extension), then `FOLIO_*`
    /// environment variables.
    pub fn load(path: Option<impl AsRef<Path>>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            let path = path.as_ref();
            debug!("Loading config file {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix("FOLIO").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_provider != "hashing" {
            url::Url::parse(&self.embedding_url).map_err(|e| {
                FolioError::Config(format!("invalid embedding_url '{}': {}", self.embedding_url, e))
            })?;
        }
        if self.embedding_dim == 0 {
            return Err(FolioError::Config("embedding_dim must be positive".to_string()));
        }
        if self.embed_batch_size == 0 {
            return Err(FolioError::Config("embed_batch_size must be positive".to_string()));
        }
        if self.max_k == 0 || self.max_k > MAX_K {
            return Err(FolioError::Config(format!("max_k must be in [1, {MAX_K}]")));
        }
        if self.default_k == 0 || self.default_k > self.max_k {
            return Err(FolioError::Config(format!("default_k must be in [1, {}]", self.max_k)));
        }
        if self.candidate_buffer == 0 || self.candidate_buffer > MAX_K {
            return Err(FolioError::Config(format!("candidate_buffer must be in [1, {MAX_K}]")));
        }
        if self.request_timeout_secs == 0 {
            return Err(FolioError::Config("request_timeout_secs must be positive".to_string()));
        }
        if !self.cf_weight.is_finite() || self.cf_weight < 0.0 {
            return Err(FolioError::Config("cf_weight must be a non-negative number".to_string()));
        }
        self.fusion_weights()
            .map_err(|e| FolioError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn fusion_weights(&self) -> Result<FusionWeights> {
        FusionWeights::new(self.w_text, self.w_seed)
    }

    #[must_use]
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            default_k: self.default_k,
            max_k: self.max_k,
            candidate_buffer: self.candidate_buffer,
            cf_weight: self.cf_weight,
            request_timeout: self.request_timeout(),
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FolioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_k, 12);
        assert_eq!(config.embedding_dim, 384);
        assert_eq!(config.request_timeout(), Duration::from_secs(12));
        assert_eq!(config.cf_weight, 0.0);
    }

    #[test]
    fn test_rejects_bad_k_bounds() {
        let config = FolioConfig { default_k: 0, ..Default::default() };
        assert!(config.validate().is_err());

        let config = FolioConfig { max_k: 500, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unbounded_candidate_buffer() {
        let config = FolioConfig { candidate_buffer: usize::MAX, ..Default::default() };
        assert!(matches!(config.validate(), Err(FolioError::Config(_))));

        let config = FolioConfig { candidate_buffer: MAX_K, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_url_for_remote_provider() {
        let config = FolioConfig {
            embedding_provider: "ollama".to_string(),
            embedding_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(FolioError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_weights() {
        let config = FolioConfig { w_text: -0.5, ..Default::default() };
        assert!(config.validate().is_err());

        let config = FolioConfig { cf_weight: -1.0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_config_carries_overrides() {
        let config = FolioConfig { default_k: 5, candidate_buffer: 9, ..Default::default() };
        let search = config.search_config();
        assert_eq!(search.default_k, 5);
        assert_eq!(search.candidate_buffer, 9);
    }
}
