

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CANDIDATE_BUFFER, DEFAULT_K, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_K};


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_k: usize,
    pub max_k: usize,
    /// Extra neighbors requested beyond `k`, absorbing the excluded seed and duplicates.
    pub candidate_buffer: usize,
    /// Weight of the secondary (cf) channel in the final score. Zero keeps ranking purely
    /// semantic and the cf score informational.
    pub cf_weight: f64,
    pub request_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_K,
            max_k: MAX_K,
            candidate_buffer: CANDIDATE_BUFFER,
            cf_weight: 0.0,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl SearchConfig {
    /// Requested count, defaulted and bounded to `[1, max_k]`.
    #[must_use]
    pub fn clamp_k(&self, k: Option<usize>) -> usize {
        k.unwrap_or(self.default_k).clamp(1, self.max_k.max(1))
    }

    /// Neighbors to request from the index for `k` results.
    #[must_use]
    pub fn fetch_size(&self, k: usize) -> usize {
        k.saturating_add(self.candidate_buffer.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_k() {
        let config = SearchConfig::default();
        assert_eq!(config.clamp_k(None), 12);
        assert_eq!(config.clamp_k(Some(0)), 1);
        assert_eq!(config.clamp_k(Some(30)), 30);
        assert_eq!(config.clamp_k(Some(5000)), 100);
    }

    #[test]
    fn test_fetch_size_adds_buffer() {
        let config = SearchConfig::default();
        assert_eq!(config.fetch_size(12), 17);

        let config = SearchConfig { candidate_buffer: 0, ..Default::default() };
        assert_eq!(config.fetch_size(12), 13);

        let config = SearchConfig { candidate_buffer: usize::MAX, ..Default::default() };
        assert_eq!(config.fetch_size(12), usize::MAX);
    }
}
