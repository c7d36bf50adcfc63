

use serde::{Deserialize, Serialize};

use crate::db::catalog::Book;

/// A nearest-neighbor hit joined with catalog metadata. `metadata` is `None` when the
/// catalog had no row for the id or the lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub entity_id: i64,
    pub distance: f64,
    pub metadata: Option<Book>,
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Channels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cf: Option<f64>,
}

impl Channels {
    pub fn is_empty(&self) -> bool {
        self.semantic.is_none() && self.cf.is_none()
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: i64,
    /// `null` for a result whose metadata could not be joined.
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Start of the description on one line, capped for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub score: f64,
    pub channels: Channels,
    pub reason: String,
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseWeights {
    pub text: f32,
    pub seed: f32,
    pub cf: f64,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_book_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<ResponseWeights>,
    pub results: Vec<RankedResult>,
}

impl SearchResponse {
    pub fn ids(&self) -> Vec<i64> {
        self.results.iter().map(|r| r.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranked_result_json_shape() {
        let result = RankedResult {
            id: 7,
            title: Some("Homage to Catalonia".to_string()),
            author: Some("George Orwell".to_string()),
            published_year: None,
            subtitle: None,
            page_count: None,
            snippet: None,
            score: 0.75,
            channels: Channels { semantic: Some(0.75), cf: None },
            reason: "Close in meaning to your prompt.".to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "title": "Homage to Catalonia",
                "author": "George Orwell",
                "score": 0.75,
                "channels": {"semantic": 0.75},
                "reason": "Close in meaning to your prompt."
            })
        );
    }

    #[test]
    fn test_envelope_only_requires_results() {
        let response: SearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(response.results.is_empty());
        assert!(response.query.is_none());
    }
}
