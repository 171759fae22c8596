//! NER service wire models

use serde::{Deserialize, Serialize};

/// Request body: the sampled strings for one column
#[derive(Debug, Clone, Serialize)]
pub struct NerRequest {
    /// Samples to analyze
    pub samples: Vec<String>,
}

/// One recognized entity
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NerEntity {
    /// Matched text
    pub text: String,

    /// Service-specific entity type (e.g. `PERSON`, `EMAIL`, `LOC`)
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Service confidence in [0, 1]
    pub score: f64,
}

/// Response body: one entity list per input sample, in input order
#[derive(Debug, Clone, Deserialize)]
pub struct NerResponse {
    /// Per-sample entity lists
    pub results: Vec<Vec<NerEntity>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = NerRequest {
            samples: vec!["John Smith".to_string()],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"samples":["John Smith"]}"#);
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"results":[[{"text":"John","type":"PERSON","score":0.98}],[]]}"#;
        let response: NerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0][0].entity_type, "PERSON");
        assert!(response.results[1].is_empty());
    }
}
