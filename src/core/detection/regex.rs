//! Regex-based PII detection over sampled values
//!
//! Each library pattern is applied to every string sample; the base score is
//! scaled by the matching fraction, so a pattern that matches a handful of
//! rows in a large sample scores low. Evidence quotes one matching value
//! with its interior masked.

use super::patterns::PatternRegistry;
use super::DetectionStrategy;
use crate::domain::{ColumnInfo, PiiCandidate, SampleData};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Candidates scoring at or below this are not emitted
const MIN_EMISSION_SCORE: f64 = 0.2;

/// Pattern-matching detection strategy
pub struct RegexStrategy {
    registry: Arc<PatternRegistry>,
}

impl RegexStrategy {
    /// Creates a strategy with the embedded default pattern library
    pub fn new() -> Result<Self> {
        Ok(Self {
            registry: Arc::new(PatternRegistry::default_patterns()?),
        })
    }

    /// Creates a strategy with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

#[async_trait]
impl DetectionStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        "regex"
    }

    async fn detect(&self, column: &ColumnInfo, samples: &SampleData) -> Result<Vec<PiiCandidate>> {
        let values = samples.string_values();
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let total = values.len();

        let mut candidates = Vec::new();
        for pattern in self.registry.all_patterns() {
            let mut matches = 0usize;
            let mut example: Option<&str> = None;
            for value in &values {
                if pattern.regex.is_match(value) {
                    matches += 1;
                    example.get_or_insert(value.as_str());
                }
            }

            if matches == 0 {
                continue;
            }

            let ratio = matches as f64 / total as f64;
            let score = pattern.base_score * ratio;
            if score <= MIN_EMISSION_SCORE {
                continue;
            }

            let masked = example.map(mask_value).unwrap_or_default();
            candidates.push(PiiCandidate::new(
                column.column_ref(),
                pattern.pii_type,
                score,
                self.name(),
                format!(
                    "{matches} of {total} ({:.1}%) samples match pattern '{}'; e.g. {masked}",
                    ratio * 100.0,
                    pattern.name,
                ),
            ));
        }

        Ok(candidates)
    }
}

/// Masks the interior of a value, keeping the first and last character
fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => String::new(),
        1 | 2 => "*".repeat(chars.len()),
        n => {
            let mut masked = String::with_capacity(n);
            masked.push(chars[0]);
            masked.extend(std::iter::repeat('*').take(n - 2));
            masked.push(chars[n - 1]);
            masked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PiiType;
    use serde_json::json;

    fn sample(values: &[&str]) -> SampleData {
        SampleData::new(values.iter().map(|v| Some(json!(v))).collect())
    }

    fn column() -> ColumnInfo {
        ColumnInfo::new("payments", "pan", "varchar")
    }

    #[tokio::test]
    async fn test_partial_match_scales_base_score() {
        // Six credit card numbers out of ten samples at base 0.95
        let values = [
            "4111111111111111",
            "5500005555555559",
            "4012888888881881",
            "4222222222222222",
            "5105105105105100",
            "4000056655665556",
            "pending",
            "n/a",
            "n/a",
            "refunded",
        ];
        let strategy = RegexStrategy::new().unwrap();
        let candidates = strategy.detect(&column(), &sample(&values)).await.unwrap();

        let card = candidates
            .iter()
            .find(|c| c.pii_type == PiiType::CreditCardNumber)
            .unwrap();
        assert!((card.confidence - 0.95 * 0.6).abs() < 1e-9);
        assert!(card.evidence.contains("6 of 10 (60.0%)"));
    }

    #[tokio::test]
    async fn test_low_ratio_suppressed() {
        // One match in ten: 0.9 * 0.1 = 0.09, under the emission floor
        let mut values = vec!["plain text"; 9];
        values.push("user@example.com");
        let strategy = RegexStrategy::new().unwrap();
        let candidates = strategy.detect(&column(), &sample(&values)).await.unwrap();
        assert!(!candidates.iter().any(|c| c.pii_type == PiiType::Email));
    }

    #[tokio::test]
    async fn test_empty_samples_yield_nothing() {
        let strategy = RegexStrategy::new().unwrap();
        let candidates = strategy
            .detect(&column(), &SampleData::empty())
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_all_null_samples_yield_nothing() {
        let strategy = RegexStrategy::new().unwrap();
        let data = SampleData::new(vec![None, None]);
        let candidates = strategy.detect(&column(), &data).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_evidence_masks_sample_value() {
        let values = ["user@example.com"; 5];
        let strategy = RegexStrategy::new().unwrap();
        let candidates = strategy.detect(&column(), &sample(&values)).await.unwrap();
        let email = candidates
            .iter()
            .find(|c| c.pii_type == PiiType::Email)
            .unwrap();
        assert!(!email.evidence.contains("user@example.com"));
        assert!(email.evidence.contains("u**************m"));
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value("abcdef"), "a****f");
        assert_eq!(mask_value("ab"), "**");
        assert_eq!(mask_value("a"), "*");
        assert_eq!(mask_value(""), "");
    }
}
