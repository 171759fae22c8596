//! Column-name and comment keyword heuristics
//!
//! The cheapest strategy in the pipeline; it never looks at sampled data.
//! Scoring: exact name equality pays the full base score, a name containing
//! the keyword pays 0.8x, a comment containing it pays 0.7x.

use super::DetectionStrategy;
use crate::domain::{ColumnInfo, PiiCandidate, PiiType, SampleData};
use anyhow::Result;
use async_trait::async_trait;

/// Keyword → (PII type, base score) table
const KEYWORDS: &[(&str, PiiType, f64)] = &[
    ("ssn", PiiType::Ssn, 0.95),
    ("social_security", PiiType::Ssn, 0.95),
    ("email", PiiType::Email, 0.8),
    ("e_mail", PiiType::Email, 0.8),
    ("credit_card", PiiType::CreditCardNumber, 0.9),
    ("card_number", PiiType::CreditCardNumber, 0.85),
    ("phone", PiiType::Phone, 0.85),
    ("telephone", PiiType::Phone, 0.85),
    ("mobile", PiiType::Phone, 0.8),
    ("fax", PiiType::Phone, 0.7),
    ("first_name", PiiType::PersonName, 0.85),
    ("last_name", PiiType::PersonName, 0.85),
    ("surname", PiiType::PersonName, 0.85),
    ("full_name", PiiType::PersonName, 0.85),
    ("maiden_name", PiiType::PersonName, 0.85),
    ("name", PiiType::PersonName, 0.7),
    ("address", PiiType::Address, 0.75),
    ("street", PiiType::Address, 0.7),
    ("city", PiiType::Address, 0.6),
    ("birth", PiiType::DateOfBirth, 0.8),
    ("dob", PiiType::DateOfBirth, 0.85),
    ("zip", PiiType::PostalCode, 0.7),
    ("postal", PiiType::PostalCode, 0.7),
    ("postcode", PiiType::PostalCode, 0.7),
    ("passport", PiiType::PassportNumber, 0.9),
    ("national_id", PiiType::NationalId, 0.85),
    ("tax_id", PiiType::NationalId, 0.8),
    ("iban", PiiType::Iban, 0.9),
    ("ip_address", PiiType::IpAddress, 0.8),
    ("gender", PiiType::Gender, 0.7),
    ("sex", PiiType::Gender, 0.65),
    ("username", PiiType::Username, 0.7),
    ("user_name", PiiType::Username, 0.7),
    ("login", PiiType::Username, 0.65),
];

/// Multiplier when the column name contains (but doesn't equal) a keyword
const NAME_CONTAINS_FACTOR: f64 = 0.8;

/// Multiplier when the column comment contains a keyword
const COMMENT_CONTAINS_FACTOR: f64 = 0.7;

/// Keyword-matching detection strategy
#[derive(Debug, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    /// Creates the strategy
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DetectionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn detect(
        &self,
        column: &ColumnInfo,
        _samples: &SampleData,
    ) -> Result<Vec<PiiCandidate>> {
        let name = column.name.to_lowercase();
        let comment = column.comment.as_deref().map(str::to_lowercase);

        let mut candidates = Vec::new();
        for &(keyword, pii_type, base_score) in KEYWORDS {
            if name == keyword {
                candidates.push(PiiCandidate::new(
                    column.column_ref(),
                    pii_type,
                    base_score,
                    self.name(),
                    format!("column name equals keyword '{keyword}'"),
                ));
            } else if name.contains(keyword) {
                candidates.push(PiiCandidate::new(
                    column.column_ref(),
                    pii_type,
                    base_score * NAME_CONTAINS_FACTOR,
                    self.name(),
                    format!("column name contains keyword '{keyword}'"),
                ));
            } else if comment.as_deref().is_some_and(|c| c.contains(keyword)) {
                candidates.push(PiiCandidate::new(
                    column.column_ref(),
                    pii_type,
                    base_score * COMMENT_CONTAINS_FACTOR,
                    self.name(),
                    format!("column comment contains keyword '{keyword}'"),
                ));
            }
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleData;

    async fn detect(column: ColumnInfo) -> Vec<PiiCandidate> {
        HeuristicStrategy::new()
            .detect(&column, &SampleData::empty())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_exact_name_match_pays_base_score() {
        let candidates = detect(ColumnInfo::new("users", "email", "varchar")).await;
        let email = candidates
            .iter()
            .find(|c| c.pii_type == PiiType::Email)
            .unwrap();
        assert!((email.confidence - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_name_contains_pays_discounted_score() {
        let candidates = detect(ColumnInfo::new("users", "contact_email", "varchar")).await;
        let email = candidates
            .iter()
            .find(|c| c.pii_type == PiiType::Email)
            .unwrap();
        assert!((email.confidence - 0.8 * 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_comment_match_pays_lowest_score() {
        let column = ColumnInfo::new("users", "col_47", "varchar")
            .with_comment("stores the customer email address");
        let candidates = detect(column).await;
        let email = candidates
            .iter()
            .find(|c| c.pii_type == PiiType::Email)
            .unwrap();
        assert!((email.confidence - 0.8 * 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let candidates = detect(ColumnInfo::new("users", "EMAIL", "varchar")).await;
        assert!(candidates.iter().any(|c| c.pii_type == PiiType::Email));
    }

    #[tokio::test]
    async fn test_unrelated_column_yields_nothing() {
        let candidates = detect(ColumnInfo::new("orders", "quantity", "int4")).await;
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_multiple_keywords_emit_multiple_candidates() {
        // "first_name" matches both "first_name" (exact) and "name" (contains)
        let candidates = detect(ColumnInfo::new("users", "first_name", "varchar")).await;
        let person: Vec<_> = candidates
            .iter()
            .filter(|c| c.pii_type == PiiType::PersonName)
            .collect();
        assert!(person.len() >= 2);
        assert!(person.iter().any(|c| (c.confidence - 0.85).abs() < 1e-9));
    }
}
