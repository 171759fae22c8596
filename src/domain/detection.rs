//! PII detection data models
//!
//! [`PiiCandidate`] is one proposed finding from one strategy;
//! [`DetectionResult`] is the per-column record of surviving candidates plus
//! the quasi-identifier annotations added by cross-column analysis.

use crate::domain::ids::ColumnRef;
use crate::domain::qi::ClusteringMethod;
use serde::{Deserialize, Serialize};

/// Canonical PII type taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiType {
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// Social Security Numbers
    Ssn,
    /// Person names (first, last, full)
    PersonName,
    /// Street addresses and other sub-state locations
    Address,
    /// Dates of birth
    DateOfBirth,
    /// Payment card numbers
    CreditCardNumber,
    /// IP addresses
    IpAddress,
    /// Postal / ZIP codes
    PostalCode,
    /// National identity numbers other than SSN
    NationalId,
    /// International bank account numbers
    Iban,
    /// Web URLs
    Url,
    /// Gender
    Gender,
    /// Organization names
    Organization,
    /// Login or account names
    Username,
    /// Passport numbers
    PassportNumber,
}

impl PiiType {
    /// Human-readable label, matching the serialized form
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Ssn => "SSN",
            Self::PersonName => "PERSON_NAME",
            Self::Address => "ADDRESS",
            Self::DateOfBirth => "DATE_OF_BIRTH",
            Self::CreditCardNumber => "CREDIT_CARD_NUMBER",
            Self::IpAddress => "IP_ADDRESS",
            Self::PostalCode => "POSTAL_CODE",
            Self::NationalId => "NATIONAL_ID",
            Self::Iban => "IBAN",
            Self::Url => "URL",
            Self::Gender => "GENDER",
            Self::Organization => "ORGANIZATION",
            Self::Username => "USERNAME",
            Self::PassportNumber => "PASSPORT_NUMBER",
        }
    }
}

impl std::fmt::Display for PiiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One proposed PII finding from one strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiCandidate {
    /// Column the finding applies to
    pub column: ColumnRef,

    /// Proposed PII type
    pub pii_type: PiiType,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Name of the strategy that produced the candidate
    pub strategy: String,

    /// Human-readable evidence (masked where it quotes sample values)
    pub evidence: String,
}

impl PiiCandidate {
    /// Creates a candidate, clamping confidence into [0, 1]
    pub fn new(
        column: ColumnRef,
        pii_type: PiiType,
        confidence: f64,
        strategy: impl Into<String>,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            column,
            pii_type,
            confidence: confidence.clamp(0.0, 1.0),
            strategy: strategy.into(),
            evidence: evidence.into(),
        }
    }
}

/// Per-column detection outcome
///
/// PII fields are written by the detection engine; quasi-identifier fields
/// are written by the QI analyzer afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Column the result describes
    pub column: ColumnRef,

    /// Candidates surviving conflict resolution and threshold filtering
    pub candidates: Vec<PiiCandidate>,

    /// Type of the highest-confidence surviving candidate
    pub highest_confidence_pii_type: Option<PiiType>,

    /// Highest surviving confidence, 0.0 when there are no candidates
    pub highest_confidence_score: f64,

    /// Whether any candidate meets the reporting threshold
    pub has_pii: bool,

    /// Set when the column belongs to a quasi-identifier group
    pub is_quasi_identifier: bool,

    /// Group risk score, copied onto every member column
    pub quasi_identifier_risk_score: Option<f64>,

    /// Method that produced the group
    pub clustering_method: Option<ClusteringMethod>,

    /// Other members of the same group
    pub correlated_columns: Vec<ColumnRef>,
}

impl DetectionResult {
    /// Builds a result from surviving candidates, deriving the summary fields
    pub fn from_candidates(
        column: ColumnRef,
        candidates: Vec<PiiCandidate>,
        reporting_threshold: f64,
    ) -> Self {
        let best = candidates
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
        let highest_confidence_pii_type = best.map(|c| c.pii_type);
        let highest_confidence_score = best.map(|c| c.confidence).unwrap_or(0.0);
        let has_pii = highest_confidence_score >= reporting_threshold && !candidates.is_empty();
        Self {
            column,
            candidates,
            highest_confidence_pii_type,
            highest_confidence_score,
            has_pii,
            is_quasi_identifier: false,
            quasi_identifier_risk_score: None,
            clustering_method: None,
            correlated_columns: Vec::new(),
        }
    }

    /// Empty result for a column with no findings
    pub fn empty(column: ColumnRef) -> Self {
        Self::from_candidates(column, Vec::new(), 1.0)
    }

    /// Annotates the result as a quasi-identifier group member
    pub fn mark_quasi_identifier(
        &mut self,
        risk_score: f64,
        method: ClusteringMethod,
        correlated: Vec<ColumnRef>,
    ) {
        self.is_quasi_identifier = true;
        self.quasi_identifier_risk_score = Some(risk_score);
        self.clustering_method = Some(method);
        self.correlated_columns = correlated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(pii_type: PiiType, confidence: f64) -> PiiCandidate {
        PiiCandidate::new(
            ColumnRef::new("t", "c"),
            pii_type,
            confidence,
            "heuristic",
            "test",
        )
    }

    #[test]
    fn test_confidence_clamped() {
        let c = candidate(PiiType::Email, 1.7);
        assert_eq!(c.confidence, 1.0);
        let c = candidate(PiiType::Email, -0.3);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_highest_confidence_derivation() {
        let result = DetectionResult::from_candidates(
            ColumnRef::new("t", "c"),
            vec![
                candidate(PiiType::Email, 0.6),
                candidate(PiiType::PersonName, 0.9),
            ],
            0.5,
        );
        assert_eq!(result.highest_confidence_score, 0.9);
        assert_eq!(result.highest_confidence_pii_type, Some(PiiType::PersonName));
        assert!(result.has_pii);
    }

    #[test]
    fn test_has_pii_requires_threshold() {
        let result = DetectionResult::from_candidates(
            ColumnRef::new("t", "c"),
            vec![candidate(PiiType::Email, 0.4)],
            0.5,
        );
        assert!(!result.has_pii);
    }

    #[test]
    fn test_empty_result() {
        let result = DetectionResult::empty(ColumnRef::new("t", "c"));
        assert!(result.candidates.is_empty());
        assert_eq!(result.highest_confidence_score, 0.0);
        assert!(result.highest_confidence_pii_type.is_none());
        assert!(!result.has_pii);
    }

    #[test]
    fn test_qi_annotation() {
        let mut result = DetectionResult::empty(ColumnRef::new("t", "age"));
        result.mark_quasi_identifier(
            0.75,
            ClusteringMethod::GraphCorrelation,
            vec![ColumnRef::new("t", "zip")],
        );
        assert!(result.is_quasi_identifier);
        assert_eq!(result.quasi_identifier_risk_score, Some(0.75));
        assert_eq!(result.correlated_columns.len(), 1);
    }

    #[test]
    fn test_pii_type_serialization() {
        let json = serde_json::to_string(&PiiType::CreditCardNumber).unwrap();
        assert_eq!(json, "\"CREDIT_CARD_NUMBER\"");
        assert_eq!(PiiType::PersonName.label(), "PERSON_NAME");
    }
}
