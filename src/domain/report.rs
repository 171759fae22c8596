//! Compliance report models
//!
//! The report is the immutable end product of a completed scan: every
//! scanned column appears in it, PII or not, so it doubles as a full audit
//! of what was looked at.

use crate::domain::detection::DetectionResult;
use crate::domain::ids::JobId;
use crate::domain::qi::QuasiIdentifierGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate counters for one scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Tables covered by the scan
    pub tables_scanned: usize,

    /// Columns covered by the scan
    pub columns_scanned: usize,

    /// Columns with at least one surviving PII candidate
    pub pii_columns_found: usize,

    /// Surviving candidates across all columns
    pub total_pii_candidates: usize,

    /// Columns that belong to a quasi-identifier group
    pub quasi_identifier_columns_found: usize,

    /// Quasi-identifier groups extracted
    pub quasi_identifier_groups_found: usize,

    /// Wall-clock scan duration
    pub scan_duration_millis: i64,
}

/// Final report for one completed scan job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Owning job
    pub job_id: JobId,

    /// Assembly time
    pub generated_at: DateTime<Utc>,

    /// Scanned host with credentials stripped
    pub host: String,

    /// Catalog name
    pub database_name: String,

    /// Database product name
    pub database_product_name: String,

    /// Database product version
    pub database_product_version: String,

    /// Per-column findings, including columns with no PII
    pub results: Vec<DetectionResult>,

    /// Quasi-identifier groups
    pub qi_groups: Vec<QuasiIdentifierGroup>,

    /// Aggregate counters
    pub summary: ReportSummary,

    /// Share of columns free of PII, as a percentage
    pub compliance_score: f64,
}

impl ComplianceReport {
    /// Compliance score: `max(0, (1 - pii/total) * 100)`; 100 for an empty scan
    pub fn score(pii_columns: usize, total_columns: usize) -> f64 {
        if total_columns == 0 {
            return 100.0;
        }
        let score = (1.0 - pii_columns as f64 / total_columns as f64) * 100.0;
        score.max(0.0)
    }

    /// Logs the summary with structured fields
    pub fn log_summary(&self) {
        tracing::info!(
            job_id = %self.job_id,
            tables_scanned = self.summary.tables_scanned,
            columns_scanned = self.summary.columns_scanned,
            pii_columns = self.summary.pii_columns_found,
            pii_candidates = self.summary.total_pii_candidates,
            qi_columns = self.summary.quasi_identifier_columns_found,
            qi_groups = self.summary.quasi_identifier_groups_found,
            duration_ms = self.summary.scan_duration_millis,
            compliance_score = format!("{:.1}", self.compliance_score),
            "Compliance report generated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_full_compliance() {
        assert_eq!(ComplianceReport::score(0, 50), 100.0);
    }

    #[test]
    fn test_score_partial() {
        let score = ComplianceReport::score(5, 20);
        assert!((score - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_empty_scan() {
        assert_eq!(ComplianceReport::score(0, 0), 100.0);
    }

    #[test]
    fn test_score_never_negative() {
        assert_eq!(ComplianceReport::score(10, 10), 0.0);
    }
}
