//! Quasi-identifier group models

use crate::domain::ids::{ColumnRef, JobId};
use serde::{Deserialize, Serialize};

/// How a quasi-identifier group was extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusteringMethod {
    /// Correlation graph connected components
    GraphCorrelation,
    /// DBSCAN over the correlation distance matrix
    MlClustering,
}

impl std::fmt::Display for ClusteringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GraphCorrelation => write!(f, "GRAPH_CORRELATION"),
            Self::MlClustering => write!(f, "ML_CLUSTERING"),
        }
    }
}

/// One column's membership in a quasi-identifier group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiGroupMember {
    /// Member column
    pub column: ColumnRef,

    /// Contribution to the group's identifying power, in [0, 1]
    pub contribution_score: f64,

    /// Distinct non-null values observed in the sample
    pub cardinality: usize,

    /// Shannon entropy of the member's sample distribution
    pub distribution_entropy: f64,
}

/// A named set of columns that together act as a quasi-identifier
///
/// Owned by one job. Combination counts are estimates derived from member
/// cardinalities, not exact group-by results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuasiIdentifierGroup {
    /// Group name, unique within the job
    pub name: String,

    /// Owning job
    pub job_id: JobId,

    /// Member columns with per-column metrics
    pub members: Vec<QiGroupMember>,

    /// Re-identification risk in [0, 1]
    pub re_identification_risk_score: f64,

    /// Extraction method
    pub clustering_method: ClusteringMethod,

    /// Estimated distinct value combinations across members
    pub distinct_combinations: i64,

    /// Estimated combinations occurring exactly once
    pub singleton_combinations: i64,

    /// Estimated k-anonymity of the member set
    pub estimated_k_anonymity: i64,
}

impl QuasiIdentifierGroup {
    /// Member columns in group order
    pub fn member_columns(&self) -> Vec<ColumnRef> {
        self.members.iter().map(|m| m.column.clone()).collect()
    }

    /// Whether the group contains a column
    pub fn contains(&self, column: &ColumnRef) -> bool {
        self.members.iter().any(|m| &m.column == column)
    }

    /// All members except `column`
    pub fn other_members(&self, column: &ColumnRef) -> Vec<ColumnRef> {
        self.members
            .iter()
            .filter(|m| &m.column != column)
            .map(|m| m.column.clone())
            .collect()
    }

    /// Group size
    pub fn size(&self) -> usize {
        self.members.len()
    }
}
