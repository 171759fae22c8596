//! Quasi-identifier analysis
//!
//! Filters columns down to plausible quasi-identifiers, correlates them,
//! extracts groups (graph components or DBSCAN), scores re-identification
//! risk, and annotates the per-column detection results with group
//! membership.

use super::dbscan::dbscan;
use super::graph::CorrelationGraph;
use crate::config::QuasiIdentifierConfig;
use crate::core::stats::{self, CorrelationMatrix, DistributionMetrics};
use crate::domain::{
    ClusteringMethod, ColumnInfo, ColumnRef, DetectionResult, JobId, QiGroupMember,
    QuasiIdentifierGroup, SampleData,
};
use std::collections::HashMap;

/// Estimated distinct combinations are discounted by this factor to account
/// for value co-occurrence; a stand-in for true combinatorial counting.
const COMBINATION_OVERLAP_FACTOR: f64 = 0.7;

/// Share of estimated combinations assumed to occur exactly once
const SINGLETON_RATIO: f64 = 0.2;

/// Entropy weight in the member contribution score
const CONTRIBUTION_ENTROPY_WEIGHT: f64 = 0.7;

/// Correlation weight in the member contribution score
const CONTRIBUTION_CORRELATION_WEIGHT: f64 = 0.3;

/// Retry epsilon when the first DBSCAN pass finds nothing
const DBSCAN_RETRY_EPS: f64 = 0.6;

/// Floor for the relaxed graph threshold retry
const GRAPH_RETRY_FLOOR: f64 = 0.5;

/// Threshold factor for the global pair fallback
const FALLBACK_PAIR_FACTOR: f64 = 0.8;

/// Cap on fallback pairs
const FALLBACK_PAIR_LIMIT: usize = 5;

/// Quasi-identifier analyzer
pub struct QuasiIdentifierAnalyzer {
    config: QuasiIdentifierConfig,
}

struct EligibleColumn<'a> {
    column: &'a ColumnInfo,
    samples: &'a SampleData,
    metrics: DistributionMetrics,
}

impl QuasiIdentifierAnalyzer {
    /// Creates an analyzer
    pub fn new(config: QuasiIdentifierConfig) -> Self {
        Self { config }
    }

    /// Runs the full analysis and annotates `results` in place
    ///
    /// Returns the extracted groups; persistence is the caller's concern.
    pub fn analyze(
        &self,
        job_id: &JobId,
        columns: &[ColumnInfo],
        samples: &HashMap<ColumnRef, SampleData>,
        results: &mut [DetectionResult],
    ) -> Vec<QuasiIdentifierGroup> {
        let eligible = self.eligible_columns(columns, samples, results);
        if eligible.len() < 2 {
            tracing::debug!(
                eligible = eligible.len(),
                "Too few eligible columns for quasi-identifier analysis"
            );
            return Vec::new();
        }

        let data: Vec<(&ColumnInfo, &SampleData)> =
            eligible.iter().map(|e| (e.column, e.samples)).collect();
        let matrix = stats::compute_matrix(&data);

        let refs: Vec<ColumnRef> = eligible.iter().map(|e| e.column.column_ref()).collect();
        let (index_groups, method) = if self.config.use_machine_learning {
            (self.cluster_ml(&refs, &matrix), ClusteringMethod::MlClustering)
        } else {
            (
                self.cluster_graph(&refs, &matrix),
                ClusteringMethod::GraphCorrelation,
            )
        };

        let groups: Vec<QuasiIdentifierGroup> = index_groups
            .iter()
            .enumerate()
            .map(|(i, indices)| {
                self.build_group(
                    format!("qi_group_{}", i + 1),
                    job_id,
                    indices,
                    &eligible,
                    &matrix,
                    method,
                )
            })
            .collect();

        annotate_results(results, &groups);

        tracing::info!(
            eligible_columns = eligible.len(),
            groups = groups.len(),
            method = %method,
            "Quasi-identifier analysis complete"
        );

        groups
    }

    /// Step 1: eligibility filter
    ///
    /// Removes columns that already carry PII, key columns, and columns whose
    /// distribution makes them useless as quasi-identifiers (near-constant or
    /// near-unique).
    fn eligible_columns<'a>(
        &self,
        columns: &'a [ColumnInfo],
        samples: &'a HashMap<ColumnRef, SampleData>,
        results: &[DetectionResult],
    ) -> Vec<EligibleColumn<'a>> {
        let has_pii: HashMap<&ColumnRef, bool> =
            results.iter().map(|r| (&r.column, r.has_pii)).collect();

        columns
            .iter()
            .filter_map(|column| {
                let column_ref = column.column_ref();
                if has_pii.get(&column_ref).copied().unwrap_or(false) {
                    return None;
                }
                if column.is_primary_key || column.participates_in_foreign_key() {
                    return None;
                }
                let column_samples = samples.get(&column_ref)?;
                let metrics = stats::analyze(column_samples);
                if metrics.distinct_value_count < self.config.min_distinct_value_count {
                    return None;
                }
                if metrics.distinct_value_ratio > self.config.max_distinct_value_ratio {
                    return None;
                }
                if metrics.entropy < self.config.entropy_threshold {
                    return None;
                }
                Some(EligibleColumn {
                    column,
                    samples: column_samples,
                    metrics,
                })
            })
            .collect()
    }

    /// Step 3, graph mode
    fn cluster_graph(&self, refs: &[ColumnRef], matrix: &CorrelationMatrix) -> Vec<Vec<usize>> {
        let mut threshold = self.config.correlation_threshold;
        let mut graph = CorrelationGraph::build(refs, matrix, threshold);

        if graph.edge_count() == 0 && refs.len() >= 2 {
            threshold = (threshold - 0.1).max(GRAPH_RETRY_FLOOR);
            tracing::debug!(threshold, "No correlation edges, retrying with relaxed threshold");
            graph = CorrelationGraph::build(refs, matrix, threshold);
        }

        let mut groups = Vec::new();
        for component in graph.connected_components() {
            if component.len() < self.config.min_group_size {
                continue;
            }
            if component.len() <= self.config.max_group_size {
                groups.push(component);
                continue;
            }

            let subgroups = graph.decompose_by_weighted_degree(
                &component,
                self.config.min_group_size,
                self.config.max_group_size,
            );
            if subgroups.is_empty() {
                groups.extend(graph.greedy_pairs(&component, threshold));
            } else {
                groups.extend(subgroups);
            }
        }

        if groups.is_empty() {
            groups = graph.global_top_pairs(FALLBACK_PAIR_FACTOR * threshold, FALLBACK_PAIR_LIMIT);
        }

        groups
    }

    /// Step 3, ML mode: DBSCAN over `1 − |corr|` distances
    fn cluster_ml(&self, refs: &[ColumnRef], matrix: &CorrelationMatrix) -> Vec<Vec<usize>> {
        let n = refs.len();
        let mut distances = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    distances[i][j] = 1.0 - matrix.get(&refs[i], &refs[j]);
                }
            }
        }

        let eps = (self.config.clustering_distance_threshold * 1.5).min(0.5);
        let mut clusters = dbscan(&distances, eps, self.config.min_group_size);
        if clusters.is_empty() {
            tracing::debug!(eps = DBSCAN_RETRY_EPS, "No DBSCAN clusters, retrying with wider epsilon");
            clusters = dbscan(&distances, DBSCAN_RETRY_EPS, self.config.min_group_size);
        }

        clusters.retain(|c| {
            c.len() >= self.config.min_group_size && c.len() <= self.config.max_group_size
        });
        clusters
    }

    /// Step 4: group construction with risk scoring
    fn build_group(
        &self,
        name: String,
        job_id: &JobId,
        indices: &[usize],
        eligible: &[EligibleColumn<'_>],
        matrix: &CorrelationMatrix,
        method: ClusteringMethod,
    ) -> QuasiIdentifierGroup {
        let members: Vec<QiGroupMember> = indices
            .iter()
            .map(|&i| {
                let entry = &eligible[i];
                let avg_correlation = if indices.len() > 1 {
                    indices
                        .iter()
                        .filter(|&&j| j != i)
                        .map(|&j| {
                            matrix.get(
                                &entry.column.column_ref(),
                                &eligible[j].column.column_ref(),
                            )
                        })
                        .sum::<f64>()
                        / (indices.len() - 1) as f64
                } else {
                    0.0
                };

                let normalized_entropy = normalized_entropy(
                    entry.metrics.entropy,
                    entry.metrics.total_sample_count,
                );
                let contribution_score = (CONTRIBUTION_ENTROPY_WEIGHT * normalized_entropy
                    + CONTRIBUTION_CORRELATION_WEIGHT * avg_correlation)
                    .clamp(0.0, 1.0);

                QiGroupMember {
                    column: entry.column.column_ref(),
                    contribution_score,
                    cardinality: entry.metrics.distinct_value_count,
                    distribution_entropy: entry.metrics.entropy,
                }
            })
            .collect();

        let distinct_combinations = estimate_distinct_combinations(&members);
        let singleton_combinations =
            (SINGLETON_RATIO * distinct_combinations as f64).round() as i64;

        let avg_samples = indices
            .iter()
            .map(|&i| eligible[i].metrics.total_sample_count as f64)
            .sum::<f64>()
            / indices.len() as f64;
        let estimated_k = estimate_k_anonymity(avg_samples, distinct_combinations);
        let k_factor = (self.config.k_anonymity_threshold as f64 / (estimated_k + 1) as f64)
            .clamp(0.0, 1.0);

        let avg_entropy =
            members.iter().map(|m| m.distribution_entropy).sum::<f64>() / members.len() as f64;
        let avg_cardinality =
            members.iter().map(|m| m.cardinality as f64).sum::<f64>() / members.len() as f64;
        let max_possible_entropy = if avg_cardinality > 1.0 {
            avg_cardinality.log2()
        } else {
            0.0
        };
        let normalized_group_entropy = if max_possible_entropy > 0.0 {
            (avg_entropy / max_possible_entropy).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let re_identification_risk_score =
            (0.6 * k_factor + 0.4 * normalized_group_entropy).clamp(0.0, 1.0);

        QuasiIdentifierGroup {
            name,
            job_id: job_id.clone(),
            members,
            re_identification_risk_score,
            clustering_method: method,
            distinct_combinations,
            singleton_combinations,
            estimated_k_anonymity: estimated_k,
        }
    }
}

/// Entropy normalized by the maximum possible for the sample size
fn normalized_entropy(entropy: f64, total_sample_count: usize) -> f64 {
    if total_sample_count < 2 {
        return 0.0;
    }
    let max_entropy = (total_sample_count as f64).log2();
    if max_entropy <= 0.0 {
        return 0.0;
    }
    (entropy / max_entropy).clamp(0.0, 1.0)
}

/// `∏ (cardinality_i · 0.7)`, clamped to a positive 32-bit range
fn estimate_distinct_combinations(members: &[QiGroupMember]) -> i64 {
    let product = members
        .iter()
        .map(|m| (m.cardinality as f64 * COMBINATION_OVERLAP_FACTOR).max(1.0))
        .product::<f64>();
    product.min(i32::MAX as f64).max(1.0) as i64
}

/// Approximate smallest group-by bucket from sample size and combination count
fn estimate_k_anonymity(avg_samples: f64, distinct_combinations: i64) -> i64 {
    if distinct_combinations <= 0 {
        return 1;
    }
    ((avg_samples / distinct_combinations as f64).floor() as i64).max(1)
}

/// Step 5: copy group membership onto the per-column results
fn annotate_results(results: &mut [DetectionResult], groups: &[QuasiIdentifierGroup]) {
    for group in groups {
        for result in results.iter_mut() {
            if group.contains(&result.column) {
                result.mark_quasi_identifier(
                    group.re_identification_risk_score,
                    group.clustering_method,
                    group.other_members(&result.column),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn qi_config() -> QuasiIdentifierConfig {
        QuasiIdentifierConfig {
            enabled: true,
            correlation_analysis_enabled: true,
            use_machine_learning: false,
            min_group_size: 2,
            max_group_size: 5,
            correlation_threshold: 0.8,
            clustering_distance_threshold: 0.3,
            min_distinct_value_count: 3,
            max_distinct_value_ratio: 0.9,
            entropy_threshold: 1.0,
            k_anonymity_threshold: 5,
        }
    }

    /// Numeric column whose values cycle through `modulus` distinct values
    fn cycled_samples(len: usize, modulus: usize, scale: f64, offset: f64) -> SampleData {
        SampleData::new(
            (0..len)
                .map(|i| Some(json!((i % modulus) as f64 * scale + offset)))
                .collect(),
        )
    }

    fn numeric_column(name: &str) -> ColumnInfo {
        ColumnInfo::new("people", name, "int8").numeric(true)
    }

    struct Fixture {
        columns: Vec<ColumnInfo>,
        samples: HashMap<ColumnRef, SampleData>,
        results: Vec<DetectionResult>,
    }

    /// Three linearly related numeric columns: pairwise Pearson is 1.0
    fn correlated_fixture() -> Fixture {
        let columns = vec![
            numeric_column("age"),
            numeric_column("score"),
            numeric_column("band"),
        ];
        let mut samples = HashMap::new();
        samples.insert(columns[0].column_ref(), cycled_samples(30, 10, 1.0, 20.0));
        samples.insert(columns[1].column_ref(), cycled_samples(30, 10, 2.0, 0.0));
        samples.insert(columns[2].column_ref(), cycled_samples(30, 10, 3.0, 5.0));
        let results = columns
            .iter()
            .map(|c| DetectionResult::empty(c.column_ref()))
            .collect();
        Fixture {
            columns,
            samples,
            results,
        }
    }

    #[test]
    fn test_correlated_columns_form_one_group() {
        let mut fixture = correlated_fixture();
        let analyzer = QuasiIdentifierAnalyzer::new(qi_config());
        let groups = analyzer.analyze(
            &JobId::generate(),
            &fixture.columns,
            &fixture.samples,
            &mut fixture.results,
        );

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.size(), 3);
        assert_eq!(group.clustering_method, ClusteringMethod::GraphCorrelation);
        assert!(group.re_identification_risk_score > 0.0);
        assert!(group.re_identification_risk_score <= 1.0);
    }

    #[test]
    fn test_members_annotated_with_other_columns() {
        let mut fixture = correlated_fixture();
        let analyzer = QuasiIdentifierAnalyzer::new(qi_config());
        let groups = analyzer.analyze(
            &JobId::generate(),
            &fixture.columns,
            &fixture.samples,
            &mut fixture.results,
        );

        for result in &fixture.results {
            assert!(result.is_quasi_identifier);
            assert_eq!(
                result.quasi_identifier_risk_score,
                Some(groups[0].re_identification_risk_score)
            );
            assert_eq!(result.correlated_columns.len(), 2);
            assert!(!result.correlated_columns.contains(&result.column));
        }
    }

    #[test]
    fn test_pii_columns_excluded() {
        let mut fixture = correlated_fixture();
        // Mark "age" as already carrying PII
        fixture.results[0] = DetectionResult::from_candidates(
            fixture.columns[0].column_ref(),
            vec![crate::domain::PiiCandidate::new(
                fixture.columns[0].column_ref(),
                crate::domain::PiiType::Email,
                0.9,
                "heuristic",
                "",
            )],
            0.5,
        );

        let analyzer = QuasiIdentifierAnalyzer::new(qi_config());
        let groups = analyzer.analyze(
            &JobId::generate(),
            &fixture.columns,
            &fixture.samples,
            &mut fixture.results,
        );

        assert!(groups.iter().all(|g| !g.contains(&fixture.columns[0].column_ref())));
        assert!(!fixture.results[0].is_quasi_identifier);
    }

    #[test]
    fn test_key_columns_excluded() {
        let mut fixture = correlated_fixture();
        fixture.columns[0].is_primary_key = true;
        fixture.columns[1]
            .imported_keys
            .push(ColumnRef::new("other", "id"));

        let analyzer = QuasiIdentifierAnalyzer::new(qi_config());
        let groups = analyzer.analyze(
            &JobId::generate(),
            &fixture.columns,
            &fixture.samples,
            &mut fixture.results,
        );

        // Only one column left eligible, so no groups at all
        assert!(groups.is_empty());
    }

    #[test]
    fn test_low_cardinality_columns_excluded() {
        let mut fixture = correlated_fixture();
        // Constant column: distinct count 1, entropy 0
        fixture
            .samples
            .insert(fixture.columns[2].column_ref(), cycled_samples(30, 1, 1.0, 0.0));

        let analyzer = QuasiIdentifierAnalyzer::new(qi_config());
        let groups = analyzer.analyze(
            &JobId::generate(),
            &fixture.columns,
            &fixture.samples,
            &mut fixture.results,
        );

        assert!(groups.iter().all(|g| !g.contains(&fixture.columns[2].column_ref())));
    }

    #[test]
    fn test_single_eligible_column_yields_no_groups() {
        let columns = vec![numeric_column("age")];
        let mut samples = HashMap::new();
        samples.insert(columns[0].column_ref(), cycled_samples(30, 10, 1.0, 0.0));
        let mut results = vec![DetectionResult::empty(columns[0].column_ref())];

        let analyzer = QuasiIdentifierAnalyzer::new(qi_config());
        let groups = analyzer.analyze(&JobId::generate(), &columns, &samples, &mut results);
        assert!(groups.is_empty());
        assert!(!results[0].is_quasi_identifier);
    }

    #[test]
    fn test_ml_mode_clusters_correlated_columns() {
        let mut fixture = correlated_fixture();
        let mut config = qi_config();
        config.use_machine_learning = true;

        let analyzer = QuasiIdentifierAnalyzer::new(config);
        let groups = analyzer.analyze(
            &JobId::generate(),
            &fixture.columns,
            &fixture.samples,
            &mut fixture.results,
        );

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].clustering_method, ClusteringMethod::MlClustering);
        assert_eq!(groups[0].size(), 3);
    }

    #[test]
    fn test_combination_estimate_clamped() {
        let members: Vec<QiGroupMember> = (0..8)
            .map(|i| QiGroupMember {
                column: ColumnRef::new("t", format!("c{i}")),
                contribution_score: 0.5,
                cardinality: 100_000,
                distribution_entropy: 10.0,
            })
            .collect();
        let estimate = estimate_distinct_combinations(&members);
        assert_eq!(estimate, i32::MAX as i64);
    }

    #[test]
    fn test_combination_estimate_small_group() {
        let members: Vec<QiGroupMember> = [10usize, 20]
            .iter()
            .map(|&card| QiGroupMember {
                column: ColumnRef::new("t", format!("c{card}")),
                contribution_score: 0.5,
                cardinality: card,
                distribution_entropy: 2.0,
            })
            .collect();
        // 10*0.7 * 20*0.7 = 98
        assert_eq!(estimate_distinct_combinations(&members), 98);
    }

    #[test]
    fn test_k_estimate_floors_at_one() {
        assert_eq!(estimate_k_anonymity(10.0, 1000), 1);
        assert_eq!(estimate_k_anonymity(1000.0, 10), 100);
        assert_eq!(estimate_k_anonymity(100.0, 0), 1);
    }

    #[test]
    fn test_normalized_entropy_bounds() {
        assert_eq!(normalized_entropy(3.0, 1), 0.0);
        assert_eq!(normalized_entropy(0.0, 100), 0.0);
        let n = normalized_entropy(3.3, 10);
        assert!(n > 0.0 && n <= 1.0);
    }
}
