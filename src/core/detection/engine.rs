//! Detection engine
//!
//! Runs the ordered strategy pipeline per column with short-circuit
//! evaluation, merges candidates, and caches results. A strategy failure is
//! logged and contributes an empty candidate list; a single column can never
//! abort the batch.

use super::cache::DetectionCache;
use super::heuristic::HeuristicStrategy;
use super::ner::NerStrategy;
use super::patterns::PatternRegistry;
use super::regex::RegexStrategy;
use super::DetectionStrategy;
use crate::adapters::ner::NerClient;
use crate::config::DetectionConfig;
use crate::domain::{
    ArgusError, ColumnInfo, ColumnRef, DetectionResult, PiiCandidate, PiiType, Result, SampleData,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Multi-strategy detection engine
pub struct DetectionEngine {
    config: DetectionConfig,
    strategies: Vec<Arc<dyn DetectionStrategy>>,
    cache: Arc<DetectionCache>,
}

impl DetectionEngine {
    /// Creates an engine with the standard Heuristic → Regex → NER pipeline
    ///
    /// The NER stage is present only when a client is supplied; an
    /// unavailable client degrades to empty output on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured pattern library cannot be loaded.
    pub fn new(
        config: DetectionConfig,
        ner_client: Option<Arc<NerClient>>,
        cache: Arc<DetectionCache>,
    ) -> Result<Self> {
        let registry = match &config.pattern_library {
            Some(path) => PatternRegistry::from_file(path),
            None => PatternRegistry::default_patterns(),
        }
        .map_err(|e| ArgusError::Detection(format!("Failed to load pattern library: {e}")))?;

        let mut strategies: Vec<Arc<dyn DetectionStrategy>> = vec![
            Arc::new(HeuristicStrategy::new()),
            Arc::new(RegexStrategy::with_registry(registry)),
        ];
        if let Some(client) = ner_client {
            strategies.push(Arc::new(NerStrategy::new(client)));
        }

        Ok(Self {
            config,
            strategies,
            cache,
        })
    }

    /// Creates an engine with an explicit strategy list (used by tests)
    pub fn with_strategies(
        config: DetectionConfig,
        strategies: Vec<Arc<dyn DetectionStrategy>>,
        cache: Arc<DetectionCache>,
    ) -> Self {
        Self {
            config,
            strategies,
            cache,
        }
    }

    /// Handle to the shared cache
    pub fn cache(&self) -> &Arc<DetectionCache> {
        &self.cache
    }

    /// Runs detection for every column, preserving the input set
    ///
    /// Missing sample entries are treated as empty samples.
    pub async fn detect(
        &self,
        columns: &[ColumnInfo],
        samples: &HashMap<ColumnRef, SampleData>,
    ) -> Vec<DetectionResult> {
        let empty = SampleData::empty();
        let mut results = Vec::with_capacity(columns.len());
        for column in columns {
            let column_samples = samples.get(&column.column_ref()).unwrap_or(&empty);
            results.push(self.detect_column(column, column_samples).await);
        }
        results
    }

    async fn detect_column(&self, column: &ColumnInfo, samples: &SampleData) -> DetectionResult {
        let key = column.column_ref().key();
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(column = %key, "Detection cache hit");
            return cached;
        }

        let mut candidates = Vec::new();
        for strategy in &self.strategies {
            let strategy_candidates = match strategy.detect(column, samples).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::error!(
                        column = %key,
                        strategy = strategy.name(),
                        error = %e,
                        "Detection strategy failed, continuing with remaining strategies"
                    );
                    Vec::new()
                }
            };

            let threshold = self.config.threshold_for(strategy.name());
            let confident = strategy_candidates
                .iter()
                .any(|c| c.confidence >= threshold);
            candidates.extend(strategy_candidates);

            if self.config.stop_pipeline_on_high_confidence && confident {
                tracing::debug!(
                    column = %key,
                    strategy = strategy.name(),
                    "High-confidence candidate, skipping remaining strategies"
                );
                break;
            }
        }

        let surviving = filter_by_threshold(
            resolve_conflicts(candidates),
            self.config.reporting_threshold,
        );
        let result = DetectionResult::from_candidates(
            column.column_ref(),
            surviving,
            self.config.reporting_threshold,
        );
        self.cache.insert(key, result.clone());
        result
    }
}

/// Keeps the single highest-confidence candidate per PII type
fn resolve_conflicts(candidates: Vec<PiiCandidate>) -> Vec<PiiCandidate> {
    let mut best: HashMap<PiiType, PiiCandidate> = HashMap::new();
    for candidate in candidates {
        match best.get(&candidate.pii_type) {
            Some(existing) if existing.confidence >= candidate.confidence => {}
            _ => {
                best.insert(candidate.pii_type, candidate);
            }
        }
    }
    let mut resolved: Vec<PiiCandidate> = best.into_values().collect();
    resolved.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    resolved
}

/// Drops candidates under the reporting threshold
fn filter_by_threshold(candidates: Vec<PiiCandidate>, threshold: f64) -> Vec<PiiCandidate> {
    candidates
        .into_iter()
        .filter(|c| c.confidence >= threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub strategy with fixed output and an invocation counter
    struct StubStrategy {
        name: &'static str,
        output: Vec<(PiiType, f64)>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubStrategy {
        fn new(name: &'static str, output: Vec<(PiiType, f64)>) -> Arc<Self> {
            Arc::new(Self {
                name,
                output,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                output: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DetectionStrategy for StubStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn detect(
            &self,
            column: &ColumnInfo,
            _samples: &SampleData,
        ) -> anyhow::Result<Vec<PiiCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("stub failure");
            }
            Ok(self
                .output
                .iter()
                .map(|&(pii_type, confidence)| {
                    PiiCandidate::new(column.column_ref(), pii_type, confidence, self.name, "stub")
                })
                .collect())
        }
    }

    fn config() -> DetectionConfig {
        DetectionConfig {
            heuristic_threshold: 0.7,
            regex_threshold: 0.8,
            ner_threshold: 0.8,
            reporting_threshold: 0.5,
            stop_pipeline_on_high_confidence: true,
            pattern_library: None,
            quasi_identifier: Default::default(),
        }
    }

    fn column(name: &str) -> ColumnInfo {
        ColumnInfo::new("users", name, "varchar")
    }

    #[tokio::test]
    async fn test_short_circuit_skips_remaining_strategies() {
        let heuristic = StubStrategy::new("heuristic", vec![(PiiType::Email, 0.8)]);
        let regex = StubStrategy::new("regex", vec![(PiiType::Phone, 0.9)]);
        let ner = StubStrategy::new("ner", vec![]);

        let engine = DetectionEngine::with_strategies(
            config(),
            vec![heuristic.clone(), regex.clone(), ner.clone()],
            Arc::new(DetectionCache::new()),
        );

        let results = engine.detect(&[column("email")], &HashMap::new()).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].candidates.len(), 1);
        assert_eq!(results[0].highest_confidence_pii_type, Some(PiiType::Email));
        assert!((results[0].highest_confidence_score - 0.8).abs() < 1e-9);
        assert_eq!(heuristic.calls(), 1);
        assert_eq!(regex.calls(), 0);
        assert_eq!(ner.calls(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_continues_below_strategy_threshold() {
        let heuristic = StubStrategy::new("heuristic", vec![(PiiType::Email, 0.6)]);
        let regex = StubStrategy::new("regex", vec![(PiiType::Email, 0.9)]);

        let engine = DetectionEngine::with_strategies(
            config(),
            vec![heuristic.clone(), regex.clone()],
            Arc::new(DetectionCache::new()),
        );

        let results = engine.detect(&[column("email")], &HashMap::new()).await;

        assert_eq!(regex.calls(), 1);
        // Conflict resolution keeps the stronger candidate per type
        assert_eq!(results[0].candidates.len(), 1);
        assert!((results[0].highest_confidence_score - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_short_circuit_disabled_runs_all() {
        let mut cfg = config();
        cfg.stop_pipeline_on_high_confidence = false;
        let heuristic = StubStrategy::new("heuristic", vec![(PiiType::Email, 0.95)]);
        let regex = StubStrategy::new("regex", vec![]);

        let engine = DetectionEngine::with_strategies(
            cfg,
            vec![heuristic.clone(), regex.clone()],
            Arc::new(DetectionCache::new()),
        );

        engine.detect(&[column("email")], &HashMap::new()).await;
        assert_eq!(regex.calls(), 1);
    }

    #[tokio::test]
    async fn test_reporting_threshold_filters_candidates() {
        let heuristic = StubStrategy::new(
            "heuristic",
            vec![(PiiType::Email, 0.45), (PiiType::Phone, 0.55)],
        );

        let engine = DetectionEngine::with_strategies(
            config(),
            vec![heuristic],
            Arc::new(DetectionCache::new()),
        );

        let results = engine.detect(&[column("contact")], &HashMap::new()).await;
        assert_eq!(results[0].candidates.len(), 1);
        assert_eq!(results[0].candidates[0].pii_type, PiiType::Phone);
        assert!(results[0].has_pii);
    }

    #[tokio::test]
    async fn test_strategy_failure_yields_empty_not_abort() {
        let failing = StubStrategy::failing("heuristic");
        let regex = StubStrategy::new("regex", vec![(PiiType::Ssn, 0.9)]);

        let engine = DetectionEngine::with_strategies(
            config(),
            vec![failing, regex],
            Arc::new(DetectionCache::new()),
        );

        let results = engine.detect(&[column("ssn")], &HashMap::new()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].highest_confidence_pii_type, Some(PiiType::Ssn));
    }

    #[tokio::test]
    async fn test_column_with_no_findings_still_produces_result() {
        let heuristic = StubStrategy::new("heuristic", vec![]);
        let engine = DetectionEngine::with_strategies(
            config(),
            vec![heuristic],
            Arc::new(DetectionCache::new()),
        );

        let results = engine.detect(&[column("quantity")], &HashMap::new()).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].has_pii);
        assert!(results[0].candidates.is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_strategies() {
        let heuristic = StubStrategy::new("heuristic", vec![(PiiType::Email, 0.8)]);
        let cache = Arc::new(DetectionCache::new());
        let engine =
            DetectionEngine::with_strategies(config(), vec![heuristic.clone()], cache.clone());

        let first = engine.detect(&[column("email")], &HashMap::new()).await;
        let second = engine.detect(&[column("email")], &HashMap::new()).await;

        assert_eq!(heuristic.calls(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            first[0].highest_confidence_score,
            second[0].highest_confidence_score
        );
        assert_eq!(first[0].candidates.len(), second[0].candidates.len());
    }

    #[tokio::test]
    async fn test_result_order_preserves_input_order() {
        let heuristic = StubStrategy::new("heuristic", vec![]);
        let engine = DetectionEngine::with_strategies(
            config(),
            vec![heuristic],
            Arc::new(DetectionCache::new()),
        );

        let columns = vec![column("a"), column("b"), column("c")];
        let results = engine.detect(&columns, &HashMap::new()).await;
        let names: Vec<&str> = results.iter().map(|r| r.column.column.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_resolve_conflicts_keeps_best_per_type() {
        let col = ColumnRef::new("t", "c");
        let resolved = resolve_conflicts(vec![
            PiiCandidate::new(col.clone(), PiiType::Email, 0.6, "heuristic", ""),
            PiiCandidate::new(col.clone(), PiiType::Email, 0.9, "regex", ""),
            PiiCandidate::new(col, PiiType::Phone, 0.7, "heuristic", ""),
        ]);
        assert_eq!(resolved.len(), 2);
        let email = resolved.iter().find(|c| c.pii_type == PiiType::Email).unwrap();
        assert_eq!(email.strategy, "regex");
    }
}
