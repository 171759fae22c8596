//! Detection engine integration tests with the real strategy pipeline

use argus::adapters::ner::NerClient;
use argus::config::{DetectionConfig, NerConfig};
use argus::core::detection::{DetectionCache, DetectionEngine};
use argus::domain::{ColumnInfo, PiiType, SampleData};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

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

fn engine(config: DetectionConfig) -> DetectionEngine {
    DetectionEngine::new(config, None, Arc::new(DetectionCache::new())).unwrap()
}

fn samples_of(values: &[&str]) -> SampleData {
    SampleData::new(values.iter().map(|v| Some(json!(v))).collect())
}

#[tokio::test]
async fn test_heuristic_short_circuit_on_email_column() {
    // Column named `email`: the heuristic emits (EMAIL, 0.8), which meets the
    // 0.7 heuristic threshold, so the regex stage never runs. If it had run,
    // the all-email samples would have produced a stronger candidate.
    let column = ColumnInfo::new("users", "email", "varchar");
    let samples = HashMap::from([(
        column.column_ref(),
        samples_of(&["a@example.com", "b@example.com", "c@example.com"]),
    )]);

    let results = engine(config()).detect(&[column], &samples).await;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.highest_confidence_pii_type, Some(PiiType::Email));
    assert!((result.highest_confidence_score - 0.8).abs() < 1e-9);
    assert_eq!(result.candidates[0].strategy, "heuristic");
    assert!(result.has_pii);
}

#[tokio::test]
async fn test_regex_scores_credit_cards_by_match_ratio() {
    // Six of ten samples match the credit-card pattern at base 0.95:
    // 0.95 * 0.6 = 0.57
    let column = ColumnInfo::new("payments", "pan", "varchar");
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
    let samples = HashMap::from([(column.column_ref(), samples_of(&values))]);

    let results = engine(config()).detect(&[column], &samples).await;

    let card = results[0]
        .candidates
        .iter()
        .find(|c| c.pii_type == PiiType::CreditCardNumber)
        .expect("credit card candidate");
    assert!((card.confidence - 0.57).abs() < 1e-9);
    assert!(card.evidence.contains("6 of 10 (60.0%)"));
    assert_eq!(card.strategy, "regex");
}

#[tokio::test]
async fn test_unavailable_ner_equals_disabled_ner() {
    // The NER client points at a dead endpoint and was never probed
    // successfully, so the strategy degrades to empty output and detection
    // behaves exactly as if NER were disabled.
    let ner_config = NerConfig {
        enabled: true,
        url: "http://127.0.0.1:1/ner".to_string(),
        timeout_seconds: 1,
        max_samples: 10,
        retry_attempts: 0,
        retry_delay_ms: 1,
    };
    let dead_client = Arc::new(NerClient::new(ner_config).unwrap());
    assert!(!dead_client.probe().await);

    let with_ner = DetectionEngine::new(
        config(),
        Some(dead_client),
        Arc::new(DetectionCache::new()),
    )
    .unwrap();
    let without_ner = engine(config());

    let column = || ColumnInfo::new("users", "bio", "text");
    let samples = HashMap::from([(
        column().column_ref(),
        samples_of(&["John Smith lives in Berlin", "Jane Doe lives in Paris"]),
    )]);

    let a = with_ner.detect(&[column()], &samples).await;
    let b = without_ner.detect(&[column()], &samples).await;

    assert_eq!(a.len(), b.len());
    assert_eq!(a[0].candidates.len(), b[0].candidates.len());
    assert_eq!(a[0].has_pii, b[0].has_pii);
    assert_eq!(a[0].highest_confidence_score, b[0].highest_confidence_score);
}

#[tokio::test]
async fn test_detect_is_idempotent() {
    let column = || ColumnInfo::new("users", "phone", "varchar");
    let samples = HashMap::from([(
        column().column_ref(),
        samples_of(&["(555) 123-4567", "(555) 987-6543"]),
    )]);

    let engine = engine(config());
    let first = engine.detect(&[column()], &samples).await;
    let second = engine.detect(&[column()], &samples).await;

    assert_eq!(first.len(), second.len());
    assert_eq!(first[0].candidates.len(), second[0].candidates.len());
    assert_eq!(
        first[0].highest_confidence_score,
        second[0].highest_confidence_score
    );
    assert_eq!(
        first[0].highest_confidence_pii_type,
        second[0].highest_confidence_pii_type
    );
}

#[tokio::test]
async fn test_empty_samples_heuristic_still_applies() {
    // All-null data: strategies that read values emit nothing, but the
    // heuristic can still fire off the column name.
    let column = ColumnInfo::new("users", "ssn", "varchar");
    let samples = HashMap::from([(
        column.column_ref(),
        SampleData::new(vec![None, None, None]),
    )]);

    let results = engine(config()).detect(&[column], &samples).await;
    assert_eq!(results[0].highest_confidence_pii_type, Some(PiiType::Ssn));
    assert!(results[0].has_pii);
}

#[tokio::test]
async fn test_plain_column_with_empty_samples_yields_nothing() {
    let column = ColumnInfo::new("orders", "quantity", "integer");
    let results = engine(config()).detect(&[column], &HashMap::new()).await;
    assert!(results[0].candidates.is_empty());
    assert!(!results[0].has_pii);
    assert_eq!(results[0].highest_confidence_score, 0.0);
}

#[tokio::test]
async fn test_cache_flush_allows_reconfiguration() {
    let cache = Arc::new(DetectionCache::new());
    let column = || ColumnInfo::new("users", "zip", "varchar");
    let samples = HashMap::from([(column().column_ref(), samples_of(&["12345", "54321"]))]);

    // Permissive threshold: postal-code heuristic 0.7 survives
    let mut permissive = config();
    permissive.reporting_threshold = 0.3;
    let engine_a = DetectionEngine::new(permissive, None, cache.clone()).unwrap();
    let first = engine_a.detect(&[column()], &samples).await;
    assert!(first[0].has_pii);

    // Configuration changed: flush, then a strict engine recomputes
    cache.invalidate_all();
    let mut strict = config();
    strict.reporting_threshold = 0.95;
    let engine_b = DetectionEngine::new(strict, None, cache).unwrap();
    let second = engine_b.detect(&[column()], &samples).await;
    assert!(!second[0].has_pii);
}

#[tokio::test]
async fn test_conflict_resolution_keeps_one_candidate_per_type() {
    // `contact_email` matches the email keyword by containment (0.64) and the
    // all-email samples match the regex (0.9); only the regex candidate
    // survives per-type resolution.
    let mut cfg = config();
    cfg.stop_pipeline_on_high_confidence = false;
    let column = ColumnInfo::new("users", "contact_email", "varchar");
    let samples = HashMap::from([(
        column.column_ref(),
        samples_of(&["a@example.com", "b@example.com"]),
    )]);

    let results = engine(cfg).detect(&[column], &samples).await;
    let email_candidates: Vec<_> = results[0]
        .candidates
        .iter()
        .filter(|c| c.pii_type == PiiType::Email)
        .collect();
    assert_eq!(email_candidates.len(), 1);
    assert_eq!(email_candidates[0].strategy, "regex");
    assert!((email_candidates[0].confidence - 0.9).abs() < 1e-9);
}
