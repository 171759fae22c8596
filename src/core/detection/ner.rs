//! NER-backed detection strategy
//!
//! Wraps the remote service client. The service is optional: when it is
//! unavailable, or a call fails after retries, the strategy returns an empty
//! candidate list and marks the client degraded so later columns skip the
//! network round-trip entirely. A scan never fails because of NER.

use super::DetectionStrategy;
use crate::adapters::ner::NerClient;
use crate::domain::{ColumnInfo, PiiCandidate, PiiType, SampleData};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Candidates scoring at or below this are not emitted
const MIN_EMISSION_SCORE: f64 = 0.2;

/// Remote named-entity-recognition strategy
pub struct NerStrategy {
    client: Arc<NerClient>,
}

impl NerStrategy {
    /// Creates the strategy over a shared client
    pub fn new(client: Arc<NerClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetectionStrategy for NerStrategy {
    fn name(&self) -> &'static str {
        "ner"
    }

    async fn detect(&self, column: &ColumnInfo, samples: &SampleData) -> Result<Vec<PiiCandidate>> {
        if !self.client.is_available() {
            return Ok(Vec::new());
        }

        let mut values = samples.string_values();
        values.truncate(self.client.max_samples());
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let results = match self.client.recognize(&values).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(
                    column = %column.column_ref(),
                    error = %e,
                    "NER call failed, marking service unavailable and continuing without it"
                );
                self.client.mark_unavailable();
                return Ok(Vec::new());
            }
        };

        Ok(aggregate_entities(column, &values, &results, self.name()))
    }
}

/// Aggregates per-sample entity lists into per-type candidates
///
/// For each entity type: `score = avg(entity scores) * (samples containing
/// the type / total samples)`.
fn aggregate_entities(
    column: &ColumnInfo,
    values: &[String],
    results: &[Vec<crate::adapters::ner::NerEntity>],
    strategy_name: &str,
) -> Vec<PiiCandidate> {
    let total_samples = values.len();

    // entity type -> (score sum, occurrence count, samples containing type)
    let mut stats: HashMap<&str, (f64, usize, usize)> = HashMap::new();
    for entities in results {
        let mut seen_in_sample: Vec<&str> = Vec::new();
        for entity in entities {
            let entry = stats.entry(entity.entity_type.as_str()).or_insert((0.0, 0, 0));
            entry.0 += entity.score;
            entry.1 += 1;
            if !seen_in_sample.contains(&entity.entity_type.as_str()) {
                seen_in_sample.push(&entity.entity_type);
                entry.2 += 1;
            }
        }
    }

    let mut candidates = Vec::new();
    for (entity_type, (score_sum, occurrences, samples_with_type)) in stats {
        let Some(pii_type) = map_entity_type(entity_type) else {
            tracing::debug!(entity_type, "Unmapped NER entity type ignored");
            continue;
        };

        let avg_score = score_sum / occurrences as f64;
        let match_percentage = samples_with_type as f64 / total_samples as f64;
        let score = avg_score * match_percentage;
        if score <= MIN_EMISSION_SCORE {
            continue;
        }

        candidates.push(PiiCandidate::new(
            column.column_ref(),
            pii_type,
            score,
            strategy_name,
            format!(
                "NER found {entity_type} in {samples_with_type} of {total_samples} samples \
                 (avg score {avg_score:.2})"
            ),
        ));
    }

    candidates
}

/// Fixed mapping from service entity labels to canonical PII types
fn map_entity_type(entity_type: &str) -> Option<PiiType> {
    match entity_type.to_uppercase().as_str() {
        "PERSON" | "PER" => Some(PiiType::PersonName),
        "EMAIL" => Some(PiiType::Email),
        "LOC" | "LOCATION" | "GPE" | "ADDRESS" => Some(PiiType::Address),
        "ORG" | "ORGANIZATION" => Some(PiiType::Organization),
        "PHONE" | "PHONE_NUMBER" => Some(PiiType::Phone),
        "DATE" | "DOB" => Some(PiiType::DateOfBirth),
        "SSN" => Some(PiiType::Ssn),
        "ID" | "NATIONAL_ID" => Some(PiiType::NationalId),
        "IP" | "IP_ADDRESS" => Some(PiiType::IpAddress),
        "URL" => Some(PiiType::Url),
        "IBAN" => Some(PiiType::Iban),
        "CREDIT_CARD" => Some(PiiType::CreditCardNumber),
        _ => None,
    }
}
