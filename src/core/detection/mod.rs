//! PII detection pipeline
//!
//! Strategies implement a small capability behind [`DetectionStrategy`]; the
//! engine iterates a fixed ordered list (Heuristic → Regex → NER) with
//! early-exit predicates instead of polymorphic chains.

pub mod cache;
pub mod engine;
pub mod heuristic;
pub mod ner;
pub mod patterns;
pub mod regex;

use crate::domain::{ColumnInfo, PiiCandidate, SampleData};
use async_trait::async_trait;

pub use cache::DetectionCache;
pub use engine::DetectionEngine;
pub use heuristic::HeuristicStrategy;
pub use ner::NerStrategy;
pub use patterns::{CompiledPattern, PatternRegistry};
pub use regex::RegexStrategy;

/// Capability implemented by every detection strategy
#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    /// Stable strategy name; also selects the short-circuit threshold
    fn name(&self) -> &'static str;

    /// Proposes PII candidates for one column
    ///
    /// Errors are contained by the engine: a failing strategy contributes an
    /// empty candidate list and the column still produces a result.
    async fn detect(
        &self,
        column: &ColumnInfo,
        samples: &SampleData,
    ) -> anyhow::Result<Vec<PiiCandidate>>;
}
