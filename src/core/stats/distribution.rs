//! Per-column value distribution metrics
//!
//! Null samples are excluded from every count and from the entropy
//! calculation; an empty (or all-null) sample yields zero entropy and zero
//! ratios.

use crate::domain::SampleData;
use std::collections::HashMap;

/// Frequency, cardinality, and entropy metrics for one column sample
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionMetrics {
    /// Distinct non-null values
    pub distinct_value_count: usize,

    /// Non-null sample count
    pub total_sample_count: usize,

    /// `distinct / total`, 0.0 for an empty sample
    pub distinct_value_ratio: f64,

    /// Values occurring exactly once
    pub singleton_value_count: usize,

    /// Shannon entropy in bits over the non-null frequency distribution
    pub entropy: f64,

    /// Value → occurrence count
    pub frequency_map: HashMap<String, usize>,
}

impl DistributionMetrics {
    /// Metrics for an empty sample
    pub fn empty() -> Self {
        Self {
            distinct_value_count: 0,
            total_sample_count: 0,
            distinct_value_ratio: 0.0,
            singleton_value_count: 0,
            entropy: 0.0,
            frequency_map: HashMap::new(),
        }
    }
}

/// Computes distribution metrics for one column sample
pub fn analyze(samples: &SampleData) -> DistributionMetrics {
    let values = samples.string_values();
    if values.is_empty() {
        return DistributionMetrics::empty();
    }

    let total = values.len();
    let mut frequency_map: HashMap<String, usize> = HashMap::new();
    for value in values {
        *frequency_map.entry(value).or_insert(0) += 1;
    }

    let distinct = frequency_map.len();
    let singletons = frequency_map.values().filter(|&&c| c == 1).count();
    let entropy = shannon_entropy(frequency_map.values().copied(), total);

    DistributionMetrics {
        distinct_value_count: distinct,
        total_sample_count: total,
        distinct_value_ratio: distinct as f64 / total as f64,
        singleton_value_count: singletons,
        entropy,
        frequency_map,
    }
}

/// Shannon entropy (base 2) over a frequency distribution
pub fn shannon_entropy(frequencies: impl Iterator<Item = usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    frequencies
        .filter(|&count| count > 0)
        .map(|count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}
