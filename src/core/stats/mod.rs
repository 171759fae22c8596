//! Statistical building blocks: distribution metrics and column correlation

pub mod correlation;
pub mod distribution;

pub use correlation::{compute_matrix, ColumnPair, CorrelationMatrix};
pub use distribution::{analyze, shannon_entropy, DistributionMetrics};
