//! Column sample data
//!
//! Sampled values are opaque JSON scalars so one model covers text, numeric,
//! boolean, and temporal columns. Derived counts are computed at construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered sample of values for one column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleData {
    /// Sampled values in row order; `None` is a SQL NULL
    pub values: Vec<Option<Value>>,

    /// Number of sampled rows, including nulls
    pub total_row_count: usize,

    /// Number of null samples
    pub total_null_count: usize,

    /// Shannon entropy of the non-null distribution, if computed
    pub entropy: Option<f64>,
}

impl SampleData {
    /// Creates sample data, deriving the row and null counts
    pub fn new(values: Vec<Option<Value>>) -> Self {
        let total_row_count = values.len();
        let total_null_count = values.iter().filter(|v| v.is_none()).count();
        Self {
            values,
            total_row_count,
            total_null_count,
            entropy: None,
        }
    }

    /// Empty sample
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Number of non-null samples
    pub fn non_null_count(&self) -> usize {
        self.total_row_count - self.total_null_count
    }

    /// Non-null values rendered as strings, in row order
    ///
    /// JSON strings render without quotes; other scalars use their JSON
    /// representation.
    pub fn string_values(&self) -> Vec<String> {
        self.values
            .iter()
            .flatten()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect()
    }

    /// Values coerced to f64 by position; `None` where a value is null or
    /// not numeric-coercible
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|v| v.as_ref().and_then(coerce_numeric))
            .collect()
    }

    /// Values rendered as strings by position; `None` where null
    pub fn string_values_aligned(&self) -> Vec<Option<String>> {
        self.values
            .iter()
            .map(|v| {
                v.as_ref().map(|val| match val {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect()
    }
}

/// Coerces a JSON scalar to f64, accepting numeric strings
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_derived_from_values() {
        let data = SampleData::new(vec![Some(json!("a")), None, Some(json!("b")), None]);
        assert_eq!(data.total_row_count, 4);
        assert_eq!(data.total_null_count, 2);
        assert_eq!(data.non_null_count(), 2);
    }

    #[test]
    fn test_empty_sample() {
        let data = SampleData::empty();
        assert_eq!(data.total_row_count, 0);
        assert_eq!(data.total_null_count, 0);
        assert!(data.string_values().is_empty());
    }

    #[test]
    fn test_string_values_skip_nulls() {
        let data = SampleData::new(vec![Some(json!("x")), None, Some(json!(42))]);
        assert_eq!(data.string_values(), vec!["x".to_string(), "42".to_string()]);
    }

    #[test]
    fn test_numeric_coercion() {
        let data = SampleData::new(vec![
            Some(json!(1.5)),
            Some(json!("2.5")),
            Some(json!("abc")),
            None,
            Some(json!(true)),
        ]);
        assert_eq!(
            data.numeric_values(),
            vec![Some(1.5), Some(2.5), None, None, Some(1.0)]
        );
    }

    #[test]
    fn test_aligned_strings_preserve_positions() {
        let data = SampleData::new(vec![Some(json!("a")), None, Some(json!("b"))]);
        let aligned = data.string_values_aligned();
        assert_eq!(aligned.len(), 3);
        assert!(aligned[1].is_none());
    }
}
