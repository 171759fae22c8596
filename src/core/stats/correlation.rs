//! Pairwise column correlation
//!
//! Numeric pairs use the absolute Pearson coefficient; any pair involving a
//! categorical column uses Cramér's V. Both land in [0, 1] so downstream
//! grouping treats them uniformly. A pair that cannot be computed (too few
//! aligned values, zero variance, degenerate contingency table) scores 0
//! and the matrix build continues.

use crate::domain::{ColumnInfo, ColumnRef, SampleData};
use std::collections::HashMap;

/// Canonically ordered, unordered column pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPair(ColumnRef, ColumnRef);

impl ColumnPair {
    /// Creates a pair; member order does not matter
    pub fn new(a: ColumnRef, b: ColumnRef) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// First member in canonical order
    pub fn first(&self) -> &ColumnRef {
        &self.0
    }

    /// Second member in canonical order
    pub fn second(&self) -> &ColumnRef {
        &self.1
    }
}

/// Symmetric correlation matrix with an implicit diagonal
#[derive(Debug, Clone, Default)]
pub struct CorrelationMatrix {
    values: HashMap<ColumnPair, f64>,
}

impl CorrelationMatrix {
    /// Empty matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pair's coefficient
    pub fn insert(&mut self, a: ColumnRef, b: ColumnRef, value: f64) {
        self.values.insert(ColumnPair::new(a, b), value);
    }

    /// Coefficient for a pair, in either order; 0.0 when absent
    pub fn get(&self, a: &ColumnRef, b: &ColumnRef) -> f64 {
        self.values
            .get(&ColumnPair::new(a.clone(), b.clone()))
            .copied()
            .unwrap_or(0.0)
    }

    /// All recorded pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&ColumnPair, f64)> {
        self.values.iter().map(|(k, &v)| (k, v))
    }

    /// Number of recorded pairs
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the matrix holds no pairs
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Minimum positionally aligned numeric pairs for Pearson
const MIN_NUMERIC_PAIRS: usize = 3;

/// Computes the pairwise correlation matrix for a set of columns
///
/// Fewer than two columns yields an empty matrix.
pub fn compute_matrix(data: &[(&ColumnInfo, &SampleData)]) -> CorrelationMatrix {
    let mut matrix = CorrelationMatrix::new();

    for i in 0..data.len() {
        for j in (i + 1)..data.len() {
            let (col_a, samples_a) = data[i];
            let (col_b, samples_b) = data[j];

            let value = if col_a.is_numeric && col_b.is_numeric {
                pearson(samples_a, samples_b)
            } else {
                cramers_v(samples_a, samples_b)
            };

            let value = match value {
                Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
                _ => {
                    tracing::debug!(
                        column_a = %col_a.column_ref(),
                        column_b = %col_b.column_ref(),
                        "Correlation not computable for pair, recording 0"
                    );
                    0.0
                }
            };

            matrix.insert(col_a.column_ref(), col_b.column_ref(), value);
        }
    }

    matrix
}

/// Absolute Pearson correlation over positionally aligned numeric pairs
///
/// Returns `None` with fewer than [`MIN_NUMERIC_PAIRS`] coercible pairs or
/// when either side has zero variance.
fn pearson(a: &SampleData, b: &SampleData) -> Option<f64> {
    let xs = a.numeric_values();
    let ys = b.numeric_values();

    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < MIN_NUMERIC_PAIRS {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return None;
    }

    let r = (cov / denom).abs();
    if r.is_nan() {
        None
    } else {
        Some(r)
    }
}

/// Cramér's V over positionally aligned non-null pairs
///
/// Requires at least two distinct values on each side. `V = sqrt(χ² / (n ·
/// (min(r,c) − 1)))`, clamped into [0, 1].
fn cramers_v(a: &SampleData, b: &SampleData) -> Option<f64> {
    let xs = a.string_values_aligned();
    let ys = b.string_values_aligned();

    let pairs: Vec<(String, String)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return None;
    }

    let mut row_labels: Vec<&str> = Vec::new();
    let mut col_labels: Vec<&str> = Vec::new();
    for (x, y) in &pairs {
        if !row_labels.contains(&x.as_str()) {
            row_labels.push(x);
        }
        if !col_labels.contains(&y.as_str()) {
            col_labels.push(y);
        }
    }

    let rows = row_labels.len();
    let cols = col_labels.len();
    if rows < 2 || cols < 2 {
        return None;
    }

    let mut table = vec![vec![0usize; cols]; rows];
    for (x, y) in &pairs {
        let r = row_labels.iter().position(|l| l == x).expect("label present");
        let c = col_labels.iter().position(|l| l == y).expect("label present");
        table[r][c] += 1;
    }

    let n = pairs.len() as f64;
    let row_totals: Vec<f64> = table
        .iter()
        .map(|row| row.iter().sum::<usize>() as f64)
        .collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|c| table.iter().map(|row| row[c]).sum::<usize>() as f64)
        .collect();

    let mut chi_square = 0.0;
    for r in 0..rows {
        for c in 0..cols {
            let expected = row_totals[r] * col_totals[c] / n;
            if expected > 0.0 {
                let diff = table[r][c] as f64 - expected;
                chi_square += diff * diff / expected;
            }
        }
    }

    let min_dim = (rows.min(cols) - 1) as f64;
    let v = (chi_square / (n * min_dim)).sqrt();
    if v.is_nan() {
        None
    } else {
        Some(v.clamp(0.0, 1.0))
    }
}
