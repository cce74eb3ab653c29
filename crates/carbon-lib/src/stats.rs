//! Statistics and matrix primitives
//!
//! Shared by every analytics component: moments, distances, a two-variable
//! least-squares fit and the dense matrix operations needed for the
//! normal equation.

use crate::error::{AnalyticsError, Result};

/// Row-major dense matrix
pub type Matrix = Vec<Vec<f64>>;

/// Relative magnitude below which a pivot is treated as zero
const PIVOT_TOLERANCE: f64 = 1e-12;

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a precomputed mean
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Slope and intercept of an ordinary least-squares line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a line through `values` indexed by position `0..n`
///
/// Returns `None` for fewer than two values.
pub fn linear_fit(values: &[f64]) -> Option<LinearFit> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i as f64).powi(2)).sum();
    let denom = n * sum_x2 - sum_x.powi(2);
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(LinearFit { slope, intercept })
}

pub fn transpose(matrix: &[Vec<f64>]) -> Matrix {
    let Some(first) = matrix.first() else {
        return Vec::new();
    };
    (0..first.len())
        .map(|col| matrix.iter().map(|row| row[col]).collect())
        .collect()
}

/// Matrix product `a · b`; `a` must have as many columns as `b` has rows
pub fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Matrix {
    let cols = b.first().map(Vec::len).unwrap_or(0);
    let mut result = vec![vec![0.0; cols]; a.len()];
    for (i, row) in a.iter().enumerate() {
        for (k, a_ik) in row.iter().enumerate() {
            for j in 0..cols {
                result[i][j] += a_ik * b[k][j];
            }
        }
    }
    result
}

pub fn multiply_vector(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(vector).map(|(a, b)| a * b).sum())
        .collect()
}

/// Invert a square matrix with Gauss-Jordan elimination and partial pivoting
///
/// At each column the row with the largest-magnitude entry among the
/// remaining rows becomes the pivot row. A pivot that is zero relative to
/// the largest input entry fails with [`AnalyticsError::SingularMatrix`].
pub fn invert(matrix: &[Vec<f64>]) -> Result<Matrix> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return Err(AnalyticsError::DegenerateInput(
            "matrix to invert must be square and non-empty".to_string(),
        ));
    }

    let scale = matrix
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()))
        .max(f64::MIN_POSITIVE);

    let mut augmented: Matrix = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut extended = row.clone();
            extended.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            extended
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| {
                augmented[a][col]
                    .abs()
                    .partial_cmp(&augmented[b][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        augmented.swap(col, pivot_row);

        let pivot = augmented[col][col];
        if !pivot.is_finite() || pivot.abs() <= scale * PIVOT_TOLERANCE {
            return Err(AnalyticsError::SingularMatrix { column: col, pivot });
        }

        for value in augmented[col].iter_mut() {
            *value /= pivot;
        }

        let pivot_values = augmented[col].clone();
        for (row_idx, row) in augmented.iter_mut().enumerate() {
            if row_idx == col {
                continue;
            }
            let factor = row[col];
            if factor == 0.0 {
                continue;
            }
            for (value, p) in row.iter_mut().zip(&pivot_values) {
                *value -= factor * p;
            }
        }
    }

    Ok(augmented.into_iter().map(|row| row[n..].to_vec()).collect())
}
