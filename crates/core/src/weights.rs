//! Spatial weight matrices.
//!
//! A weight matrix records neighbor relationships between N labeled
//! observations: entry (i, j) is a non-negative weight, zero meaning
//! "not neighbors". Matrices are symmetric with a zero diagonal and are
//! never mutated in place; every operation returns a new matrix.

use ndarray::Array2;

use crate::{Error, Result};

/// Tolerance for symmetry validation
const SYMMETRY_EPS: f64 = 1e-9;

/// Symmetric, zero-diagonal N×N spatial weight matrix with row labels.
#[derive(Debug, Clone)]
pub struct WeightMatrix {
    weights: Array2<f64>,
    labels: Vec<String>,
}

impl WeightMatrix {
    /// Validate and wrap an N×N weight matrix.
    ///
    /// # Errors
    /// Returns an error if the matrix is not square, the label count does not
    /// match, any weight is negative or non-finite, the diagonal is non-zero,
    /// or the matrix is asymmetric beyond a small tolerance.
    pub fn new(weights: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        let (rows, cols) = weights.dim();
        if rows != cols {
            return Err(Error::NonSquareWeights { rows, cols });
        }
        if labels.len() != rows {
            return Err(Error::SizeMismatch {
                what: "weight labels",
                expected: rows,
                actual: labels.len(),
            });
        }
        for i in 0..rows {
            if weights[(i, i)] != 0.0 {
                return Err(Error::Algorithm(format!(
                    "weight matrix has non-zero diagonal at {i}"
                )));
            }
            for j in 0..i {
                let a = weights[(i, j)];
                let b = weights[(j, i)];
                if !a.is_finite() || a < 0.0 || !b.is_finite() || b < 0.0 {
                    return Err(Error::Algorithm(format!(
                        "invalid weight at ({i}, {j}): {a} / {b}"
                    )));
                }
                if (a - b).abs() > SYMMETRY_EPS {
                    return Err(Error::Algorithm(format!(
                        "weight matrix asymmetric at ({i}, {j}): {a} vs {b}"
                    )));
                }
            }
        }
        Ok(Self { weights, labels })
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.weights.nrows()
    }

    /// True if the matrix is empty
    pub fn is_empty(&self) -> bool {
        self.weights.nrows() == 0
    }

    /// Observation labels in row order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The underlying N×N weight values
    pub fn values(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Weight between observations `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.weights[(i, j)]
    }

    /// Sum of all weights (S0 in the autocorrelation literature)
    pub fn total_weight(&self) -> f64 {
        self.weights.sum()
    }

    /// Neighbor indices of observation `i` (strictly positive weights)
    pub fn neighbors(&self, i: usize) -> Vec<usize> {
        self.weights
            .row(i)
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(|(j, _)| j)
            .collect()
    }

    /// New matrix with every strictly positive entry replaced by 1.
    ///
    /// Idempotent: binarizing twice equals binarizing once.
    pub fn binarized(&self) -> Self {
        let weights = self.weights.mapv(|w| if w > 0.0 { 1.0 } else { 0.0 });
        Self {
            weights,
            labels: self.labels.clone(),
        }
    }

    /// New matrix with every entry exceeding `max_distance` zeroed (edge removed).
    pub fn filtered(&self, max_distance: f64) -> Self {
        let weights = self
            .weights
            .mapv(|w| if w > max_distance { 0.0 } else { w });
        Self {
            weights,
            labels: self.labels.clone(),
        }
    }

    /// New matrix keeping only edges that cross between two label sets.
    ///
    /// Within-set edges and edges touching observations outside both sets are
    /// zeroed. Used to measure cross-correlation restricted to inter-group
    /// neighbor pairs.
    ///
    /// # Errors
    /// Returns an error if any requested label is not present.
    pub fn between(&self, set_a: &[String], set_b: &[String]) -> Result<Self> {
        let index = |wanted: &[String]| -> Result<Vec<usize>> {
            wanted
                .iter()
                .map(|l| {
                    self.labels
                        .iter()
                        .position(|x| x == l)
                        .ok_or_else(|| Error::LabelNotFound(l.clone()))
                })
                .collect()
        };
        let a = index(set_a)?;
        let b = index(set_b)?;
        let in_a: Vec<bool> = {
            let mut v = vec![false; self.len()];
            for &i in &a {
                v[i] = true;
            }
            v
        };
        let in_b: Vec<bool> = {
            let mut v = vec![false; self.len()];
            for &i in &b {
                v[i] = true;
            }
            v
        };
        let mut weights = Array2::zeros(self.weights.dim());
        for i in 0..self.len() {
            for j in 0..self.len() {
                let crosses = (in_a[i] && in_b[j]) || (in_b[i] && in_a[j]);
                if crosses {
                    weights[(i, j)] = self.weights[(i, j)];
                }
            }
        }
        Ok(Self {
            weights,
            labels: self.labels.clone(),
        })
    }
}
