//! Point sets: labeled observation coordinates in 2D or 3D.

use ndarray::Array2;

use crate::{Error, Result};

/// A labeled set of N observation positions of uniform dimensionality (2 or 3).
///
/// Coordinates are immutable after construction. Labels identify observations
/// across the weight matrix and feature matrices; when none are supplied,
/// sequential labels `"0".."N-1"` are synthesized.
#[derive(Debug, Clone)]
pub struct PointSet {
    coords: Array2<f64>,
    labels: Vec<String>,
}

impl PointSet {
    /// Create a point set from an N×dim coordinate matrix and per-row labels.
    ///
    /// # Errors
    /// Returns an error if dim is not 2 or 3, the label count does not match
    /// the row count, a label repeats, or any coordinate is non-finite.
    pub fn new(coords: Array2<f64>, labels: Vec<String>) -> Result<Self> {
        let dim = coords.ncols();
        if dim != 2 && dim != 3 {
            return Err(Error::InvalidParameter {
                name: "coords",
                value: format!("{}x{}", coords.nrows(), dim),
                reason: "positions must be 2- or 3-dimensional".into(),
            });
        }
        if labels.len() != coords.nrows() {
            return Err(Error::SizeMismatch {
                what: "point labels",
                expected: coords.nrows(),
                actual: labels.len(),
            });
        }
        let mut seen = std::collections::HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(Error::DuplicateLabel(label.clone()));
            }
        }
        if coords.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "coords",
                value: "non-finite".into(),
                reason: "coordinates must be finite".into(),
            });
        }
        Ok(Self { coords, labels })
    }

    /// Create a point set with synthesized sequential labels.
    ///
    /// # Errors
    /// Same dimensionality and finiteness checks as [`PointSet::new`].
    pub fn unlabeled(coords: Array2<f64>) -> Result<Self> {
        let labels = (0..coords.nrows()).map(|i| i.to_string()).collect();
        Self::new(coords, labels)
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.coords.nrows()
    }

    /// True if the set holds no observations
    pub fn is_empty(&self) -> bool {
        self.coords.nrows() == 0
    }

    /// Coordinate dimensionality (2 or 3)
    pub fn dim(&self) -> usize {
        self.coords.ncols()
    }

    /// Original (unperturbed) coordinates, N×dim
    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }

    /// Observation labels in row order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Euclidean distance between observations `i` and `j` in original coordinates
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.coords
            .row(i)
            .iter()
            .zip(self.coords.row(j).iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Coordinates with exact duplicate rows perturbed apart.
    ///
    /// Every repeat occurrence of a coordinate row is shifted component-wise
    /// by `epsilon` times its occurrence index, so coincident points never
    /// reach the triangulation. The returned matrix is for internal geometric
    /// use only; distances and labels always refer to the original rows.
    pub fn deduplicated(&self, epsilon: f64) -> Array2<f64> {
        let mut out = self.coords.clone();
        let mut seen: std::collections::HashMap<Vec<u64>, usize> =
            std::collections::HashMap::new();
        for i in 0..out.nrows() {
            let key: Vec<u64> = out.row(i).iter().map(|v| v.to_bits()).collect();
            let count = seen.entry(key).or_insert(0);
            if *count > 0 {
                let shift = epsilon * *count as f64;
                for v in out.row_mut(i) {
                    *v += shift;
                }
            }
            *count += 1;
        }
        out
    }
}
