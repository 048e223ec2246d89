//! Feature matrices and label-based alignment.
//!
//! Features are stored as an F×N matrix: one row per measured feature, one
//! column per observation. Before any statistic is computed, columns must be
//! aligned to the weight matrix's row order; [`FeatureMatrix::align_to`]
//! makes that step explicit and fails hard on missing labels.

use ndarray::{Array2, ArrayView1};

use crate::{Error, Result};

/// F×N matrix of feature values with row (feature) and column (observation) labels.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    values: Array2<f64>,
    feature_labels: Vec<String>,
    observation_labels: Vec<String>,
}

impl FeatureMatrix {
    /// Wrap an F×N value matrix with its labels.
    ///
    /// # Errors
    /// Returns an error if label counts do not match the matrix shape or if
    /// labels repeat within either axis.
    pub fn new(
        values: Array2<f64>,
        feature_labels: Vec<String>,
        observation_labels: Vec<String>,
    ) -> Result<Self> {
        if feature_labels.len() != values.nrows() {
            return Err(Error::SizeMismatch {
                what: "feature labels",
                expected: values.nrows(),
                actual: feature_labels.len(),
            });
        }
        if observation_labels.len() != values.ncols() {
            return Err(Error::SizeMismatch {
                what: "observation labels",
                expected: values.ncols(),
                actual: observation_labels.len(),
            });
        }
        for axis in [&feature_labels, &observation_labels] {
            let mut seen = std::collections::HashSet::with_capacity(axis.len());
            for label in axis.iter() {
                if !seen.insert(label.as_str()) {
                    return Err(Error::DuplicateLabel(label.clone()));
                }
            }
        }
        Ok(Self {
            values,
            feature_labels,
            observation_labels,
        })
    }

    /// Number of features (rows)
    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    /// Number of observations (columns)
    pub fn n_observations(&self) -> usize {
        self.values.ncols()
    }

    /// Feature labels in row order
    pub fn feature_labels(&self) -> &[String] {
        &self.feature_labels
    }

    /// Observation labels in column order
    pub fn observation_labels(&self) -> &[String] {
        &self.observation_labels
    }

    /// The underlying F×N values
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Row view for feature index `i`
    pub fn feature(&self, i: usize) -> ArrayView1<'_, f64> {
        self.values.row(i)
    }

    /// Row view for a feature by label
    ///
    /// # Errors
    /// Returns an error if the label is unknown.
    pub fn feature_by_label(&self, label: &str) -> Result<ArrayView1<'_, f64>> {
        let i = self
            .feature_labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| Error::LabelNotFound(label.to_string()))?;
        Ok(self.values.row(i))
    }

    /// New matrix with columns subset and reordered to `labels`.
    ///
    /// This is the explicit realignment step between feature data and a
    /// weight matrix: the feature observations must be a superset of the
    /// requested labels.
    ///
    /// # Errors
    /// Returns an error naming the first requested label absent from this
    /// matrix's observations.
    pub fn align_to(&self, labels: &[String]) -> Result<Self> {
        let mut position = std::collections::HashMap::with_capacity(self.observation_labels.len());
        for (i, l) in self.observation_labels.iter().enumerate() {
            position.insert(l.as_str(), i);
        }
        let order: Vec<usize> = labels
            .iter()
            .map(|l| {
                position
                    .get(l.as_str())
                    .copied()
                    .ok_or_else(|| Error::LabelNotFound(l.clone()))
            })
            .collect::<Result<_>>()?;
        let mut values = Array2::zeros((self.values.nrows(), order.len()));
        for (new_col, &old_col) in order.iter().enumerate() {
            values
                .column_mut(new_col)
                .assign(&self.values.column(old_col));
        }
        Ok(Self {
            values,
            feature_labels: self.feature_labels.clone(),
            observation_labels: labels.to_vec(),
        })
    }

    /// New matrix keeping only the named feature rows, in the given order.
    ///
    /// # Errors
    /// Returns an error for any unknown feature label.
    pub fn select_features(&self, labels: &[String]) -> Result<Self> {
        let order: Vec<usize> = labels
            .iter()
            .map(|l| {
                self.feature_labels
                    .iter()
                    .position(|x| x == l)
                    .ok_or_else(|| Error::LabelNotFound(l.clone()))
            })
            .collect::<Result<_>>()?;
        let mut values = Array2::zeros((order.len(), self.values.ncols()));
        for (new_row, &old_row) in order.iter().enumerate() {
            values.row_mut(new_row).assign(&self.values.row(old_row));
        }
        Ok(Self {
            values,
            feature_labels: labels.to_vec(),
            observation_labels: self.observation_labels.clone(),
        })
    }
}
