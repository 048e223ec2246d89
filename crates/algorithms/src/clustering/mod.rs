//! Grouping significant features into spatial patterns.
//!
//! - **hierarchy**: agglomerative clustering over a distance matrix
//! - **treecut**: cluster extraction strategies (fixed-height, dynamic)
//! - distance transform of a cross-correlation matrix and per-cluster
//!   summary scores (z-score, optional winsorization, member averaging)

pub mod hierarchy;
pub mod treecut;

use std::collections::BTreeMap;

use ndarray::Array2;
use spacor_core::{Error, FeatureMatrix, Result};

pub use hierarchy::{hierarchical_cluster, Dendrogram, Linkage, Merge};
pub use treecut::{CutStrategy, DynamicCut, FixedHeightCut};

/// Parameters for pattern grouping
#[derive(Debug, Clone)]
pub struct GroupParams {
    /// Linkage criterion (default: complete)
    pub linkage: Linkage,
    /// Exponent applied to the shifted distance (default: 1)
    pub power: f64,
    /// Minimum members for a cluster (default: 2)
    pub min_cluster_size: usize,
    /// Dynamic-cut sensitivity, 0..=4 (default: 2)
    pub deep_split: u8,
    /// Per-tail quantile for winsorizing member features (default: 0, off)
    pub trim_fraction: f64,
}

impl Default for GroupParams {
    fn default() -> Self {
        Self {
            linkage: Linkage::Complete,
            power: 1.0,
            min_cluster_size: 2,
            deep_split: 2,
            trim_fraction: 0.0,
        }
    }
}

/// Output of the grouping pipeline
#[derive(Debug, Clone)]
pub struct PatternGroups {
    /// Agglomeration history over the features
    pub dendrogram: Dendrogram,
    /// Feature label -> cluster label (0 = unassigned)
    pub assignments: Vec<(String, i32)>,
    /// Cluster label -> representative per-observation score vector
    pub summaries: BTreeMap<i32, Vec<f64>>,
}

/// Turn a cross-correlation matrix into a clustering distance matrix.
///
/// dist = (-scc - min(-scc))^power: the negated matrix shifted to be
/// non-negative, so strong positive cross-correlation becomes small
/// distance. The diagonal is forced to zero.
///
/// # Errors
/// Non-square or non-finite input is rejected; filter NaN features out
/// before grouping.
pub fn cross_cor_distance(scc: &Array2<f64>, power: f64) -> Result<Array2<f64>> {
    let n = scc.nrows();
    if scc.ncols() != n {
        return Err(Error::NonSquareWeights {
            rows: n,
            cols: scc.ncols(),
        });
    }
    if scc.iter().any(|v| !v.is_finite()) {
        return Err(Error::Algorithm(
            "cross-correlation matrix contains non-finite entries".into(),
        ));
    }
    let shift = scc.iter().fold(f64::INFINITY, |m, &v| m.min(-v));
    let mut dist = scc.mapv(|v| (-v - shift).powf(power));
    for i in 0..n {
        dist[(i, i)] = 0.0;
    }
    Ok(dist)
}

/// Group already-significant features into spatial patterns.
///
/// Transforms the cross-correlation matrix into distances, clusters
/// hierarchically, extracts clusters with the dynamic cut, and summarizes
/// every cluster as one representative score per observation.
///
/// # Arguments
/// * `features` - The significant features (rows must match `scc` order),
///   columns aligned to whatever weight matrix produced `scc`
/// * `scc` - Pairwise spatial cross-correlation among those features
///
/// # Errors
/// Shape mismatch between `features` and `scc`, or invalid matrix content.
pub fn group_patterns(
    features: &FeatureMatrix,
    scc: &Array2<f64>,
    params: &GroupParams,
) -> Result<PatternGroups> {
    if scc.nrows() != features.n_features() {
        return Err(Error::SizeMismatch {
            what: "cross-correlation matrix",
            expected: features.n_features(),
            actual: scc.nrows(),
        });
    }

    let dist = cross_cor_distance(scc, params.power)?;
    let dendrogram = hierarchical_cluster(&dist, params.linkage)?;
    let labels = DynamicCut {
        deep_split: params.deep_split,
        min_cluster_size: params.min_cluster_size,
    }
    .cut(&dendrogram);

    let assignments: Vec<(String, i32)> = features
        .feature_labels()
        .iter()
        .cloned()
        .zip(labels.iter().copied())
        .collect();

    let mut summaries = BTreeMap::new();
    let mut by_label: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        if label > 0 {
            by_label.entry(label).or_default().push(row);
        }
    }
    for (label, members) in by_label {
        summaries.insert(label, summarize_cluster(features, &members, params.trim_fraction));
    }

    Ok(PatternGroups {
        dendrogram,
        assignments,
        summaries,
    })
}

/// One representative score per observation for a cluster of features.
///
/// Multi-member clusters: z-score each member across observations,
/// winsorize, average the members per observation, re-z-score the result.
/// Singletons: winsorize then z-score the lone feature directly.
fn summarize_cluster(features: &FeatureMatrix, members: &[usize], trim_fraction: f64) -> Vec<f64> {
    let n = features.n_observations();
    if members.len() == 1 {
        let row = features.feature(members[0]).to_vec();
        return zscore(&winsorize(&row, trim_fraction));
    }
    let mut mean = vec![0.0; n];
    for &m in members {
        let row = winsorize(&zscore(&features.feature(m).to_vec()), trim_fraction);
        for (acc, v) in mean.iter_mut().zip(row) {
            *acc += v;
        }
    }
    for v in &mut mean {
        *v /= members.len() as f64;
    }
    zscore(&mean)
}

/// Standardize to zero mean and unit variance; a constant vector maps to zeros
fn zscore(x: &[f64]) -> Vec<f64> {
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    let var = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let sd = var.sqrt();
    if sd < f64::EPSILON {
        return vec![0.0; x.len()];
    }
    x.iter().map(|v| (v - mean) / sd).collect()
}

/// Clip values below the `trim` quantile and above the `1 - trim` quantile
fn winsorize(x: &[f64], trim: f64) -> Vec<f64> {
    if trim <= 0.0 || x.len() < 2 {
        return x.to_vec();
    }
    let trim = trim.min(0.5);
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    // Mirrored index rounding: ceil for the lower bound, floor for the upper,
    // so both tails pull strictly inward for any positive trim.
    let lo_idx = ((x.len() as f64 - 1.0) * trim).ceil() as usize;
    let hi_idx = (((x.len() as f64 - 1.0) * (1.0 - trim)).floor() as usize).max(lo_idx);
    let lo = sorted[lo_idx];
    let hi = sorted[hi_idx];
    x.iter().map(|&v| v.clamp(lo, hi)).collect()
}
