//! Spatial cross-correlation between feature pairs.
//!
//! The statistic shares Moran's I structure with the product taken across
//! two different centered features, normalized by the geometric mean of
//! their centered sums of squares:
//!
//!   SCC(x, y) = (N / S0) * sum_ij w_ij x~_i y~_j / sqrt(sum x~^2 * sum y~^2)
//!
//! For a symmetric weight matrix the statistic is symmetric in x and y.
//! Significance is permutation-based: one feature's values are repeatedly
//! reassigned across observations with a seeded RNG, each trial drawing an
//! isolated random sequence so results reproduce for a fixed seed.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use spacor_core::{Error, FeatureMatrix, Result, WeightMatrix};

use crate::maybe_rayon::*;
use crate::significance::Alternative;

/// Result of a permutation cross-correlation test
#[derive(Debug, Clone)]
pub struct CrossCorTest {
    /// Observed spatial cross-correlation
    pub statistic: f64,
    /// Empirical permutation p-value (add-one estimator)
    pub p_value: f64,
}

fn center(x: ArrayView1<'_, f64>) -> (Vec<f64>, f64) {
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    let dev: Vec<f64> = x.iter().map(|v| v - mean).collect();
    let sum_sq = dev.iter().map(|d| d * d).sum();
    (dev, sum_sq)
}

fn scc_centered(dx: &[f64], dy: &[f64], weights: &WeightMatrix, norm: f64) -> f64 {
    let w = weights.values();
    let n = dx.len();
    let mut num = 0.0;
    for i in 0..n {
        let mut lag = 0.0;
        for j in 0..n {
            lag += w[(i, j)] * dy[j];
        }
        num += dx[i] * lag;
    }
    (n as f64 / weights.total_weight()) * num / norm
}

/// Spatial cross-correlation between two feature vectors.
///
/// # Errors
/// Length mismatch, zero total weight and zero variance in either feature
/// are reported explicitly.
pub fn spatial_cross_cor(
    x: ArrayView1<'_, f64>,
    y: ArrayView1<'_, f64>,
    weights: &WeightMatrix,
) -> Result<f64> {
    let n = weights.len();
    if x.len() != n || y.len() != n {
        return Err(Error::SizeMismatch {
            what: "feature vector",
            expected: n,
            actual: if x.len() != n { x.len() } else { y.len() },
        });
    }
    if weights.total_weight() <= 0.0 {
        return Err(Error::Algorithm(
            "weight matrix has zero total weight; statistic undefined".into(),
        ));
    }
    let (dx, ssx) = center(x);
    let (dy, ssy) = center(y);
    if ssx < f64::EPSILON || ssy < f64::EPSILON {
        return Err(Error::Algorithm(
            "feature has zero variance; cross-correlation undefined".into(),
        ));
    }
    Ok(scc_centered(&dx, &dy, weights, (ssx * ssy).sqrt()))
}

/// Pairwise spatial cross-correlation over all features of a matrix.
///
/// Returns an F×F matrix aligned to the feature row order. Pairs involving
/// a degenerate (zero-variance) feature are NaN; the rest of the matrix is
/// still computed.
///
/// # Errors
/// Label alignment failures and zero total weight abort the computation.
pub fn spatial_cross_cor_matrix(
    features: &FeatureMatrix,
    weights: &WeightMatrix,
) -> Result<Array2<f64>> {
    let aligned = features.align_to(weights.labels())?;
    let s0 = weights.total_weight();
    if s0 <= 0.0 {
        return Err(Error::Algorithm(
            "weight matrix has zero total weight; statistic undefined".into(),
        ));
    }
    let f = aligned.n_features();
    let n = weights.len();
    let nf = n as f64;
    let w = weights.values();

    // Center every feature once, then reuse spatial lags: lag_i = W x~_i
    let centered: Vec<(Vec<f64>, f64)> =
        (0..f).map(|i| center(aligned.feature(i))).collect();
    let lags: Vec<Vec<f64>> = (0..f)
        .into_par_iter()
        .map(|i| {
            let dx = &centered[i].0;
            (0..n)
                .map(|r| (0..n).map(|c| w[(r, c)] * dx[c]).sum())
                .collect()
        })
        .collect();

    let rows: Vec<Vec<f64>> = (0..f)
        .into_par_iter()
        .map(|a| {
            let (da, ssa) = &centered[a];
            (0..f)
                .map(|b| {
                    let (_, ssb) = &centered[b];
                    if *ssa < f64::EPSILON || *ssb < f64::EPSILON {
                        return f64::NAN;
                    }
                    let num: f64 = da.iter().zip(&lags[b]).map(|(x, l)| x * l).sum();
                    (nf / s0) * num / (ssa * ssb).sqrt()
                })
                .collect()
        })
        .collect();

    let mut out = Array2::zeros((f, f));
    for (a, row) in rows.into_iter().enumerate() {
        for (b, v) in row.into_iter().enumerate() {
            out[(a, b)] = v;
        }
    }
    Ok(out)
}

/// Permutation significance test for spatial cross-correlation.
///
/// Permutes the assignment of `y` values across observations, holding `x`
/// and the weights fixed. Each trial seeds its own RNG from `seed` plus the
/// trial index, so trials are independent of scheduling order.
///
/// # Arguments
/// * `n_permutations` - Empirical null size (default convention: 1000)
///
/// # Errors
/// Same input requirements as [`spatial_cross_cor`], plus a positive
/// permutation count.
pub fn spatial_cross_cor_test(
    x: ArrayView1<'_, f64>,
    y: ArrayView1<'_, f64>,
    weights: &WeightMatrix,
    alternative: Alternative,
    n_permutations: usize,
    seed: u64,
) -> Result<CrossCorTest> {
    if n_permutations == 0 {
        return Err(Error::InvalidParameter {
            name: "n_permutations",
            value: "0".into(),
            reason: "permutation test needs at least one trial".into(),
        });
    }
    let statistic = spatial_cross_cor(x, y, weights)?;

    let (dx, ssx) = center(x);
    let (dy, ssy) = center(y);
    let norm = (ssx * ssy).sqrt();

    let null: Vec<f64> = (0..n_permutations)
        .into_par_iter()
        .map(|trial| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(trial as u64));
            let mut permuted = dy.clone();
            permuted.shuffle(&mut rng);
            scc_centered(&dx, &permuted, weights, norm)
        })
        .collect();

    let m = n_permutations as f64;
    let ge = null.iter().filter(|&&v| v >= statistic).count() as f64;
    let le = null.iter().filter(|&&v| v <= statistic).count() as f64;
    let p_value = match alternative {
        Alternative::Greater => (1.0 + ge) / (1.0 + m),
        Alternative::Less => (1.0 + le) / (1.0 + m),
        Alternative::TwoSided => {
            let tail = ((1.0 + ge) / (1.0 + m)).min((1.0 + le) / (1.0 + m));
            (2.0 * tail).min(1.0)
        }
    };

    Ok(CrossCorTest { statistic, p_value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};
    use spacor_core::{FeatureMatrix, WeightMatrix};

    fn chain_weights(n: usize) -> WeightMatrix {
        let mut w = Array2::zeros((n, n));
        for i in 0..n - 1 {
            w[(i, i + 1)] = 1.0;
            w[(i + 1, i)] = 1.0;
        }
        WeightMatrix::new(w, (0..n).map(|i| i.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_symmetric_in_arguments() {
        let w = chain_weights(12);
        let x: Array1<f64> = (0..12).map(|i| (i as f64).sin()).collect();
        let y: Array1<f64> = (0..12).map(|i| (i as f64 * 0.7).cos()).collect();
        let ab = spatial_cross_cor(x.view(), y.view(), &w).unwrap();
        let ba = spatial_cross_cor(y.view(), x.view(), &w).unwrap();
        assert!((ab - ba).abs() < 1e-12, "swap symmetry for symmetric weights");
    }

    #[test]
    fn test_self_cross_cor_matches_moran_shape() {
        // SCC(x, x) reduces to the Moran numerator over the variance
        let w = chain_weights(10);
        let x: Array1<f64> = (0..10).map(|i| i as f64).collect();
        let scc = spatial_cross_cor(x.view(), x.view(), &w).unwrap();
        assert!(scc > 0.5, "smooth gradient autocorrelates, got {scc}");
    }

    #[test]
    fn test_zero_variance_errors() {
        let w = chain_weights(6);
        let x = Array1::from_elem(6, 2.0);
        let y: Array1<f64> = (0..6).map(|i| i as f64).collect();
        assert!(spatial_cross_cor(x.view(), y.view(), &w).is_err());
    }

    #[test]
    fn test_matrix_nan_isolation() {
        let w = chain_weights(6);
        let mut values = Array2::zeros((3, 6));
        for j in 0..6 {
            values[(0, j)] = j as f64;
            values[(1, j)] = (j as f64).powi(2);
            values[(2, j)] = 1.0; // degenerate
        }
        let features = FeatureMatrix::new(
            values,
            vec!["a".into(), "b".into(), "flat".into()],
            (0..6).map(|i| i.to_string()).collect(),
        )
        .unwrap();
        let m = spatial_cross_cor_matrix(&features, &w).unwrap();
        assert!(m[(0, 1)].is_finite());
        assert!((m[(0, 1)] - m[(1, 0)]).abs() < 1e-12);
        assert!(m[(0, 2)].is_nan() && m[(2, 2)].is_nan());
    }

    #[test]
    fn test_matrix_agrees_with_scalar() {
        let w = chain_weights(8);
        let mut values = Array2::zeros((2, 8));
        for j in 0..8 {
            values[(0, j)] = (j as f64).sin();
            values[(1, j)] = j as f64;
        }
        let features = FeatureMatrix::new(
            values,
            vec!["a".into(), "b".into()],
            (0..8).map(|i| i.to_string()).collect(),
        )
        .unwrap();
        let m = spatial_cross_cor_matrix(&features, &w).unwrap();
        let s = spatial_cross_cor(features.feature(0), features.feature(1), &w).unwrap();
        assert!((m[(0, 1)] - s).abs() < 1e-12);
    }

    #[test]
    fn test_permutation_reproducible() {
        let w = chain_weights(10);
        let x: Array1<f64> = (0..10).map(|i| i as f64).collect();
        let y: Array1<f64> = (0..10).map(|i| i as f64 + (i as f64).sin()).collect();
        let a = spatial_cross_cor_test(x.view(), y.view(), &w, Alternative::Greater, 199, 7)
            .unwrap();
        let b = spatial_cross_cor_test(x.view(), y.view(), &w, Alternative::Greater, 199, 7)
            .unwrap();
        assert_eq!(a.p_value, b.p_value, "fixed seed must reproduce");
        assert_eq!(a.statistic, b.statistic);
    }

    #[test]
    fn test_aligned_gradients_significant() {
        let w = chain_weights(30);
        let x: Array1<f64> = (0..30).map(|i| i as f64).collect();
        let y: Array1<f64> = (0..30).map(|i| i as f64 * 2.0 + 1.0).collect();
        let t = spatial_cross_cor_test(x.view(), y.view(), &w, Alternative::Greater, 499, 0)
            .unwrap();
        assert!(t.statistic > 0.0);
        assert!(t.p_value < 0.05, "aligned gradients, p={}", t.p_value);
    }

    #[test]
    fn test_zero_permutations_rejected() {
        let w = chain_weights(6);
        let x: Array1<f64> = (0..6).map(|i| i as f64).collect();
        let result =
            spatial_cross_cor_test(x.view(), x.view(), &w, Alternative::Greater, 0, 0);
        assert!(result.is_err());
    }
}
