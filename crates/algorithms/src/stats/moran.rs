//! Global spatial autocorrelation (Moran's I).
//!
//! Observed statistic, expectation and standard deviation under the
//! randomization null (closed-form moments with the sample-kurtosis term,
//! not simulation), plus a normal-approximation p-value. The bulk entry
//! point computes a whole feature table, isolating degenerate features as
//! NaN rows instead of aborting.

use ndarray::ArrayView1;
use spacor_core::{Error, FeatureMatrix, Result, WeightMatrix};

use crate::maybe_rayon::*;
use crate::significance::{bh_adjust, p_value, Alternative};

/// Result of a global autocorrelation test for one feature
#[derive(Debug, Clone)]
pub struct MoranResult {
    /// Observed Moran's I
    pub observed: f64,
    /// Expected I under complete spatial randomness: -1/(N-1)
    pub expected: f64,
    /// Standard deviation under the randomization null
    pub sd: f64,
    /// Normal-approximation p-value
    pub p_value: f64,
}

/// One row of the bulk autocorrelation table
#[derive(Debug, Clone)]
pub struct FeatureStats {
    pub feature: String,
    pub observed: f64,
    pub expected: f64,
    pub sd: f64,
    pub p_value: f64,
    /// BH-adjusted p-value across the table
    pub p_adj: f64,
}

/// Global Moran's I with analytic randomization-null moments.
///
/// I = (N/S0) * sum_ij w_ij x~_i x~_j / sum_i x~_i^2 with x~ mean-centered.
/// The variance uses the standard closed form in S0, S1, S2 and the sample
/// kurtosis b2.
///
/// # Errors
/// Zero-variance features, zero total weight, length mismatch and N < 4 are
/// reported as errors; nothing is silently mapped to zero.
pub fn moran_test(
    x: ArrayView1<'_, f64>,
    weights: &WeightMatrix,
    alternative: Alternative,
) -> Result<MoranResult> {
    let n = weights.len();
    if x.len() != n {
        return Err(Error::SizeMismatch {
            what: "feature vector",
            expected: n,
            actual: x.len(),
        });
    }
    if n < 4 {
        return Err(Error::Algorithm(
            "autocorrelation moments require at least 4 observations".into(),
        ));
    }
    let s0 = weights.total_weight();
    if s0 <= 0.0 {
        return Err(Error::Algorithm(
            "weight matrix has zero total weight; statistic undefined".into(),
        ));
    }

    let nf = n as f64;
    let mean = x.iter().sum::<f64>() / nf;
    let dev: Vec<f64> = x.iter().map(|v| v - mean).collect();
    let sum_sq: f64 = dev.iter().map(|d| d * d).sum();
    if sum_sq < f64::EPSILON {
        return Err(Error::Algorithm(
            "feature has zero variance; autocorrelation undefined".into(),
        ));
    }

    let w = weights.values();
    let mut numerator = 0.0;
    for i in 0..n {
        let mut lag = 0.0;
        for j in 0..n {
            lag += w[(i, j)] * dev[j];
        }
        numerator += dev[i] * lag;
    }
    let observed = (nf / s0) * (numerator / sum_sq);
    let expected = -1.0 / (nf - 1.0);

    // Randomization-null variance: S1, S2 and sample kurtosis b2
    let mut s1 = 0.0;
    let mut s2 = 0.0;
    for i in 0..n {
        let mut row_sum = 0.0;
        let mut col_sum = 0.0;
        for j in 0..n {
            let wij = w[(i, j)];
            let wji = w[(j, i)];
            s1 += (wij + wji) * (wij + wji);
            row_sum += wij;
            col_sum += wji;
        }
        s2 += (row_sum + col_sum) * (row_sum + col_sum);
    }
    s1 *= 0.5;

    let b2 = (dev.iter().map(|d| d.powi(4)).sum::<f64>() / nf) / (sum_sq / nf).powi(2);
    let s0_sq = s0 * s0;
    let variance = (nf * ((nf * nf - 3.0 * nf + 3.0) * s1 - nf * s2 + 3.0 * s0_sq)
        - b2 * ((nf * nf - nf) * s1 - 2.0 * nf * s2 + 6.0 * s0_sq))
        / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0) * s0_sq)
        - expected * expected;
    let sd = variance.max(0.0).sqrt();

    Ok(MoranResult {
        observed,
        expected,
        sd,
        p_value: p_value(observed, expected, sd, alternative),
    })
}

/// Autocorrelation table over every feature of a matrix.
///
/// Features are aligned to the weight matrix's label order first; a label
/// missing from the features is a hard error. Per-feature degeneracies
/// (zero variance) become NaN rows, and BH adjustment runs across the
/// remaining finite p-values.
///
/// # Errors
/// Only input-shape and label errors abort the table; see above.
pub fn moran_table(
    features: &FeatureMatrix,
    weights: &WeightMatrix,
    alternative: Alternative,
) -> Result<Vec<FeatureStats>> {
    let aligned = features.align_to(weights.labels())?;
    if weights.total_weight() <= 0.0 {
        return Err(Error::Algorithm(
            "weight matrix has zero total weight; statistic undefined".into(),
        ));
    }

    let results: Vec<(String, MoranResult)> = (0..aligned.n_features())
        .into_par_iter()
        .map(|i| {
            let label = aligned.feature_labels()[i].clone();
            let result = moran_test(aligned.feature(i), weights, alternative).unwrap_or(
                MoranResult {
                    observed: f64::NAN,
                    expected: f64::NAN,
                    sd: f64::NAN,
                    p_value: f64::NAN,
                },
            );
            (label, result)
        })
        .collect();

    let p_values: Vec<f64> = results.iter().map(|(_, r)| r.p_value).collect();
    let p_adj = bh_adjust(&p_values);

    Ok(results
        .into_iter()
        .zip(p_adj)
        .map(|((feature, r), adj)| FeatureStats {
            feature,
            observed: r.observed,
            expected: r.expected,
            sd: r.sd,
            p_value: r.p_value,
            p_adj: adj,
        })
        .collect())
}
