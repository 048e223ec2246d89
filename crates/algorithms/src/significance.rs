//! Significance calibration and pattern filtering.
//!
//! - **Alternative**: closed enumeration of the alternative hypothesis
//! - **p_value**: normal-approximation p from (observed, expected, sd)
//! - **bh_adjust**: Benjamini-Hochberg multiple-testing correction
//! - **filter_patterns**: alpha + driving-fraction selection over a
//!   statistics table, using the local (LISA) decomposition to reject
//!   patterns carried by too few observations

use spacor_core::{Error, FeatureMatrix, Result, WeightMatrix};

use crate::stats::{lisa_test, FeatureStats};

/// Alternative hypothesis for a one- or two-sided test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alternative {
    /// Right tail: statistic larger than expected
    #[default]
    Greater,
    /// Left tail: statistic smaller than expected
    Less,
    /// Doubled minimum tail, capped at 1
    TwoSided,
}

impl std::str::FromStr for Alternative {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "greater" => Ok(Self::Greater),
            "less" => Ok(Self::Less),
            "two.sided" | "two-sided" | "two_sided" => Ok(Self::TwoSided),
            other => Err(Error::InvalidParameter {
                name: "alternative",
                value: other.to_string(),
                reason: "expected one of greater, less, two.sided".into(),
            }),
        }
    }
}

/// Approximate CDF of the standard normal distribution.
/// Uses the Abramowitz & Stegun approximation (error < 7.5e-8).
pub fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let t = 1.0 / (1.0 + 0.2316419 * x.abs());
    let d = 0.3989422804014327; // 1/sqrt(2*pi)
    let p = d * (-x * x / 2.0).exp()
        * (t * (0.3193815
            + t * (-0.3565638 + t * (1.781478 + t * (-1.821256 + t * 1.330274)))));

    if x > 0.0 {
        1.0 - p
    } else {
        p
    }
}

/// Normal-approximation p-value for an observed statistic.
///
/// Returns NaN when `sd` is non-positive or any input is non-finite, so
/// degenerate statistics propagate as missing rather than as false
/// negatives.
pub fn p_value(observed: f64, expected: f64, sd: f64, alternative: Alternative) -> f64 {
    if !observed.is_finite() || !expected.is_finite() || !(sd > 0.0) {
        return f64::NAN;
    }
    let z = (observed - expected) / sd;
    match alternative {
        Alternative::Greater => 1.0 - normal_cdf(z),
        Alternative::Less => normal_cdf(z),
        Alternative::TwoSided => {
            let upper = 1.0 - normal_cdf(z);
            let lower = normal_cdf(z);
            (2.0 * upper.min(lower)).min(1.0)
        }
    }
}

/// Benjamini-Hochberg adjustment across a set of p-values.
///
/// NaN entries are preserved as NaN and excluded from the effective number
/// of tests.
pub fn bh_adjust(p_values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..p_values.len())
        .filter(|&i| p_values[i].is_finite())
        .collect();
    let m = order.len();
    order.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut adjusted = vec![f64::NAN; p_values.len()];
    let mut running_min = f64::INFINITY;
    for (rank, &i) in order.iter().enumerate().rev() {
        let candidate = p_values[i] * m as f64 / (rank + 1) as f64;
        running_min = running_min.min(candidate).min(1.0);
        adjusted[i] = running_min;
    }
    adjusted
}

/// Parameters for significance-based pattern filtering
#[derive(Debug, Clone)]
pub struct FilterParams {
    /// Significance threshold (default: 0.05)
    pub alpha: f64,
    /// Minimum fraction of observations with a significant local statistic (default: 0.05)
    pub min_fraction: f64,
    /// Use BH-adjusted p-values from the table (default: true)
    pub adjust: bool,
    /// Alternative for the local permutation test (default: greater)
    pub alternative: Alternative,
    /// Permutations for the local test (default: 1000)
    pub n_permutations: usize,
    /// Base seed for the local permutation test
    pub seed: u64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            min_fraction: 0.05,
            adjust: true,
            alternative: Alternative::Greater,
            n_permutations: 1000,
            seed: 0,
        }
    }
}

/// A feature retained by [`filter_patterns`], with its statistics record and
/// the fraction of observations driving its significance.
#[derive(Debug, Clone)]
pub struct FilteredPattern {
    pub feature: String,
    pub stats: FeatureStats,
    /// Fraction of observations whose local statistic is significant at alpha
    pub driving_fraction: f64,
}

/// Filter a statistics table down to robustly significant spatial patterns.
///
/// A feature passes when its (adjusted) p-value is below `alpha` AND the
/// fraction of observations with a significant LISA p-value (same alpha)
/// exceeds `min_fraction`. NaN p-values never pass.
///
/// # Arguments
/// * `features` - Feature matrix (observations a superset of weight labels)
/// * `table` - Per-feature statistics from the autocorrelation pass
/// * `weights` - Spatial weight matrix
/// * `params` - Thresholds and local-test configuration
///
/// # Returns
/// Retained features with their statistic records and driving fractions, in
/// table order.
///
/// # Errors
/// Propagates label alignment failures; a degenerate feature inside the loop
/// is skipped, not fatal.
pub fn filter_patterns(
    features: &FeatureMatrix,
    table: &[FeatureStats],
    weights: &WeightMatrix,
    params: &FilterParams,
) -> Result<Vec<FilteredPattern>> {
    let aligned = features.align_to(weights.labels())?;
    let n = weights.len() as f64;

    let mut kept = Vec::new();
    for record in table {
        let p = if params.adjust {
            record.p_adj
        } else {
            record.p_value
        };
        if !p.is_finite() || p >= params.alpha {
            continue;
        }
        let x = aligned.feature_by_label(&record.feature)?;
        let Ok(local) = lisa_test(
            x,
            weights,
            params.alternative,
            params.n_permutations,
            params.seed,
        ) else {
            // Degenerate feature: treat as non-significant, keep going
            continue;
        };
        let significant = local
            .iter()
            .filter(|r| r.p_value.is_finite() && r.p_value < params.alpha)
            .count();
        let driving_fraction = significant as f64 / n;
        if driving_fraction > params.min_fraction {
            kept.push(FilteredPattern {
                feature: record.feature.clone(),
                stats: record.clone(),
                driving_fraction,
            });
        }
    }
    Ok(kept)
}
