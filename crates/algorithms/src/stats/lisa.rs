//! Local indicators of spatial association (LISA).
//!
//! Decomposes the global autocorrelation statistic into one contribution
//! per observation:
//!
//!   I_i = (x~_i / m2) * sum_j w_ij x~_j      with m2 = sum x~^2 / N
//!
//! so that sum_i I_i scaled by N/S0 recovers the global statistic. Each
//! observation gets a conditional-permutation p-value: its own value is
//! held fixed while the remaining values are reassigned among the other
//! observations, which rebuilds the local statistic's null from the data.
//! Used by the filtering layer to count how many observations drive a
//! globally significant pattern.

use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use spacor_core::{Error, Result, WeightMatrix};

use crate::maybe_rayon::*;
use crate::significance::Alternative;

/// Local statistic and permutation p-value for one observation
#[derive(Debug, Clone)]
pub struct LisaResult {
    /// Local Moran statistic I_i
    pub statistic: f64,
    /// Conditional permutation p-value; NaN for isolated observations
    pub p_value: f64,
}

/// Local Moran decomposition with conditional permutation p-values.
///
/// Observations with no neighbors contribute a zero statistic and a NaN
/// p-value (no null can be built for them); they never divide by zero.
///
/// # Arguments
/// * `alternative` - Tail for the permutation p-value
/// * `n_permutations` - Trials per observation
/// * `seed` - Base seed; each (observation, trial) derives its own stream
///
/// # Errors
/// Length mismatch and zero-variance features are reported as errors.
pub fn lisa_test(
    x: ArrayView1<'_, f64>,
    weights: &WeightMatrix,
    alternative: Alternative,
    n_permutations: usize,
    seed: u64,
) -> Result<Vec<LisaResult>> {
    let n = weights.len();
    if x.len() != n {
        return Err(Error::SizeMismatch {
            what: "feature vector",
            expected: n,
            actual: x.len(),
        });
    }
    if n_permutations == 0 {
        return Err(Error::InvalidParameter {
            name: "n_permutations",
            value: "0".into(),
            reason: "permutation test needs at least one trial".into(),
        });
    }

    let nf = n as f64;
    let mean = x.iter().sum::<f64>() / nf;
    let dev: Vec<f64> = x.iter().map(|v| v - mean).collect();
    let sum_sq: f64 = dev.iter().map(|d| d * d).sum();
    if sum_sq < f64::EPSILON {
        return Err(Error::Algorithm(
            "feature has zero variance; local statistic undefined".into(),
        ));
    }
    let m2 = sum_sq / nf;
    let w = weights.values();

    let results: Vec<LisaResult> = (0..n)
        .into_par_iter()
        .map(|i| {
            let neighbors = weights.neighbors(i);
            if neighbors.is_empty() {
                return LisaResult {
                    statistic: 0.0,
                    p_value: f64::NAN,
                };
            }
            let lag: f64 = neighbors.iter().map(|&j| w[(i, j)] * dev[j]).sum();
            let statistic = dev[i] / m2 * lag;

            // Conditional null: value i stays put, the rest permute. Only
            // the values landing on neighbor slots matter, so shuffling the
            // other N-1 values and reading the first k is equivalent.
            let others: Vec<f64> = (0..n).filter(|&j| j != i).map(|j| dev[j]).collect();
            let nb_weights: Vec<f64> = neighbors.iter().map(|&j| w[(i, j)]).collect();

            let mut ge = 0usize;
            let mut le = 0usize;
            let mut pool = others;
            for trial in 0..n_permutations {
                let mut rng =
                    StdRng::seed_from_u64(seed ^ ((i as u64) << 24).wrapping_add(trial as u64));
                pool.shuffle(&mut rng);
                let perm_lag: f64 = nb_weights
                    .iter()
                    .zip(pool.iter())
                    .map(|(wt, v)| wt * v)
                    .sum();
                let perm = dev[i] / m2 * perm_lag;
                if perm >= statistic {
                    ge += 1;
                }
                if perm <= statistic {
                    le += 1;
                }
            }

            let m = n_permutations as f64;
            let p_greater = (1.0 + ge as f64) / (1.0 + m);
            let p_less = (1.0 + le as f64) / (1.0 + m);
            let p_value = match alternative {
                Alternative::Greater => p_greater,
                Alternative::Less => p_less,
                Alternative::TwoSided => (2.0 * p_greater.min(p_less)).min(1.0),
            };
            LisaResult { statistic, p_value }
        })
        .collect();

    Ok(results)
}
