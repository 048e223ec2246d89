//! Scenario tests on a warped 15x15 point grid: where ordinary and spatial
//! cross-correlation agree, where they disagree in sign, and how the full
//! pipeline narrows and groups features.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spacor_algorithms::prelude::*;

const SIDE: usize = 15;
const N: usize = SIDE * SIDE;

/// 15x15 grid with positional jitter so the triangulation is generic
fn warped_grid(seed: u64) -> PointSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut coords = Array2::zeros((N, 2));
    for r in 0..SIDE {
        for c in 0..SIDE {
            let i = r * SIDE + c;
            coords[(i, 0)] = c as f64 + rng.random_range(-0.3..0.3);
            coords[(i, 1)] = r as f64 + rng.random_range(-0.3..0.3);
        }
    }
    PointSet::unlabeled(coords).unwrap()
}

fn grid_x(i: usize) -> f64 {
    (i % SIDE) as f64
}

fn grid_y(i: usize) -> f64 {
    (i / SIDE) as f64
}

fn jittered(seed: u64, f: impl Fn(usize) -> f64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..N).map(|i| f(i) + rng.random_range(-0.5..0.5)).collect()
}

fn pearson(x: &Array1<f64>, y: &Array1<f64>) -> f64 {
    let n = x.len() as f64;
    let mx = x.sum() / n;
    let my = y.sum() / n;
    let mut num = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for (a, b) in x.iter().zip(y.iter()) {
        num += (a - mx) * (b - my);
        sx += (a - mx) * (a - mx);
        sy += (b - my) * (b - my);
    }
    num / (sx * sy).sqrt()
}

#[test]
fn shared_gradient_agrees_in_both_statistics() {
    let points = warped_grid(1);
    let weights = neighbor_weights(&points, &NeighborParams::default()).unwrap();

    let a = jittered(11, grid_x);
    let b = jittered(12, grid_x);

    assert!(pearson(&a, &b) > 0.5, "shared gradient correlates ordinarily");
    let t = spatial_cross_cor_test(a.view(), b.view(), &weights, Alternative::Greater, 499, 3)
        .unwrap();
    assert!(t.statistic > 0.0);
    assert!(t.p_value < 0.05, "spatial agreement, p={}", t.p_value);
}

#[test]
fn interleaved_gradients_disagree_in_sign() {
    let points = warped_grid(2);
    let weights = neighbor_weights(&points, &NeighborParams::default()).unwrap();

    // Two features on disjoint, checkerboard-interleaved subsets, each an
    // increasing left-to-right gradient restricted to its own subset.
    let in_a = |i: usize| (i % SIDE + i / SIDE) % 2 == 0;
    let a: Array1<f64> = (0..N).map(|i| if in_a(i) { grid_x(i) } else { 0.0 }).collect();
    let b: Array1<f64> = (0..N).map(|i| if in_a(i) { 0.0 } else { grid_x(i) }).collect();

    assert!(
        pearson(&a, &b) < -0.1,
        "disjoint supports anti-correlate ordinarily: r={}",
        pearson(&a, &b)
    );

    let t = spatial_cross_cor_test(a.view(), b.view(), &weights, Alternative::Greater, 499, 4)
        .unwrap();
    assert!(t.statistic > 0.0, "neighbors still co-vary: scc={}", t.statistic);
    assert!(t.p_value < 0.05, "sign disagreement is significant, p={}", t.p_value);
}

#[test]
fn inter_group_weights_sharpen_cross_correlation() {
    let points = warped_grid(2);
    let weights = neighbor_weights(&points, &NeighborParams::default()).unwrap();

    let in_a = |i: usize| (i % SIDE + i / SIDE) % 2 == 0;
    let a: Array1<f64> = (0..N).map(|i| if in_a(i) { grid_x(i) } else { 0.0 }).collect();
    let b: Array1<f64> = (0..N).map(|i| if in_a(i) { 0.0 } else { grid_x(i) }).collect();

    let set_a: Vec<String> = (0..N).filter(|&i| in_a(i)).map(|i| i.to_string()).collect();
    let set_b: Vec<String> = (0..N).filter(|&i| !in_a(i)).map(|i| i.to_string()).collect();
    let between = weights.between(&set_a, &set_b).unwrap();

    let full = spatial_cross_cor(a.view(), b.view(), &weights).unwrap();
    let restricted = spatial_cross_cor(a.view(), b.view(), &between).unwrap();
    assert!(
        restricted.abs() > full.abs(),
        "restricting to crossing edges concentrates the signal: {} vs {}",
        restricted,
        full
    );
}

#[test]
fn orthogonal_gradients_are_independent() {
    let points = warped_grid(5);
    let weights = neighbor_weights(&points, &NeighborParams::default()).unwrap();

    // Small jitter relative to the gradient range keeps each feature
    // strongly autocorrelated while their product stays symmetric.
    let mut rng = StdRng::seed_from_u64(55);
    let a: Array1<f64> = (0..N).map(|i| grid_x(i) + rng.random_range(-0.1..0.1)).collect();
    let b: Array1<f64> = (0..N).map(|i| grid_y(i) + rng.random_range(-0.1..0.1)).collect();

    let ma = moran_test(a.view(), &weights, Alternative::Greater).unwrap();
    let mb = moran_test(b.view(), &weights, Alternative::Greater).unwrap();
    assert!(ma.p_value < 0.05, "x gradient autocorrelates on its own");
    assert!(mb.p_value < 0.05, "y gradient autocorrelates on its own");

    assert!(pearson(&a, &b).abs() < 0.2);
    let t = spatial_cross_cor_test(a.view(), b.view(), &weights, Alternative::TwoSided, 499, 6)
        .unwrap();
    assert!(
        t.p_value > 0.05,
        "orthogonal gradients must not cross-correlate, p={}",
        t.p_value
    );
}

#[test]
fn random_features_match_null_expectation() {
    let points = warped_grid(7);
    let weights = neighbor_weights(&points, &NeighborParams::default()).unwrap();

    let mut rng = StdRng::seed_from_u64(77);
    let trials = 100;
    let mut mean_observed = 0.0;
    for _ in 0..trials {
        let x: Array1<f64> = (0..N).map(|_| rng.random_range(0.0..1.0)).collect();
        let r = moran_test(x.view(), &weights, Alternative::TwoSided).unwrap();
        mean_observed += r.observed / trials as f64;
    }
    let expected = -1.0 / (N as f64 - 1.0);
    assert!(
        (mean_observed - expected).abs() < 0.02,
        "mean I over random features: {mean_observed} vs expected {expected}"
    );
}

#[test]
fn pipeline_filters_then_groups_gradient_features() {
    let points = warped_grid(9);
    let weights = neighbor_weights(&points, &NeighborParams::default()).unwrap();

    // Two x-gradient features, two y-gradient features, two pure-noise
    // features that should fall out at the significance stage.
    let rows: Vec<Array1<f64>> = vec![
        jittered(91, grid_x),
        jittered(92, grid_x),
        jittered(93, grid_y),
        jittered(94, grid_y),
        jittered(95, |_| 0.0),
        jittered(96, |_| 0.0),
    ];
    let labels = vec![
        "x1".to_string(),
        "x2".to_string(),
        "y1".to_string(),
        "y2".to_string(),
        "noise1".to_string(),
        "noise2".to_string(),
    ];
    let mut values = Array2::zeros((rows.len(), N));
    for (i, row) in rows.iter().enumerate() {
        values.row_mut(i).assign(row);
    }
    let features = FeatureMatrix::new(
        values,
        labels,
        (0..N).map(|i| i.to_string()).collect(),
    )
    .unwrap();

    let table = moran_table(&features, &weights, Alternative::Greater).unwrap();
    let params = FilterParams {
        n_permutations: 199,
        ..Default::default()
    };
    let kept = filter_patterns(&features, &table, &weights, &params).unwrap();
    let kept_labels: Vec<String> = kept.iter().map(|p| p.feature.clone()).collect();
    assert!(kept_labels.iter().any(|l| l.starts_with('x')));
    assert!(kept_labels.iter().any(|l| l.starts_with('y')));
    assert!(
        !kept_labels.iter().any(|l| l.starts_with("noise")),
        "noise features must not pass: {kept_labels:?}"
    );

    let significant = features.select_features(&kept_labels).unwrap();
    let scc = spatial_cross_cor_matrix(&significant, &weights).unwrap();
    let groups = group_patterns(&significant, &scc, &GroupParams::default()).unwrap();

    let label_of = |name: &str| {
        groups
            .assignments
            .iter()
            .find(|(l, _)| l == name)
            .map(|(_, c)| *c)
            .unwrap()
    };
    assert_eq!(label_of("x1"), label_of("x2"), "x gradients group together");
    assert_eq!(label_of("y1"), label_of("y2"), "y gradients group together");
    assert_ne!(label_of("x1"), label_of("y1"), "orthogonal patterns split");
    assert!(label_of("x1") > 0 && label_of("y1") > 0);

    for summary in groups.summaries.values() {
        assert_eq!(summary.len(), N);
    }
}
