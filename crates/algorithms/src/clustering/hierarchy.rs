//! Agglomerative hierarchical clustering.
//!
//! Naive O(n^3) agglomeration over a precomputed distance matrix with
//! Lance-Williams updates for complete, average and single linkage. The
//! result is a merge list in the usual convention: ids below `n_leaves`
//! are leaves, merge k creates cluster id `n_leaves + k`.

use ndarray::Array2;
use spacor_core::{Error, Result};

/// Linkage criterion for cluster-to-cluster distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Maximum pairwise distance (default)
    #[default]
    Complete,
    /// Size-weighted mean pairwise distance
    Average,
    /// Minimum pairwise distance
    Single,
}

impl std::str::FromStr for Linkage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "complete" => Ok(Self::Complete),
            "average" => Ok(Self::Average),
            "single" => Ok(Self::Single),
            other => Err(Error::InvalidParameter {
                name: "linkage",
                value: other.to_string(),
                reason: "expected one of complete, average, single".into(),
            }),
        }
    }
}

/// One agglomeration step joining clusters `a` and `b` at `height`
#[derive(Debug, Clone, Copy)]
pub struct Merge {
    pub a: usize,
    pub b: usize,
    pub height: f64,
}

/// Full agglomeration history over `n_leaves` items
#[derive(Debug, Clone)]
pub struct Dendrogram {
    n_leaves: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    /// Number of clustered items
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Merge steps in agglomeration order (heights are non-decreasing for
    /// complete and average linkage)
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Height at which cluster `id` was formed; leaves sit at height 0
    pub fn height(&self, id: usize) -> f64 {
        if id < self.n_leaves {
            0.0
        } else {
            self.merges[id - self.n_leaves].height
        }
    }

    /// Height of the final merge (0 when nothing merged)
    pub fn max_height(&self) -> f64 {
        self.merges.last().map_or(0.0, |m| m.height)
    }

    /// Leaf indices contained in cluster `id`
    pub fn members(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if node < self.n_leaves {
                out.push(node);
            } else {
                let m = self.merges[node - self.n_leaves];
                stack.push(m.a);
                stack.push(m.b);
            }
        }
        out
    }
}

/// Agglomerate a symmetric distance matrix into a dendrogram.
///
/// # Errors
/// Returns an error for an empty or non-square matrix, or non-finite /
/// negative distances.
pub fn hierarchical_cluster(dist: &Array2<f64>, linkage: Linkage) -> Result<Dendrogram> {
    let n = dist.nrows();
    if n == 0 {
        return Err(Error::Algorithm("cannot cluster an empty distance matrix".into()));
    }
    if dist.ncols() != n {
        return Err(Error::NonSquareWeights {
            rows: n,
            cols: dist.ncols(),
        });
    }
    for i in 0..n {
        for j in 0..n {
            let d = dist[(i, j)];
            if !d.is_finite() || d < 0.0 {
                return Err(Error::Algorithm(format!(
                    "invalid distance {d} at ({i}, {j})"
                )));
            }
        }
    }

    // Working state: active cluster ids, sizes and mutual distances
    let mut ids: Vec<usize> = (0..n).collect();
    let mut sizes: Vec<f64> = vec![1.0; n];
    let mut d: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| dist[(i, j)]).collect())
        .collect();

    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    while ids.len() > 1 {
        // Closest active pair
        let mut best = (0usize, 1usize, f64::INFINITY);
        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                if d[i][j] < best.2 {
                    best = (i, j, d[i][j]);
                }
            }
        }
        let (i, j, height) = best;

        let merged_id = n + merges.len();
        merges.push(Merge {
            a: ids[i],
            b: ids[j],
            height,
        });

        // Lance-Williams update of distances to the merged cluster
        let si = sizes[i];
        let sj = sizes[j];
        for k in 0..ids.len() {
            if k == i || k == j {
                continue;
            }
            let dik = d[i][k];
            let djk = d[j][k];
            let updated = match linkage {
                Linkage::Complete => dik.max(djk),
                Linkage::Single => dik.min(djk),
                Linkage::Average => (si * dik + sj * djk) / (si + sj),
            };
            d[i][k] = updated;
            d[k][i] = updated;
        }

        ids[i] = merged_id;
        sizes[i] = si + sj;
        ids.swap_remove(j);
        sizes.swap_remove(j);
        d.swap_remove(j);
        for row in &mut d {
            row.swap_remove(j);
        }
    }

    Ok(Dendrogram {
        n_leaves: n,
        merges,
    })
}
