//! Cluster extraction from a dendrogram.
//!
//! Extraction is a pluggable strategy: [`FixedHeightCut`] is the classic
//! single-threshold cut, [`DynamicCut`] adapts locally so clusters of
//! uneven tightness can coexist. Labels are `i32`: 0 is noise/unassigned,
//! clusters are numbered from 1 in decreasing size order.

use super::hierarchy::Dendrogram;

/// Strategy interface for turning a dendrogram into cluster labels
pub trait CutStrategy {
    /// Label every leaf; 0 means unassigned
    fn cut(&self, dendrogram: &Dendrogram) -> Vec<i32>;
}

/// Classic static cut: every merge at or below `height` joins
#[derive(Debug, Clone)]
pub struct FixedHeightCut {
    pub height: f64,
    /// Clusters smaller than this become noise (label 0)
    pub min_cluster_size: usize,
}

impl CutStrategy for FixedHeightCut {
    fn cut(&self, dendrogram: &Dendrogram) -> Vec<i32> {
        let clusters = static_components(dendrogram, self.height)
            .into_iter()
            .map(|root| dendrogram.members(root))
            .collect();
        finalize_labels(dendrogram.n_leaves(), clusters, self.min_cluster_size)
    }
}

/// Adaptive cut: static threshold scaled down by `deep_split`, then a
/// bottom-up height-gap scan that splits clusters whose two branches are
/// each tight but joined loosely.
///
/// `deep_split` runs 0..=4; higher values cut lower and split more readily,
/// yielding more, smaller clusters.
#[derive(Debug, Clone)]
pub struct DynamicCut {
    pub deep_split: u8,
    pub min_cluster_size: usize,
}

impl Default for DynamicCut {
    fn default() -> Self {
        Self {
            deep_split: 2,
            min_cluster_size: 2,
        }
    }
}

impl DynamicCut {
    fn split_gap_fraction(&self) -> f64 {
        0.55 - 0.10 * f64::from(self.deep_split.min(4))
    }

    fn cut_height(&self, dendrogram: &Dendrogram) -> f64 {
        dendrogram.max_height() * (0.99 - 0.10 * f64::from(self.deep_split.min(4)))
    }

    /// Recursively split `id` where the join height stands clear of both
    /// branches' internal heights and both branches meet the size floor.
    fn refine(&self, dendrogram: &Dendrogram, id: usize, out: &mut Vec<Vec<usize>>) {
        let n = dendrogram.n_leaves();
        if id < n {
            out.push(vec![id]);
            return;
        }
        let merge = dendrogram.merges()[id - n];
        let h_top = merge.height;
        let h_child = dendrogram.height(merge.a).max(dendrogram.height(merge.b));
        let separated = h_top > 0.0 && (h_top - h_child) > self.split_gap_fraction() * h_top;
        if separated {
            let size_a = dendrogram.members(merge.a).len();
            let size_b = dendrogram.members(merge.b).len();
            if size_a >= self.min_cluster_size && size_b >= self.min_cluster_size {
                self.refine(dendrogram, merge.a, out);
                self.refine(dendrogram, merge.b, out);
                return;
            }
        }
        out.push(dendrogram.members(id));
    }
}

impl CutStrategy for DynamicCut {
    fn cut(&self, dendrogram: &Dendrogram) -> Vec<i32> {
        let roots = static_components(dendrogram, self.cut_height(dendrogram));
        let mut clusters = Vec::new();
        for root in roots {
            self.refine(dendrogram, root, &mut clusters);
        }
        finalize_labels(dendrogram.n_leaves(), clusters, self.min_cluster_size)
    }
}

/// Roots of the forest obtained by keeping only merges at or below `height`
fn static_components(dendrogram: &Dendrogram, height: f64) -> Vec<usize> {
    let n = dendrogram.n_leaves();
    let total = n + dendrogram.merges().len();
    let kept = |id: usize| id < n || dendrogram.merges()[id - n].height <= height;

    let mut parent: Vec<Option<usize>> = vec![None; total];
    for (k, merge) in dendrogram.merges().iter().enumerate() {
        parent[merge.a] = Some(n + k);
        parent[merge.b] = Some(n + k);
    }

    (0..total)
        .filter(|&id| kept(id) && parent[id].map_or(true, |p| !kept(p)))
        .collect()
}

/// Demote undersized clusters to noise and relabel by size (largest = 1)
fn finalize_labels(n_leaves: usize, clusters: Vec<Vec<usize>>, min_size: usize) -> Vec<i32> {
    let mut surviving: Vec<Vec<usize>> = clusters
        .into_iter()
        .filter(|c| c.len() >= min_size.max(1))
        .collect();
    surviving.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| a.iter().min().cmp(&b.iter().min()))
    });

    let mut labels = vec![0i32; n_leaves];
    for (k, cluster) in surviving.iter().enumerate() {
        for &leaf in cluster {
            labels[leaf] = (k + 1) as i32;
        }
    }
    labels
}
