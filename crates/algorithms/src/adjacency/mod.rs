//! Spatial neighbor weights from point positions.
//!
//! Builds an N×N weight matrix from a labeled point set:
//! 1. perturb exact duplicate coordinates so the triangulation never sees
//!    coincident points (epsilon-scale; labels keep original coordinates)
//! 2. Delaunay-triangulate in the native dimension
//! 3. extract neighbor edges from the simplices; in 3D this first peels
//!    the four triangular faces off every tetrahedron and then takes the
//!    edges of those faces
//! 4. weight each edge by Euclidean distance in the perturbed coordinates
//! 5. optionally drop edges longer than `filter_distance`
//! 6. optionally binarize to {0, 1}

pub mod delaunay;

use std::collections::HashSet;

use ndarray::Array2;
use spacor_core::{PointSet, Result, WeightMatrix};

pub use delaunay::{triangulate, Triangulation};

/// Component-wise offset applied to repeat occurrences of duplicate coordinates
const PERTURB_EPS: f64 = 1e-6;

/// Parameters for neighbor weight construction
#[derive(Debug, Clone)]
pub struct NeighborParams {
    /// Remove edges longer than this distance (default: no filter)
    pub filter_distance: Option<f64>,
    /// Replace positive weights with 1 (default: true)
    pub binary: bool,
}

impl Default for NeighborParams {
    fn default() -> Self {
        Self {
            filter_distance: None,
            binary: true,
        }
    }
}

/// Build a spatial neighbor weight matrix from point positions.
///
/// # Arguments
/// * `points` - Labeled observation positions (2D or 3D)
/// * `params` - Distance filter and binarization options
///
/// # Returns
/// Symmetric zero-diagonal weight matrix labeled by the input points.
///
/// # Errors
/// Propagates triangulation failure (too few points, collinear/coplanar
/// input) as a geometry error; no fallback neighbor heuristic is used.
pub fn neighbor_weights(points: &PointSet, params: &NeighborParams) -> Result<WeightMatrix> {
    let perturbed = points.deduplicated(PERTURB_EPS);
    let triangulation = triangulate(&perturbed)?;
    let edges = simplex_edges(&triangulation);

    let n = points.len();
    let mut weights = Array2::zeros((n, n));
    for (i, j) in edges {
        // Perturbed coordinates keep duplicate pairs at a strictly positive
        // distance, so their edge survives filtering and binarization. The
        // epsilon-scale error is irrelevant for distinct points.
        let d = perturbed
            .row(i)
            .iter()
            .zip(perturbed.row(j).iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt();
        weights[(i, j)] = d;
        weights[(j, i)] = d;
    }

    let mut matrix = WeightMatrix::new(weights, points.labels().to_vec())?;
    if let Some(max_distance) = params.filter_distance {
        matrix = matrix.filtered(max_distance);
    }
    if params.binary {
        matrix = matrix.binarized();
    }
    Ok(matrix)
}

/// Unordered neighbor pairs co-occurring in any simplex.
///
/// 2D: the three edges of each triangle. 3D: the four 2-faces of each
/// tetrahedron, then the three edges of each face; both orders reach the
/// same edge set since every tetrahedron edge lies on two of its faces.
fn simplex_edges(triangulation: &Triangulation) -> HashSet<(usize, usize)> {
    let mut edges = HashSet::new();
    let mut insert = |a: usize, b: usize| {
        edges.insert((a.min(b), a.max(b)));
    };
    match triangulation {
        Triangulation::Triangles(triangles) => {
            for tri in triangles {
                for omit in 0..3 {
                    let pair: Vec<usize> = (0..3).filter(|&k| k != omit).map(|k| tri[k]).collect();
                    insert(pair[0], pair[1]);
                }
            }
        }
        Triangulation::Tetrahedra(tets) => {
            for tet in tets {
                for omit in 0..4 {
                    let face: Vec<usize> =
                        (0..4).filter(|&k| k != omit).map(|k| tet[k]).collect();
                    for skip in 0..3 {
                        let pair: Vec<usize> =
                            (0..3).filter(|&k| k != skip).map(|k| face[k]).collect();
                        insert(pair[0], pair[1]);
                    }
                }
            }
        }
    }
    edges
}
