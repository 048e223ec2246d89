//! Delaunay triangulation in 2D and 3D.
//!
//! Incremental Bowyer-Watson construction: start from a super-simplex
//! enclosing all points, insert points one at a time, re-triangulate the
//! cavity of simplices whose circumcircle/circumsphere contains the new
//! point, and finally discard everything touching the super-simplex.
//!
//! Used purely as a neighbor-graph construction heuristic; no attempt is
//! made at exact geometric predicates. Near-degenerate simplices are treated
//! as not containing the query point, matching the reference behavior for
//! epsilon-perturbed inputs.

use ndarray::Array2;
use spacor_core::{Error, Result};

/// Determinant threshold below which a simplex is considered degenerate
const DEGENERACY_EPS: f64 = 1e-12;

/// Simplices of a Delaunay triangulation, indexed into the input points.
#[derive(Debug, Clone)]
pub enum Triangulation {
    /// Triangles over 2D points
    Triangles(Vec<[usize; 3]>),
    /// Tetrahedra over 3D points
    Tetrahedra(Vec<[usize; 4]>),
}

impl Triangulation {
    /// Number of simplices
    pub fn len(&self) -> usize {
        match self {
            Self::Triangles(t) => t.len(),
            Self::Tetrahedra(t) => t.len(),
        }
    }

    /// True if the triangulation holds no simplices
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Triangulate an N×dim coordinate matrix (dim 2 or 3).
///
/// # Errors
/// Returns [`Error::DegenerateGeometry`] if there are too few points for the
/// dimension or no valid simplex survives (collinear/coplanar input).
pub fn triangulate(coords: &Array2<f64>) -> Result<Triangulation> {
    let n = coords.nrows();
    let dim = coords.ncols();
    if n < dim + 2 {
        return Err(Error::DegenerateGeometry(format!(
            "need at least {} points for a {dim}D triangulation, got {n}",
            dim + 2
        )));
    }
    let result = match dim {
        2 => Triangulation::Triangles(delaunay_2d(coords)),
        3 => Triangulation::Tetrahedra(delaunay_3d(coords)),
        d => {
            return Err(Error::InvalidParameter {
                name: "coords",
                value: format!("{d} columns"),
                reason: "triangulation supports 2D and 3D only".into(),
            })
        }
    };
    if result.is_empty() {
        return Err(Error::DegenerateGeometry(
            "triangulation produced no simplices (collinear or coplanar points?)".into(),
        ));
    }
    Ok(result)
}

/// Circumcircle of a 2D triangle: center and squared radius
fn circumcircle(p: &[[f64; 2]; 3]) -> Option<(f64, f64, f64)> {
    let [a, b, c] = p;
    let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
    if d.abs() < DEGENERACY_EPS {
        return None;
    }
    let a2 = a[0] * a[0] + a[1] * a[1];
    let b2 = b[0] * b[0] + b[1] * b[1];
    let c2 = c[0] * c[0] + c[1] * c[1];
    let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
    let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
    let dx = a[0] - ux;
    let dy = a[1] - uy;
    Some((ux, uy, dx * dx + dy * dy))
}

fn delaunay_2d(coords: &Array2<f64>) -> Vec<[usize; 3]> {
    let n = coords.nrows();

    let mut min = [f64::MAX; 2];
    let mut max = [f64::MIN; 2];
    for i in 0..n {
        for k in 0..2 {
            min[k] = min[k].min(coords[(i, k)]);
            max[k] = max[k].max(coords[(i, k)]);
        }
    }
    let dx = max[0] - min[0];
    let dy = max[1] - min[1];
    let delta = dx.max(dy).max(1.0);

    // Vertices 0..3 form the super-triangle; input points follow at offset 3.
    let mut vertices: Vec<[f64; 2]> = vec![
        [min[0] - 10.0 * delta, min[1] - delta],
        [min[0] + 0.5 * dx, max[1] + 10.0 * delta],
        [max[0] + 10.0 * delta, min[1] - delta],
    ];
    for i in 0..n {
        vertices.push([coords[(i, 0)], coords[(i, 1)]]);
    }

    let mut triangles: Vec<[usize; 3]> = vec![[0, 1, 2]];

    for vi in 3..vertices.len() {
        let point = vertices[vi];

        let mut bad: Vec<usize> = Vec::new();
        for (ti, tri) in triangles.iter().enumerate() {
            let corners = [vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]];
            if let Some((cx, cy, r2)) = circumcircle(&corners) {
                let ddx = point[0] - cx;
                let ddy = point[1] - cy;
                if ddx * ddx + ddy * ddy <= r2 {
                    bad.push(ti);
                }
            }
        }

        // Cavity boundary: edges belonging to exactly one bad triangle
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        for &bi in &bad {
            let tri = triangles[bi];
            for edge in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let shared = bad.iter().any(|&oi| {
                    if oi == bi {
                        return false;
                    }
                    let other = triangles[oi];
                    let oe = [(other[0], other[1]), (other[1], other[2]), (other[2], other[0])];
                    oe.iter()
                        .any(|&(a, b)| (a == edge.0 && b == edge.1) || (a == edge.1 && b == edge.0))
                });
                if !shared {
                    boundary.push(edge);
                }
            }
        }

        bad.sort_unstable_by(|a, b| b.cmp(a));
        for bi in bad {
            triangles.swap_remove(bi);
        }
        for (a, b) in boundary {
            triangles.push([a, b, vi]);
        }
    }

    triangles.retain(|tri| tri.iter().all(|&v| v >= 3));
    for tri in &mut triangles {
        for v in tri.iter_mut() {
            *v -= 3;
        }
    }
    triangles
}

/// Circumsphere of a tetrahedron: center and squared radius.
///
/// Solves the 3×3 system 2(p_k − p_0)·c = |p_k|² − |p_0|² by Cramer's rule.
fn circumsphere(p: &[[f64; 3]; 4]) -> Option<([f64; 3], f64)> {
    let mut a = [[0.0f64; 3]; 3];
    let mut rhs = [0.0f64; 3];
    let n0 = p[0].iter().map(|v| v * v).sum::<f64>();
    for k in 0..3 {
        for c in 0..3 {
            a[k][c] = 2.0 * (p[k + 1][c] - p[0][c]);
        }
        rhs[k] = p[k + 1].iter().map(|v| v * v).sum::<f64>() - n0;
    }

    let det3 = |m: &[[f64; 3]; 3]| -> f64 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };

    let det = det3(&a);
    if det.abs() < DEGENERACY_EPS {
        return None;
    }
    let mut center = [0.0f64; 3];
    for col in 0..3 {
        let mut m = a;
        for row in 0..3 {
            m[row][col] = rhs[row];
        }
        center[col] = det3(&m) / det;
    }
    let r2 = p[0]
        .iter()
        .zip(center.iter())
        .map(|(v, c)| (v - c) * (v - c))
        .sum::<f64>();
    Some((center, r2))
}

/// Sorted vertex triple identifying a tetrahedron face
fn face_key(a: usize, b: usize, c: usize) -> [usize; 3] {
    let mut f = [a, b, c];
    f.sort_unstable();
    f
}

fn delaunay_3d(coords: &Array2<f64>) -> Vec<[usize; 4]> {
    let n = coords.nrows();

    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for i in 0..n {
        for k in 0..3 {
            min[k] = min[k].min(coords[(i, k)]);
            max[k] = max[k].max(coords[(i, k)]);
        }
    }
    let center = [
        0.5 * (min[0] + max[0]),
        0.5 * (min[1] + max[1]),
        0.5 * (min[2] + max[2]),
    ];
    let delta = (max[0] - min[0])
        .max(max[1] - min[1])
        .max(max[2] - min[2])
        .max(1.0);
    let r = 100.0 * delta;

    // Super-tetrahedron on alternating cube corners around the bounding box
    // (vertices 0..4); input points follow at offset 4.
    let mut vertices: Vec<[f64; 3]> = vec![
        [center[0] + r, center[1] + r, center[2] + r],
        [center[0] + r, center[1] - r, center[2] - r],
        [center[0] - r, center[1] + r, center[2] - r],
        [center[0] - r, center[1] - r, center[2] + r],
    ];
    for i in 0..n {
        vertices.push([coords[(i, 0)], coords[(i, 1)], coords[(i, 2)]]);
    }

    let mut tets: Vec<[usize; 4]> = vec![[0, 1, 2, 3]];

    for vi in 4..vertices.len() {
        let point = vertices[vi];

        let mut bad: Vec<usize> = Vec::new();
        for (ti, tet) in tets.iter().enumerate() {
            let corners = [
                vertices[tet[0]],
                vertices[tet[1]],
                vertices[tet[2]],
                vertices[tet[3]],
            ];
            if let Some((c, r2)) = circumsphere(&corners) {
                let d2 = point
                    .iter()
                    .zip(c.iter())
                    .map(|(v, cc)| (v - cc) * (v - cc))
                    .sum::<f64>();
                if d2 <= r2 {
                    bad.push(ti);
                }
            }
        }

        // Cavity boundary: faces belonging to exactly one bad tetrahedron
        let mut face_count: std::collections::HashMap<[usize; 3], usize> =
            std::collections::HashMap::new();
        for &bi in &bad {
            let t = tets[bi];
            for omit in 0..4 {
                let mut f = Vec::with_capacity(3);
                for (k, &v) in t.iter().enumerate() {
                    if k != omit {
                        f.push(v);
                    }
                }
                *face_count.entry(face_key(f[0], f[1], f[2])).or_insert(0) += 1;
            }
        }
        let boundary: Vec<[usize; 3]> = face_count
            .into_iter()
            .filter(|&(_, count)| count == 1)
            .map(|(face, _)| face)
            .collect();

        bad.sort_unstable_by(|a, b| b.cmp(a));
        for bi in bad {
            tets.swap_remove(bi);
        }
        for face in boundary {
            tets.push([face[0], face[1], face[2], vi]);
        }
    }

    tets.retain(|tet| tet.iter().all(|&v| v >= 4));
    for tet in &mut tets {
        for v in tet.iter_mut() {
            *v -= 4;
        }
    }
    tets
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_square_gives_two_triangles() {
        let coords = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let tri = triangulate(&coords).unwrap();
        match tri {
            Triangulation::Triangles(t) => {
                assert_eq!(t.len(), 2, "unit square should split into 2 triangles")
            }
            Triangulation::Tetrahedra(_) => panic!("expected triangles"),
        }
    }

    #[test]
    fn test_collinear_points_fail() {
        let coords = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let result = triangulate(&coords);
        assert!(
            matches!(result, Err(Error::DegenerateGeometry(_))),
            "collinear input must be a geometry error"
        );
    }

    #[test]
    fn test_too_few_points_fail() {
        let coords = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        assert!(triangulate(&coords).is_err(), "2D needs at least 4 points");
    }

    #[test]
    fn test_grid_covers_all_points() {
        let mut rows = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                rows.push([i as f64, j as f64]);
            }
        }
        let coords = Array2::from_shape_vec((16, 2), rows.concat()).unwrap();
        let tri = triangulate(&coords).unwrap();
        let Triangulation::Triangles(t) = tri else {
            panic!("expected triangles");
        };
        let mut touched = vec![false; 16];
        for simplex in &t {
            for &v in simplex {
                touched[v] = true;
            }
        }
        assert!(touched.iter().all(|&x| x), "every point joins some triangle");
    }

    #[test]
    fn test_unit_cube_tetrahedra() {
        let mut rows = Vec::new();
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    rows.push([x as f64, y as f64, z as f64]);
                }
            }
        }
        let coords = Array2::from_shape_vec((8, 3), rows.concat()).unwrap();
        let tri = triangulate(&coords).unwrap();
        let Triangulation::Tetrahedra(t) = tri else {
            panic!("expected tetrahedra");
        };
        assert!(!t.is_empty(), "cube corners must tetrahedralize");
        let mut touched = vec![false; 8];
        for simplex in &t {
            for &v in simplex {
                assert!(v < 8);
                touched[v] = true;
            }
        }
        assert!(touched.iter().all(|&x| x), "every corner joins some tet");
    }

    #[test]
    fn test_coplanar_points_fail_in_3d() {
        let coords = array![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.5, 0.5, 0.0]
        ];
        let result = triangulate(&coords);
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_circumsphere_unit_tet() {
        let p = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let (c, r2) = circumsphere(&p).unwrap();
        for v in c {
            assert!((v - 0.5).abs() < 1e-12);
        }
        assert!((r2 - 0.75).abs() < 1e-12);
    }
}
