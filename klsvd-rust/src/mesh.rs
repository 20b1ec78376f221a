//! Simplicial mesh collaborator
//!
//! The decomposition itself only needs the vertex count. Geometry and
//! connectivity are used for two things: deriving quadrature weights from
//! simplex measures, and locating points for P1 interpolation of modes.
//! Meshes are built by the caller and shared through `Arc<Mesh>`.

use crate::error::{KLError, Result};
use nalgebra::{DMatrix, DVector};

/// Relative tolerance for point location in a simplex
const LOCATE_TOLERANCE: f64 = 1e-12;

/// Vertices (one row per vertex) plus simplices given as vertex indices
///
/// A simplex with `k + 1` vertices has intrinsic dimension `k`, which must not
/// exceed the ambient dimension of the vertices. Segments embedded in 2-D or
/// triangles embedded in 3-D are allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: DMatrix<f64>,
    simplices: Vec<Vec<usize>>,
}

impl Mesh {
    /// Create a mesh from a `vertex_count × dimension` coordinate matrix
    pub fn new(vertices: DMatrix<f64>, simplices: Vec<Vec<usize>>) -> Result<Self> {
        let (n_vertices, dim) = vertices.shape();
        if n_vertices == 0 {
            return Err(KLError::InvalidMesh("mesh has no vertices".to_string()));
        }
        if dim == 0 {
            return Err(KLError::InvalidMesh(
                "vertex coordinates have dimension 0".to_string(),
            ));
        }
        if vertices.iter().any(|x| !x.is_finite()) {
            return Err(KLError::InvalidMesh(
                "vertex coordinates must be finite".to_string(),
            ));
        }

        for (idx, simplex) in simplices.iter().enumerate() {
            if simplex.len() < 2 || simplex.len() > dim + 1 {
                return Err(KLError::InvalidMesh(format!(
                    "simplex {} has {} vertices, expected between 2 and {}",
                    idx,
                    simplex.len(),
                    dim + 1
                )));
            }
            for (pos, &v) in simplex.iter().enumerate() {
                if v >= n_vertices {
                    return Err(KLError::InvalidMesh(format!(
                        "simplex {} references vertex {} but the mesh has {} vertices",
                        idx, v, n_vertices
                    )));
                }
                if simplex[..pos].contains(&v) {
                    return Err(KLError::InvalidMesh(format!(
                        "simplex {} repeats vertex {}",
                        idx, v
                    )));
                }
            }
        }

        Ok(Self {
            vertices,
            simplices,
        })
    }

    /// Create a mesh without connectivity
    ///
    /// Such a mesh supports the decomposition with explicit or uniform
    /// weights, but has no measure and cannot interpolate.
    pub fn from_vertices(vertices: DMatrix<f64>) -> Result<Self> {
        Self::new(vertices, Vec::new())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.nrows()
    }

    /// Ambient dimension of the vertex coordinates
    pub fn dimension(&self) -> usize {
        self.vertices.ncols()
    }

    pub fn vertices(&self) -> &DMatrix<f64> {
        &self.vertices
    }

    pub fn vertex(&self, index: usize) -> Vec<f64> {
        self.vertices.row(index).iter().copied().collect()
    }

    pub fn simplices(&self) -> &[Vec<usize>] {
        &self.simplices
    }

    pub fn simplex_count(&self) -> usize {
        self.simplices.len()
    }

    /// Edge matrix of a simplex: column `c` is `v_{c+1} - v_0`
    fn edge_matrix(&self, simplex: &[usize]) -> DMatrix<f64> {
        let origin = simplex[0];
        DMatrix::from_fn(self.dimension(), simplex.len() - 1, |r, c| {
            self.vertices[(simplex[c + 1], r)] - self.vertices[(origin, r)]
        })
    }

    /// Measure (length, area, volume) of simplex `index`, `None` if there is
    /// no such simplex
    pub fn simplex_measure(&self, index: usize) -> Option<f64> {
        self.simplices
            .get(index)
            .map(|simplex| self.measure_of(simplex))
    }

    /// Gram determinant `sqrt(det(EᵀE)) / k!`, which reduces to `|det E| / d!`
    /// for full-dimensional simplices
    pub(crate) fn measure_of(&self, simplex: &[usize]) -> f64 {
        let edges = self.edge_matrix(simplex);
        let k = edges.ncols();
        let gram = edges.transpose() * &edges;
        let factorial: f64 = (1..=k).map(|i| i as f64).product();
        gram.determinant().max(0.0).sqrt() / factorial
    }

    /// Total measure of the mesh
    pub fn volume(&self) -> f64 {
        self.simplices
            .iter()
            .map(|simplex| self.measure_of(simplex))
            .sum()
    }

    /// Find a simplex containing `point`
    ///
    /// Returns the simplex index and the barycentric coordinates of the point
    /// with respect to that simplex's vertices (in simplex order).
    pub fn locate(&self, point: &[f64]) -> Option<(usize, Vec<f64>)> {
        if point.len() != self.dimension() {
            return None;
        }
        let p = DVector::from_column_slice(point);
        self.simplices
            .iter()
            .enumerate()
            .find_map(|(idx, simplex)| {
                self.barycentric_coordinates(simplex, &p)
                    .map(|bary| (idx, bary))
            })
    }

    fn barycentric_coordinates(&self, simplex: &[usize], point: &DVector<f64>) -> Option<Vec<f64>> {
        let origin: DVector<f64> = self.vertices.row(simplex[0]).transpose();
        let edges = self.edge_matrix(simplex);
        let rhs = point - &origin;

        // Normal equations handle embedded simplices; for full-dimensional
        // ones the residual below is zero up to round-off.
        let gram = edges.transpose() * &edges;
        let local = gram.lu().solve(&(edges.transpose() * &rhs))?;

        let scale = edges.norm().max(rhs.norm()).max(1.0);
        let residual = (&edges * &local - &rhs).norm();
        if residual > LOCATE_TOLERANCE * scale {
            return None;
        }

        let mut bary = Vec::with_capacity(simplex.len());
        bary.push(1.0 - local.sum());
        bary.extend(local.iter().copied());
        if bary.iter().all(|&b| b >= -LOCATE_TOLERANCE) {
            Some(bary)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
