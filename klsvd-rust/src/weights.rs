//! Quadrature weights defining the discrete L2 inner product
//!
//! `⟨f, g⟩_w = Σ_i w_i f_i g_i`, where `w_i` is attached to vertex `i` and
//! shared by all output components at that vertex.

use crate::error::{KLError, Result};
use crate::mesh::Mesh;
use nalgebra::DVector;

/// One non-negative weight per mesh vertex
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureWeights {
    values: DVector<f64>,
}

impl QuadratureWeights {
    /// Take caller-supplied weights
    ///
    /// # Errors
    /// `InvalidWeights` if the length differs from `vertex_count` or any
    /// weight is negative or not finite.
    pub fn new(values: Vec<f64>, vertex_count: usize) -> Result<Self> {
        if values.len() != vertex_count {
            return Err(KLError::InvalidWeights(format!(
                "expected {} weights (one per vertex), got {}",
                vertex_count,
                values.len()
            )));
        }
        if let Some((i, w)) = values
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(KLError::InvalidWeights(format!(
                "weight {} is {}, weights must be finite and non-negative",
                i, w
            )));
        }
        Ok(Self {
            values: DVector::from_vec(values),
        })
    }

    /// Equal weights summing to the mesh measure
    ///
    /// Falls back to `1 / vertex_count` when the mesh has no measure.
    pub fn uniform(mesh: &Mesh) -> Self {
        let n = mesh.vertex_count();
        let volume = mesh.volume();
        let w = if volume > 0.0 {
            volume / n as f64
        } else {
            1.0 / n as f64
        };
        Self {
            values: DVector::from_element(n, w),
        }
    }

    /// Lumped P1 mass: each simplex gives `measure / (k + 1)` to its vertices
    ///
    /// Vertices outside every simplex get weight zero.
    pub fn from_mesh(mesh: &Mesh) -> Result<Self> {
        if mesh.simplex_count() == 0 {
            return Err(KLError::InvalidMesh(
                "cannot derive weights from a mesh without simplices".to_string(),
            ));
        }
        let mut values = DVector::zeros(mesh.vertex_count());
        for simplex in mesh.simplices() {
            let share = mesh.measure_of(simplex) / simplex.len() as f64;
            for &v in simplex {
                values[v] += share;
            }
        }
        Ok(Self { values })
    }

    /// Number of vertices covered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Repeat each weight `dimension` times, vertex-major
    pub fn broadcast(&self, dimension: usize) -> DVector<f64> {
        DVector::from_fn(self.len() * dimension, |i, _| self.values[i / dimension])
    }

    /// Weighted inner product of two vertex-major flattened fields
    pub fn inner_product(&self, f: &[f64], g: &[f64]) -> Result<f64> {
        if f.len() != g.len() {
            return Err(KLError::ShapeMismatch {
                what: "inner product operand",
                expected: f.len(),
                found: g.len(),
            });
        }
        if self.is_empty() || f.len() % self.len() != 0 {
            return Err(KLError::ShapeMismatch {
                what: "flattened field length",
                expected: self.len(),
                found: f.len(),
            });
        }
        let dimension = f.len() / self.len();
        Ok(f.iter()
            .zip(g)
            .enumerate()
            .map(|(i, (a, b))| self.values[i / dimension] * a * b)
            .sum())
    }

    /// Weighted L2 norm of a flattened field
    pub fn norm(&self, f: &[f64]) -> Result<f64> {
        Ok(self.inner_product(f, f)?.sqrt())
    }
}
