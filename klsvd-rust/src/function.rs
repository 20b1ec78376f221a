//! Continuous P1 functions over a mesh
//!
//! A [`PiecewiseLinearFunction`] interpolates vertex values linearly inside
//! each simplex: linearly between adjacent vertices on a 1-D mesh, through
//! barycentric coordinates on triangles and tetrahedra.

use crate::error::{KLError, Result};
use crate::field::Field;
use crate::mesh::Mesh;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// P1 Lagrange interpolant of a field
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinearFunction {
    mesh: Arc<Mesh>,
    values: DMatrix<f64>,
}

impl PiecewiseLinearFunction {
    pub fn new(field: Field) -> Self {
        let mesh = field.mesh().clone();
        Self {
            mesh,
            values: field.into_values(),
        }
    }

    /// Dimension of the points the function accepts
    pub fn input_dimension(&self) -> usize {
        self.mesh.dimension()
    }

    /// Number of components returned per point
    pub fn output_dimension(&self) -> usize {
        self.values.ncols()
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Values at the mesh vertices
    pub fn vertex_values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Evaluate at `point`
    ///
    /// # Errors
    /// `ShapeMismatch` if the point has the wrong dimension,
    /// `PointOutsideMesh` if no simplex contains it.
    pub fn evaluate(&self, point: &[f64]) -> Result<DVector<f64>> {
        if point.len() != self.input_dimension() {
            return Err(KLError::ShapeMismatch {
                what: "evaluation point",
                expected: self.input_dimension(),
                found: point.len(),
            });
        }
        let (simplex, bary) = self
            .mesh
            .locate(point)
            .ok_or_else(|| KLError::PointOutsideMesh(point.to_vec()))?;

        let mut out = DVector::zeros(self.output_dimension());
        for (&vertex, &b) in self.mesh.simplices()[simplex].iter().zip(&bary) {
            out += self.values.row(vertex).transpose() * b;
        }
        Ok(out)
    }

    /// Evaluate at every row of `points`, one output row per point
    pub fn evaluate_many(&self, points: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let mut out = DMatrix::zeros(points.nrows(), self.output_dimension());
        for (i, row) in points.row_iter().enumerate() {
            let point: Vec<f64> = row.iter().copied().collect();
            let value = self.evaluate(&point)?;
            out.set_row(i, &value.transpose());
        }
        Ok(out)
    }
}
