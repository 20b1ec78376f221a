//! KL decomposition result container

use crate::error::{KLError, Result};
use crate::field::{flatten_values, Field, ProcessSample};
use crate::function::PiecewiseLinearFunction;
use crate::mesh::Mesh;
use crate::threshold::ThresholdPolicy;
use crate::weights::QuadratureWeights;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Result of a Karhunen-Loève decomposition
///
/// Immutable once built. Holds the retained eigenvalues (non-increasing), the
/// modes as columns of a P × K matrix orthonormal under the weighted inner
/// product, and the mean that was subtracted (if any).
#[derive(Debug, Clone)]
pub struct KarhunenLoeveResult {
    mesh: Arc<Mesh>,
    dimension: usize,
    eigenvalues: DVector<f64>,
    spectrum: DVector<f64>,
    modes: DMatrix<f64>,
    mean: Option<Field>,
    weights: QuadratureWeights,
    broadcast_weights: DVector<f64>,
    threshold: f64,
    policy: ThresholdPolicy,
}

impl KarhunenLoeveResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        mesh: Arc<Mesh>,
        dimension: usize,
        spectrum: DVector<f64>,
        modes: DMatrix<f64>,
        mean: Option<DVector<f64>>,
        weights: QuadratureWeights,
        threshold: f64,
        policy: ThresholdPolicy,
    ) -> Self {
        let rank = modes.ncols();
        let eigenvalues = spectrum.rows(0, rank).into_owned();
        let broadcast_weights = weights.broadcast(dimension);
        let mean = mean.map(|flat| {
            let values = DMatrix::from_row_slice(mesh.vertex_count(), dimension, flat.as_slice());
            Field::from_parts(mesh.clone(), values)
        });
        Self {
            mesh,
            dimension,
            eigenvalues,
            spectrum,
            modes,
            mean,
            weights,
            broadcast_weights,
            threshold,
            policy,
        }
    }

    /// Retained eigenvalues λ_0 ≥ λ_1 ≥ … ≥ λ_{K-1} > 0
    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    /// Every eigenvalue estimate, including discarded and clamped ones
    pub fn spectrum(&self) -> &DVector<f64> {
        &self.spectrum
    }

    /// Number of retained modes K
    pub fn rank(&self) -> usize {
        self.modes.ncols()
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Number of components per vertex
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn weights(&self) -> &QuadratureWeights {
        &self.weights
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    /// Mean field subtracted before decomposition, `None` for a sample
    /// declared centered
    pub fn mean(&self) -> Option<&Field> {
        self.mean.as_ref()
    }

    /// Modes as columns of a P × K matrix, vertex-major rows
    pub fn mode_matrix(&self) -> &DMatrix<f64> {
        &self.modes
    }

    fn mode_field(&self, k: usize, scale: f64) -> Field {
        let column = self.modes.column(k) * scale;
        let values = DMatrix::from_row_slice(
            self.mesh.vertex_count(),
            self.dimension,
            column.as_slice(),
        );
        Field::from_parts(self.mesh.clone(), values)
    }

    /// Discretized modes
    pub fn mode_fields(&self) -> Vec<Field> {
        (0..self.rank()).map(|k| self.mode_field(k, 1.0)).collect()
    }

    /// Modes as continuous functions over the mesh
    pub fn modes(&self) -> Vec<PiecewiseLinearFunction> {
        self.mode_fields()
            .into_iter()
            .map(PiecewiseLinearFunction::new)
            .collect()
    }

    /// Modes collected as a process sample (one realization per mode)
    pub fn modes_as_process_sample(&self) -> ProcessSample {
        self.collect_sample(|k| self.mode_field(k, 1.0))
    }

    /// Modes scaled by `sqrt(λ_k)`
    pub fn scaled_modes_as_process_sample(&self) -> ProcessSample {
        self.collect_sample(|k| self.mode_field(k, self.eigenvalues[k].sqrt()))
    }

    fn collect_sample(&self, make: impl Fn(usize) -> Field) -> ProcessSample {
        let realizations = (0..self.rank()).map(|k| make(k).into_values()).collect();
        ProcessSample::from_parts(self.mesh.clone(), self.dimension, realizations)
    }

    /// Σ retained λ / Σ all λ, or 1 for an all-zero spectrum
    pub fn selection_ratio(&self) -> f64 {
        let total = self.total_variance();
        if total > 0.0 {
            self.eigenvalues.sum() / total
        } else {
            1.0
        }
    }

    /// Sum of the full eigenvalue spectrum
    ///
    /// Equals the trace of the empirical weighted covariance.
    pub fn total_variance(&self) -> f64 {
        self.spectrum.sum()
    }

    fn check_values(&self, values: &DMatrix<f64>) -> Result<()> {
        if values.nrows() != self.mesh.vertex_count() {
            return Err(KLError::ShapeMismatch {
                what: "field vertex count",
                expected: self.mesh.vertex_count(),
                found: values.nrows(),
            });
        }
        if values.ncols() != self.dimension {
            return Err(KLError::ShapeMismatch {
                what: "field dimension",
                expected: self.dimension,
                found: values.ncols(),
            });
        }
        Ok(())
    }

    fn project_values(&self, values: &DMatrix<f64>) -> Result<DVector<f64>> {
        self.check_values(values)?;
        let mut flat = flatten_values(values);
        if let Some(mean) = &self.mean {
            flat -= flatten_values(mean.values());
        }
        let weighted = flat.component_mul(&self.broadcast_weights);
        Ok(self.modes.tr_mul(&weighted))
    }

    /// KL coefficients `c_k = ⟨f − mean, φ_k⟩_w` of a field
    ///
    /// # Errors
    /// `ShapeMismatch` if the field's vertex count or dimension differs from
    /// the decomposed sample.
    pub fn project(&self, field: &Field) -> Result<DVector<f64>> {
        self.project_values(field.values())
    }

    /// Coefficients of every realization, one row per realization (N × K)
    pub fn project_sample(&self, sample: &ProcessSample) -> Result<DMatrix<f64>> {
        let mut coefficients = DMatrix::zeros(sample.len(), self.rank());
        for (r, values) in sample.iter().enumerate() {
            let c = self.project_values(values)?;
            coefficients.set_row(r, &c.transpose());
        }
        Ok(coefficients)
    }

    fn lift_flat(&self, coefficients: &[f64]) -> Result<DVector<f64>> {
        if coefficients.len() != self.rank() {
            return Err(KLError::ShapeMismatch {
                what: "coefficients",
                expected: self.rank(),
                found: coefficients.len(),
            });
        }
        let mut flat = match &self.mean {
            Some(mean) => flatten_values(mean.values()),
            None => DVector::zeros(self.modes.nrows()),
        };
        for (k, &c) in coefficients.iter().enumerate() {
            flat.axpy(c, &self.modes.column(k), 1.0);
        }
        Ok(flat)
    }

    /// `mean + Σ c_k φ_k` as a `vertex_count × dimension` value matrix
    ///
    /// # Errors
    /// `ShapeMismatch` if `coefficients.len() != K`.
    pub fn lift(&self, coefficients: &[f64]) -> Result<DMatrix<f64>> {
        let flat = self.lift_flat(coefficients)?;
        Ok(DMatrix::from_row_slice(
            self.mesh.vertex_count(),
            self.dimension,
            flat.as_slice(),
        ))
    }

    /// Same as [`lift`](Self::lift) with the mesh attached
    pub fn lift_as_field(&self, coefficients: &[f64]) -> Result<Field> {
        Ok(Field::from_parts(self.mesh.clone(), self.lift(coefficients)?))
    }

    /// Same as [`lift`](Self::lift) as a continuous function
    pub fn lift_as_function(&self, coefficients: &[f64]) -> Result<PiecewiseLinearFunction> {
        Ok(PiecewiseLinearFunction::new(self.lift_as_field(coefficients)?))
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
