//! Weighted thin SVD of the sample matrix
//!
//! The sample matrix M (N × P) is column-scaled by √w, decomposed as
//! `M·diag(√w) = U Σ Vᵀ` and the singular values are turned into covariance
//! eigenvalues `λ_k = σ_k² / n_eff`. Only the economy factorization is
//! computed, so the cost is O(N²P) when P ≫ N and no P × P matrix is formed.

use crate::error::{KLError, Result};
use crate::sample_matrix::SampleMatrix;
use nalgebra::{DMatrix, DVector};

/// Output of the weighted SVD, before truncation
#[derive(Debug, Clone)]
pub struct EstimatorOutput {
    /// Left singular vectors (N × r)
    pub u: DMatrix<f64>,
    /// Singular values after round-off clamping, non-increasing (r)
    pub singular_values: DVector<f64>,
    /// Right singular vectors in weight-scaled space (P × r)
    pub v: DMatrix<f64>,
    /// `σ_k² / normalization` for every singular value (r)
    pub eigenvalues: DVector<f64>,
    /// Divisor n_eff applied to σ²
    pub normalization: f64,
}

impl EstimatorOutput {
    /// Number of singular triplets, `min(N, P)`
    pub fn len(&self) -> usize {
        self.singular_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.singular_values.is_empty()
    }
}

/// Divisor turning σ² into covariance eigenvalues
///
/// N − 1 when the mean was estimated from the sample, N when the caller
/// declared the sample centered. Never below one.
pub fn eigenvalue_normalization(n_realizations: usize, mean_estimated: bool) -> f64 {
    let n_eff = if mean_estimated {
        n_realizations.saturating_sub(1)
    } else {
        n_realizations
    };
    n_eff.max(1) as f64
}

/// Scale column `j` of `matrix` by `sqrt_weights[j]`
pub fn apply_weights(matrix: &DMatrix<f64>, sqrt_weights: &DVector<f64>) -> DMatrix<f64> {
    let mut weighted = matrix.clone();
    for (j, mut column) in weighted.column_iter_mut().enumerate() {
        column *= sqrt_weights[j];
    }
    weighted
}

/// Compute the weighted SVD estimate of the covariance spectrum
///
/// # Arguments
/// * `sample` - Sample matrix (centered or not)
/// * `sqrt_weights` - √w broadcast to length P
/// * `normalization` - n_eff, see [`eigenvalue_normalization`]
/// * `max_iterations` - Iteration budget for the SVD, 0 for unlimited
///
/// # Errors
/// `DecompositionFailure` if the SVD does not converge, `ShapeMismatch` if
/// the weight vector does not match the matrix width.
pub fn estimate(
    sample: &SampleMatrix,
    sqrt_weights: &DVector<f64>,
    normalization: f64,
    max_iterations: usize,
) -> Result<EstimatorOutput> {
    let (rows, cols) = sample.matrix.shape();
    if sqrt_weights.len() != cols {
        return Err(KLError::ShapeMismatch {
            what: "broadcast weights",
            expected: cols,
            found: sqrt_weights.len(),
        });
    }

    let scaled = apply_weights(&sample.matrix, sqrt_weights);

    // nalgebra returns singular values sorted in non-increasing order
    let svd = scaled
        .try_svd(true, true, f64::EPSILON, max_iterations)
        .ok_or(KLError::DecompositionFailure { rows, cols })?;
    let u = svd.u.ok_or(KLError::DecompositionFailure { rows, cols })?;
    let v_t = svd.v_t.ok_or(KLError::DecompositionFailure { rows, cols })?;

    let floor = rank_floor(&svd.singular_values, sample, sqrt_weights);
    let singular_values = svd
        .singular_values
        .map(|s| if s > floor { s } else { 0.0 });
    let n_clamped = singular_values.iter().filter(|&&s| s == 0.0).count();

    let eigenvalues = singular_values.map(|s| s * s / normalization);

    log::debug!(
        "weighted SVD of {}x{} matrix: {} singular values, {} clamped below {:.3e}, n_eff = {}",
        rows,
        cols,
        singular_values.len(),
        n_clamped,
        floor,
        normalization
    );

    Ok(EstimatorOutput {
        u,
        singular_values,
        v: v_t.transpose(),
        eigenvalues,
        normalization,
    })
}

/// Absolute floor below which a singular value counts as round-off
///
/// `ε · max(N, P) · max(σ_0, ‖M_raw‖ · max √w)`. The pre-centering norm keeps
/// the residue of centering a constant sample below the floor.
fn rank_floor(singular_values: &DVector<f64>, sample: &SampleMatrix, sqrt_weights: &DVector<f64>) -> f64 {
    let (rows, cols) = sample.matrix.shape();
    let sigma0 = singular_values.iter().copied().fold(0.0, f64::max);
    let max_sqrt_w = sqrt_weights.iter().copied().fold(0.0, f64::max);
    let scale = sigma0.max(sample.raw_norm * max_sqrt_w);
    f64::EPSILON * rows.max(cols) as f64 * scale
}
