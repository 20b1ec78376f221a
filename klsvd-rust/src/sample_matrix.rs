//! Flattening of a process sample into the N × P data matrix

use crate::error::{KLError, Result};
use nalgebra::{DMatrix, DVector};

/// Row-per-realization data matrix, optionally mean-centered
#[derive(Debug, Clone)]
pub struct SampleMatrix {
    /// N × (vertex_count · dimension), vertex-major columns
    pub matrix: DMatrix<f64>,
    /// Flattened empirical mean, present only when it was subtracted
    pub mean: Option<DVector<f64>>,
    /// Frobenius norm of the matrix before centering
    pub raw_norm: f64,
    pub vertex_count: usize,
    pub dimension: usize,
}

impl SampleMatrix {
    pub fn n_realizations(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Build the sample matrix from `vertex_count × dimension` realizations
///
/// # Arguments
/// * `realizations` - Value matrices, all of the same shape
/// * `centered` - If true the caller asserts the sample has zero mean and no
///   mean is subtracted; otherwise the arithmetic mean is removed row-wise
///
/// # Errors
/// `EmptySample` if there are no realizations, `DimensionMismatch` if any
/// realization differs in shape from the first one.
pub fn build_sample_matrix(realizations: &[DMatrix<f64>], centered: bool) -> Result<SampleMatrix> {
    let first = realizations.first().ok_or(KLError::EmptySample)?;
    let expected = first.shape();
    for (index, values) in realizations.iter().enumerate() {
        if values.shape() != expected {
            return Err(KLError::DimensionMismatch {
                index,
                expected,
                found: values.shape(),
            });
        }
    }

    let (vertex_count, dimension) = expected;
    let n = realizations.len();
    let p = vertex_count * dimension;

    let mut matrix = DMatrix::from_fn(n, p, |r, c| {
        realizations[r][(c / dimension, c % dimension)]
    });
    let raw_norm = matrix.norm();

    let mean = if centered {
        None
    } else {
        let mut mean = DVector::zeros(p);
        // Second pass removes the rounding residue of the first mean
        for _ in 0..2 {
            for c in 0..p {
                let m = matrix.column(c).mean();
                matrix.column_mut(c).add_scalar_mut(-m);
                mean[c] += m;
            }
        }
        Some(mean)
    };

    log::debug!(
        "sample matrix: {} realizations x {} columns ({} vertices, dimension {}), centered by caller: {}",
        n,
        p,
        vertex_count,
        dimension,
        centered
    );

    Ok(SampleMatrix {
        matrix,
        mean,
        raw_norm,
        vertex_count,
        dimension,
    })
}
