//! Recovery of physical-space KL modes from scaled singular vectors
//!
//! The right singular vectors live in the √w-scaled space. Dividing by √w
//! makes them orthonormal under `⟨f, g⟩_w` instead of the Euclidean product.

use crate::error::{KLError, Result};
use crate::estimator::EstimatorOutput;
use crate::sample_matrix::SampleMatrix;
use nalgebra::{DMatrix, DVector};

/// Remove the √w column scaling from a P-vector
///
/// Entries with zero weight are left untouched.
pub fn remove_weights(vector: &DVector<f64>, sqrt_weights: &DVector<f64>) -> DVector<f64> {
    vector.zip_map(sqrt_weights, |v, s| if s > 0.0 { v / s } else { v })
}

/// Assemble the first `rank` modes as columns of a P × rank matrix
///
/// Each mode is un-scaled, normalized to unit weighted norm and given a
/// deterministic sign (largest entry positive). At zero-weight entries the
/// scaled vector carries no information, so the value is recovered from the
/// left singular vector as `(Mᵀ u_k)_i / σ_k`.
///
/// # Errors
/// `DegenerateMode` if a mode has no weighted norm left after un-scaling.
/// The threshold filter only passes strictly positive eigenvalues, so this
/// indicates an internal inconsistency.
pub fn assemble_modes(
    output: &EstimatorOutput,
    sample: &SampleMatrix,
    sqrt_weights: &DVector<f64>,
    rank: usize,
) -> Result<DMatrix<f64>> {
    let p = sqrt_weights.len();
    if rank > output.len() {
        return Err(KLError::ShapeMismatch {
            what: "retained rank",
            expected: output.len(),
            found: rank,
        });
    }
    let has_zero_weight = sqrt_weights.iter().any(|&s| s == 0.0);

    let mut modes = DMatrix::zeros(p, rank);
    for k in 0..rank {
        let sigma = output.singular_values[k];
        if !(sigma > 0.0) {
            return Err(KLError::DegenerateMode { index: k });
        }

        let mut mode = remove_weights(&output.v.column(k).into_owned(), sqrt_weights);
        if has_zero_weight {
            let recovered = sample.matrix.tr_mul(&output.u.column(k)) / sigma;
            for i in 0..p {
                if sqrt_weights[i] == 0.0 {
                    mode[i] = recovered[i];
                }
            }
        }

        let norm_sq: f64 = mode
            .iter()
            .zip(sqrt_weights.iter())
            .map(|(m, s)| s * s * m * m)
            .sum();
        if !(norm_sq > 0.0 && norm_sq.is_finite()) {
            return Err(KLError::DegenerateMode { index: k });
        }
        mode /= norm_sq.sqrt();

        if mode[mode.iamax()] < 0.0 {
            mode.neg_mut();
        }
        modes.set_column(k, &mode);
    }

    log::debug!("assembled {} modes of length {}", rank, p);
    Ok(modes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::{eigenvalue_normalization, estimate};
    use crate::sample_matrix::build_sample_matrix;
    use crate::test_utils::SimpleRng;
    use approx::assert_abs_diff_eq;

    fn random_sample(n: usize, p: usize, seed: u64) -> Vec<DMatrix<f64>> {
        let mut rng = SimpleRng::new(seed);
        (0..n)
            .map(|_| DMatrix::from_fn(p, 1, |_, _| rng.next_symmetric()))
            .collect()
    }

    fn weighted_gram(modes: &DMatrix<f64>, weights: &DVector<f64>) -> DMatrix<f64> {
        let weighted = DMatrix::from_fn(modes.nrows(), modes.ncols(), |i, j| weights[i] * modes[(i, j)]);
        modes.transpose() * weighted
    }

    #[test]
    fn test_remove_weights() {
        let v = DVector::from_vec(vec![2.0, 3.0, 5.0]);
        let s = DVector::from_vec(vec![2.0, 0.5, 0.0]);
        assert_eq!(remove_weights(&v, &s).as_slice(), &[1.0, 6.0, 5.0]);
    }

    #[test]
    fn test_modes_are_weighted_orthonormal() {
        let realizations = random_sample(8, 6, 7);
        let sm = build_sample_matrix(&realizations, false).unwrap();
        let weights = DVector::from_vec(vec![0.1, 0.2, 0.3, 0.2, 0.1, 0.5]);
        let sqrt_w = weights.map(f64::sqrt);
        let out = estimate(&sm, &sqrt_w, eigenvalue_normalization(8, true), 0).unwrap();

        let modes = assemble_modes(&out, &sm, &sqrt_w, 5).unwrap();
        let gram = weighted_gram(&modes, &weights);
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[(i, j)], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_zero_weight_entries_are_recovered() {
        let realizations = random_sample(10, 4, 11);
        let sm = build_sample_matrix(&realizations, false).unwrap();
        let weights = DVector::from_vec(vec![1.0, 0.0, 1.0, 1.0]);
        let sqrt_w = weights.map(f64::sqrt);
        let out = estimate(&sm, &sqrt_w, eigenvalue_normalization(10, true), 0).unwrap();

        let modes = assemble_modes(&out, &sm, &sqrt_w, 3).unwrap();
        // Mode k satisfies M φ_k restricted to weighted columns = σ_k u_k;
        // the zero-weight entry follows from the same relation.
        for k in 0..3 {
            let phi = modes.column(k);
            let expected: f64 = (0..10)
                .map(|r| sm.matrix[(r, 1)] * out.u[(r, k)])
                .sum::<f64>();
            let norm_scale = out.singular_values[k];
            assert!(phi[1].is_finite());
            // φ_k(1) = (Mᵀ u_k)_1 / σ_k up to the sign flip
            assert_abs_diff_eq!(phi[1].abs(), (expected / norm_scale).abs(), epsilon = 1e-10);
        }
        let gram = weighted_gram(&modes, &weights);
        assert_abs_diff_eq!(gram[(0, 0)], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(gram[(0, 2)], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_sign_convention() {
        let realizations = random_sample(5, 3, 3);
        let sm = build_sample_matrix(&realizations, false).unwrap();
        let sqrt_w = DVector::from_element(3, 1.0);
        let out = estimate(&sm, &sqrt_w, 4.0, 0).unwrap();
        let modes = assemble_modes(&out, &sm, &sqrt_w, 2).unwrap();
        for k in 0..2 {
            let col = modes.column(k);
            assert!(col[col.iamax()] > 0.0);
        }
    }

    #[test]
    fn test_zero_singular_value_is_degenerate() {
        // Rank one sample: the second singular value is clamped to zero
        let realizations = vec![
            DMatrix::from_column_slice(2, 1, &[1.0, 1.0]),
            DMatrix::from_column_slice(2, 1, &[-1.0, -1.0]),
        ];
        let sm = build_sample_matrix(&realizations, true).unwrap();
        let sqrt_w = DVector::from_element(2, 1.0);
        let out = estimate(&sm, &sqrt_w, 2.0, 0).unwrap();
        assert!(assemble_modes(&out, &sm, &sqrt_w, 1).is_ok());
        assert_eq!(
            assemble_modes(&out, &sm, &sqrt_w, 2).unwrap_err(),
            KLError::DegenerateMode { index: 1 }
        );
    }
}
