//! # klsvd-rust: Karhunen-Loève decomposition by weighted SVD
//!
//! Estimates an empirical Karhunen-Loève expansion of a (possibly
//! vector-valued) stochastic process from realizations sampled on a mesh.
//! The expansion is computed from a thin SVD of the √w-scaled sample matrix,
//! so no covariance matrix over the mesh is ever assembled.
//!
//! Each realization is approximated as `mean + Σ_k c_k φ_k`, where the modes
//! φ_k are orthonormal under the quadrature-weighted inner product and the
//! coefficients c_k are uncorrelated with variance λ_k.

pub mod algorithm;
pub mod error;
pub mod estimator;
pub mod field;
pub mod function;
pub mod mesh;
pub mod modes;
pub mod result;
pub mod sample_matrix;
pub mod threshold;
pub mod weights;

// Re-export commonly used types
pub use algorithm::{KarhunenLoeveConfig, KarhunenLoeveSVD, decompose};
pub use error::{KLError, Result};
pub use field::{Field, ProcessSample};
pub use function::PiecewiseLinearFunction;
pub use mesh::Mesh;
pub use result::KarhunenLoeveResult;
pub use threshold::ThresholdPolicy;
pub use weights::QuadratureWeights;

// Re-export the linear algebra backend for convenience
pub use nalgebra::{DMatrix, DVector};

// Test utilities (only available in test mode)
#[cfg(test)]
pub mod test_utils;
