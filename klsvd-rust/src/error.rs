//! Error types for Karhunen-Loève decomposition
//!
//! Every fallible operation in the crate returns [`KLError`]. Shape errors are
//! raised at the boundary of the component that first sees the bad input;
//! numerical failures come from the SVD backend and are passed through as-is.

/// Error types for KL decomposition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KLError {
    #[error("Sample contains no realizations")]
    EmptySample,

    #[error(
        "Realization {index} has shape {found:?} (vertices, dimension), expected {expected:?}"
    )]
    DimensionMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("SVD did not converge for a {rows}x{cols} sample matrix")]
    DecompositionFailure { rows: usize, cols: usize },

    /// Broken invariant between the threshold filter and the mode assembler
    #[error("Mode {index} has zero weighted norm after un-scaling")]
    DegenerateMode { index: usize },

    #[error("Invalid threshold: {0} (must be finite and non-negative)")]
    InvalidThreshold(f64),

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Point {0:?} is outside the mesh")]
    PointOutsideMesh(Vec<f64>),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, KLError>;
