//! Configuration and entry points of the SVD-based KL decomposition
//!
//! [`decompose`] is a pure function from a sample and a configuration to an
//! immutable [`KarhunenLoeveResult`]:
//!
//! 1. weights: caller-supplied or uniform over the mesh measure
//! 2. sample matrix: flattened, mean-centered unless declared centered
//! 3. weighted thin SVD and eigenvalue estimates
//! 4. threshold filter
//! 5. mode assembly
//!
//! # Example
//! ```ignore
//! use klsvd_rust::{decompose, KarhunenLoeveConfig};
//!
//! let config = KarhunenLoeveConfig::new(1e-6);
//! let result = decompose(&sample, &config)?;
//! let coefficients = result.project(&field)?;
//! let approx = result.lift(coefficients.as_slice())?;
//! ```

use crate::error::{KLError, Result};
use crate::estimator::{eigenvalue_normalization, estimate};
use crate::field::ProcessSample;
use crate::modes::assemble_modes;
use crate::result::KarhunenLoeveResult;
use crate::sample_matrix::build_sample_matrix;
use crate::threshold::{retained_rank, ThresholdPolicy};
use crate::weights::QuadratureWeights;

/// Configuration of a KL decomposition
#[derive(Debug, Clone, PartialEq)]
pub struct KarhunenLoeveConfig {
    /// Non-negative threshold on the eigenvalues (default 0: keep every
    /// non-zero mode)
    pub threshold: f64,
    /// Whether `threshold` is relative to λ_0 or absolute
    pub policy: ThresholdPolicy,
    /// Caller asserts the sample has zero mean; skips mean subtraction
    pub centered: bool,
    /// Per-vertex quadrature weights; uniform over the mesh when `None`
    pub weights: Option<Vec<f64>>,
    /// Upper bound on the number of retained modes
    pub max_modes: Option<usize>,
    /// Iteration budget of the SVD, 0 runs until convergence
    pub max_svd_iterations: usize,
}

impl Default for KarhunenLoeveConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            policy: ThresholdPolicy::Relative,
            centered: false,
            weights: None,
            max_modes: None,
            max_svd_iterations: 0,
        }
    }
}

impl KarhunenLoeveConfig {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: ThresholdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_max_modes(mut self, max_modes: usize) -> Self {
        self.max_modes = Some(max_modes);
        self
    }

    pub fn with_max_svd_iterations(mut self, max_iterations: usize) -> Self {
        self.max_svd_iterations = max_iterations;
        self
    }

    /// Check the threshold; weights are checked against the mesh in
    /// [`decompose`]
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(KLError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Compute the KL decomposition of `sample`
///
/// # Errors
/// * `InvalidThreshold` / `InvalidWeights` for a bad configuration
/// * `EmptySample` / `DimensionMismatch` for a bad sample
/// * `DecompositionFailure` if the SVD does not converge
pub fn decompose(sample: &ProcessSample, config: &KarhunenLoeveConfig) -> Result<KarhunenLoeveResult> {
    config.validate()?;

    let mesh = sample.mesh();
    let weights = match &config.weights {
        Some(values) => QuadratureWeights::new(values.clone(), mesh.vertex_count())?,
        None => QuadratureWeights::uniform(mesh),
    };

    let sample_matrix = build_sample_matrix(sample.realizations(), config.centered)?;
    let dimension = sample_matrix.dimension;

    let broadcast = weights.broadcast(dimension);
    let sqrt_weights = broadcast.map(f64::sqrt);
    let normalization = eigenvalue_normalization(sample.len(), !config.centered);

    let output = estimate(
        &sample_matrix,
        &sqrt_weights,
        normalization,
        config.max_svd_iterations,
    )?;
    let rank = retained_rank(
        output.eigenvalues.as_slice(),
        config.threshold,
        config.policy,
        config.max_modes,
    )?;
    let modes = assemble_modes(&output, &sample_matrix, &sqrt_weights, rank)?;

    log::debug!(
        "KL decomposition: {} realizations, {} vertices x {} components, rank {}",
        sample.len(),
        mesh.vertex_count(),
        dimension,
        rank
    );

    Ok(KarhunenLoeveResult::new(
        mesh.clone(),
        dimension,
        output.eigenvalues,
        modes,
        sample_matrix.mean,
        weights,
        config.threshold,
        config.policy,
    ))
}

/// Sample plus configuration, decomposed on demand
///
/// `run` returns the result directly; the driver holds no result state.
#[derive(Debug, Clone)]
pub struct KarhunenLoeveSVD {
    sample: ProcessSample,
    config: KarhunenLoeveConfig,
}

impl KarhunenLoeveSVD {
    pub fn new(sample: ProcessSample, config: KarhunenLoeveConfig) -> Self {
        Self { sample, config }
    }

    pub fn run(&self) -> Result<KarhunenLoeveResult> {
        decompose(&self.sample, &self.config)
    }

    pub fn sample(&self) -> &ProcessSample {
        &self.sample
    }

    pub fn config(&self) -> &KarhunenLoeveConfig {
        &self.config
    }
}
