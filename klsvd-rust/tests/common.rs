//! Common test utilities

#![allow(dead_code)]

use klsvd_rust::{DMatrix, DVector, Mesh, ProcessSample};
use std::sync::Arc;

/// Regular 1-D mesh with `n_vertices` points on `[lower, upper]`
pub fn interval_mesh(lower: f64, upper: f64, n_vertices: usize) -> Arc<Mesh> {
    let step = (upper - lower) / (n_vertices - 1) as f64;
    let vertices = DMatrix::from_fn(n_vertices, 1, |i, _| lower + step * i as f64);
    let simplices = (0..n_vertices - 1).map(|i| vec![i, i + 1]).collect();
    Arc::new(Mesh::new(vertices, simplices).expect("valid interval mesh"))
}

/// Simple deterministic pseudo-random number generator (LCG)
///
/// Uses the 64-bit MMIX constants; upper 53 bits map to [0, 1).
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64) / ((1u64 << 53) as f64)
    }

    /// Standard normal deviate (Box-Muller)
    pub fn next_normal(&mut self) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Exponential covariance model `C_ij(s, t) = a_i a_j R_ij exp(-|s - t| / scale)`
pub struct ExponentialModel {
    pub scale: f64,
    pub amplitude: Vec<f64>,
    pub correlation: DMatrix<f64>,
}

impl ExponentialModel {
    pub fn scalar(scale: f64) -> Self {
        Self {
            scale,
            amplitude: vec![1.0],
            correlation: DMatrix::identity(1, 1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.amplitude.len()
    }

    /// Covariance over all (vertex, component) pairs, vertex-major
    pub fn discretize(&self, mesh: &Mesh) -> DMatrix<f64> {
        let d = self.dimension();
        let p = mesh.vertex_count() * d;
        DMatrix::from_fn(p, p, |r, c| {
            let (i, a) = (r / d, r % d);
            let (j, b) = (c / d, c % d);
            let dist = (0..mesh.dimension())
                .map(|k| (mesh.vertices()[(i, k)] - mesh.vertices()[(j, k)]).powi(2))
                .sum::<f64>()
                .sqrt();
            self.amplitude[a] * self.amplitude[b] * self.correlation[(a, b)] * (-dist / self.scale).exp()
        })
    }
}

/// Draw `size` realizations of a zero-mean Gaussian process via Cholesky
pub fn gaussian_process_sample(
    model: &ExponentialModel,
    mesh: &Arc<Mesh>,
    size: usize,
    seed: u64,
) -> ProcessSample {
    let d = model.dimension();
    let n = mesh.vertex_count();
    let cov = model.discretize(mesh);
    let l = cov.cholesky().expect("covariance is positive definite").l();

    let mut rng = SimpleRng::new(seed);
    let mut sample = ProcessSample::new(mesh.clone(), d).expect("positive dimension");
    for _ in 0..size {
        let z = DVector::from_fn(n * d, |_, _| rng.next_normal());
        let flat = &l * z;
        sample
            .add(DMatrix::from_row_slice(n, d, flat.as_slice()))
            .expect("realization matches mesh");
    }
    sample
}

/// Σ_i w_i Var_i over every column of the flattened sample
pub fn weighted_covariance_trace(sample: &ProcessSample, weights: &[f64], subtract_mean: bool) -> f64 {
    let n = sample.len();
    let d = sample.dimension();
    let divisor = if subtract_mean { (n - 1) as f64 } else { n as f64 };
    let mean = sample.compute_mean().expect("non-empty sample");

    let mut trace = 0.0;
    for i in 0..sample.vertex_count() {
        for j in 0..d {
            let m = if subtract_mean { mean.values()[(i, j)] } else { 0.0 };
            let sum_sq: f64 = sample.iter().map(|v| (v[(i, j)] - m).powi(2)).sum();
            trace += weights[i] * sum_sq / divisor;
        }
    }
    trace
}

/// Weighted Gram matrix of the modes, `Φᵀ W Φ`
pub fn weighted_gram(modes: &DMatrix<f64>, weights: &DVector<f64>) -> DMatrix<f64> {
    let weighted = DMatrix::from_fn(modes.nrows(), modes.ncols(), |i, j| weights[i] * modes[(i, j)]);
    modes.transpose() * weighted
}
