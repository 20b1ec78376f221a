//! Helpers shared by the unit tests

use crate::field::ProcessSample;
use crate::mesh::Mesh;
use nalgebra::DMatrix;
use std::sync::Arc;

/// Regular 1-D mesh with `n_vertices` points on `[lower, upper]`
pub fn interval_mesh(lower: f64, upper: f64, n_vertices: usize) -> Arc<Mesh> {
    let step = (upper - lower) / (n_vertices - 1) as f64;
    let vertices = DMatrix::from_fn(n_vertices, 1, |i, _| lower + step * i as f64);
    let simplices = (0..n_vertices - 1).map(|i| vec![i, i + 1]).collect();
    Arc::new(Mesh::new(vertices, simplices).unwrap())
}

/// Simple deterministic pseudo-random number generator (LCG)
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next value in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 11) as f64) / ((1u64 << 53) as f64)
    }

    /// Next value in [-1, 1)
    pub fn next_symmetric(&mut self) -> f64 {
        2.0 * self.next_f64() - 1.0
    }
}

/// Scalar sample whose realizations are random combinations of a few
/// smooth profiles plus a common offset
pub fn random_scalar_sample(mesh: &Arc<Mesh>, n_realizations: usize, seed: u64) -> ProcessSample {
    let mut rng = SimpleRng::new(seed);
    let mut sample = ProcessSample::new(mesh.clone(), 1).unwrap();
    let n = mesh.vertex_count();
    for _ in 0..n_realizations {
        let a = rng.next_symmetric();
        let b = rng.next_symmetric();
        let c = rng.next_symmetric();
        let values = DMatrix::from_fn(n, 1, |i, _| {
            let x = mesh.vertices()[(i, 0)];
            1.0 + 2.0 * a * x + b * (3.0 * x).sin() + 0.5 * c * x * x
        });
        sample.add(values).unwrap();
    }
    sample
}
