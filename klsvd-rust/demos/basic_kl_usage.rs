//! Basic KL decomposition example for klsvd-rust

use klsvd_rust::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== klsvd-rust Karhunen-Loeve Examples ===\n");

    // Example 1: scalar process on [-1, 1]
    println!("1. Scalar process on a 1-D mesh");
    let n_vertices = 21;
    let vertices = DMatrix::from_fn(n_vertices, 1, |i, _| -1.0 + 2.0 * i as f64 / (n_vertices - 1) as f64);
    let simplices = (0..n_vertices - 1).map(|i| vec![i, i + 1]).collect();
    let mesh = Arc::new(Mesh::new(vertices, simplices)?);
    println!("   Vertices: {}", mesh.vertex_count());
    println!("   Volume: {}", mesh.volume());

    // Random combinations of a few smooth profiles
    let mut state = 12345u64;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        2.0 * ((state >> 11) as f64 / (1u64 << 53) as f64) - 1.0
    };
    let mut sample = ProcessSample::new(mesh.clone(), 1)?;
    for _ in 0..30 {
        let (a, b, c) = (next(), next(), next());
        sample.add(DMatrix::from_fn(n_vertices, 1, |i, _| {
            let x = mesh.vertices()[(i, 0)];
            1.0 + 2.0 * a * x + b * (3.0 * x).sin() + 0.1 * c * x * x
        }))?;
    }
    println!("   Realizations: {}", sample.len());

    let weights = QuadratureWeights::from_mesh(&mesh)?;
    let config = KarhunenLoeveConfig::new(1e-10).with_weights(weights.as_slice().to_vec());
    let result = KarhunenLoeveSVD::new(sample.clone(), config).run()?;
    println!("   Retained modes: {}", result.rank());
    println!("   Eigenvalues: {:?}", result.eigenvalues().as_slice());
    println!("   Selection ratio: {:.6}", result.selection_ratio());

    // Project and lift a training realization
    let field = sample
        .get_field(0)
        .ok_or(KLError::EmptySample)?;
    let coefficients = result.project(&field)?;
    let lifted = result.lift_as_field(coefficients.as_slice())?;
    let error = (lifted.values() - field.values()).amax();
    println!("   Coefficients: {:?}", coefficients.as_slice());
    println!("   Max reconstruction error: {:.3e}", error);

    // Evaluate the leading mode between vertices
    let modes = result.modes();
    if let Some(first) = modes.first() {
        println!("   phi_0(0.05) = {}", first.evaluate(&[0.05])?[0]);
    }

    println!();

    // Example 2: declared-centered two-component process
    println!("2. Two-component process, declared centered");
    let mut sample2 = ProcessSample::new(mesh.clone(), 2)?;
    for _ in 0..10 {
        let (a, b) = (next(), next());
        sample2.add(DMatrix::from_fn(n_vertices, 2, |i, j| {
            let x = mesh.vertices()[(i, 0)];
            if j == 0 { a * x } else { 2.0 * (a * 0.5 + b) * (1.0 - x * x) }
        }))?;
    }
    let result2 = decompose(&sample2, &KarhunenLoeveConfig::new(1e-10).with_centered(true))?;
    println!("   Retained modes: {}", result2.rank());
    println!("   Has mean: {}", result2.mean().is_some());
    println!("   Total variance: {:.6}", result2.total_variance());

    let scaled = result2.scaled_modes_as_process_sample();
    println!("   Scaled modes: {} fields of dimension {}", scaled.len(), scaled.dimension());

    Ok(())
}
