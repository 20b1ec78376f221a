//! Truncation of the eigenvalue sequence

use crate::error::{KLError, Result};

/// How the threshold is compared to the eigenvalues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdPolicy {
    /// Keep λ_k while λ_k ≥ τ · λ_0
    #[default]
    Relative,
    /// Keep λ_k while λ_k ≥ τ
    Absolute,
}

/// Number of leading eigenvalues to retain
///
/// Retains the longest prefix of strictly positive eigenvalues that pass the
/// threshold; the input must already be non-increasing. A zero leading
/// eigenvalue gives rank zero.
///
/// # Arguments
/// * `eigenvalues` - Non-negative, non-increasing spectrum
/// * `threshold` - τ ≥ 0
/// * `policy` - Absolute or relative comparison
/// * `max_modes` - Optional cap on the result
pub fn retained_rank(
    eigenvalues: &[f64],
    threshold: f64,
    policy: ThresholdPolicy,
    max_modes: Option<usize>,
) -> Result<usize> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(KLError::InvalidThreshold(threshold));
    }

    let lambda0 = match eigenvalues.first() {
        Some(&l) if l > 0.0 => l,
        _ => return Ok(0),
    };
    let cut = match policy {
        ThresholdPolicy::Relative => threshold * lambda0,
        ThresholdPolicy::Absolute => threshold,
    };

    let passing = threshold_prefix(eigenvalues, cut);
    let rank = max_modes.map_or(passing, |max| passing.min(max));

    log::debug!(
        "threshold {:e} ({:?}): retained {} of {} eigenvalues",
        threshold,
        policy,
        rank,
        eigenvalues.len()
    );
    // A zero cap is the caller's request, not a threshold effect
    if passing == 0 {
        log::warn!(
            "threshold {:e} ({:?}) discards every mode of a spectrum with leading eigenvalue {:e}",
            threshold,
            policy,
            lambda0
        );
    }

    Ok(rank)
}

/// Length of the leading run of positive eigenvalues at or above `cut`
fn threshold_prefix(eigenvalues: &[f64], cut: f64) -> usize {
    eigenvalues
        .iter()
        .take_while(|&&lambda| lambda > 0.0 && lambda >= cut)
        .count()
}
