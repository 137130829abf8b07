//! Pseudo-inverse for possibly rank-deficient covariance blocks.

use nalgebra::{DMatrix, SVD};

use crate::error::LinalgError;

/// Iteration cap for the SVD. Zero would mean "until convergence".
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Relative cutoff, as a multiple of machine epsilon, below which singular
/// values are treated as zero.
const RELATIVE_CUTOFF: f64 = 1e6;

/// Moore-Penrose pseudo-inverse via SVD.
///
/// Singular values at or below `1e6 · ε · σ_max` are dropped. Fails on
/// non-finite input or when the SVD does not converge.
pub fn pinv(m: &DMatrix<f64>) -> Result<DMatrix<f64>, LinalgError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::NonFinite);
    }
    if m.is_empty() {
        return Ok(DMatrix::zeros(m.ncols(), m.nrows()));
    }

    let svd = SVD::try_new(m.clone(), true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(LinalgError::NoConvergence)?;
    let sigma_max = svd.singular_values.max();
    let cutoff = RELATIVE_CUTOFF * f64::EPSILON * sigma_max;
    let inv = svd
        .pseudo_inverse(cutoff)
        .map_err(LinalgError::PseudoInverse)?;

    if inv.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::NonFinite);
    }
    Ok(inv)
}
