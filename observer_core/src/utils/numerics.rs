// observer_core/src/utils/numerics.rs

use nalgebra::SMatrix;

use crate::error::{ConfigError, EstimationError, NumericalIssue, Stage};

/// Relative tolerance used when validating that noise covariances are symmetric.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Fails with a numerical error naming `matrix` if any entry is NaN or infinite.
pub fn ensure_finite<const R: usize, const C: usize>(
    m: &SMatrix<f64, R, C>,
    stage: Stage,
    matrix: &'static str,
) -> Result<(), EstimationError> {
    if m.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EstimationError::numerical(
            stage,
            matrix,
            NumericalIssue::NonFinite,
        ))
    }
}

/// Construction-time counterpart of [`ensure_finite`].
pub fn validate_finite<const R: usize, const C: usize>(
    m: &SMatrix<f64, R, C>,
    what: &'static str,
) -> Result<(), ConfigError> {
    if m.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::NonFinite(what))
    }
}

/// Largest absolute difference between `m` and its transpose.
pub fn max_asymmetry<const N: usize>(m: &SMatrix<f64, N, N>) -> f64 {
    (m - m.transpose()).amax()
}

pub fn validate_symmetric<const N: usize>(
    m: &SMatrix<f64, N, N>,
    what: &'static str,
) -> Result<(), ConfigError> {
    let scale = m.amax().max(1.0);
    if max_asymmetry(m) <= SYMMETRY_TOLERANCE * scale {
        Ok(())
    } else {
        Err(ConfigError::NotSymmetric(what))
    }
}

/// Returns `(m + mᵀ) / 2`.
pub fn symmetrize<const N: usize>(m: &SMatrix<f64, N, N>) -> SMatrix<f64, N, N> {
    (m + m.transpose()) * 0.5
}
