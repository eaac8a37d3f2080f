// observer_core/src/estimation/filters/mod.rs

use crate::error::{EstimationError, NumericalIssue, Stage};
use crate::types::OutputCovariance;

pub mod ekf;
pub mod ukf;

/// Tolerance on `|S·S⁻¹ − I|` above which `S` is treated as numerically singular.
const INVERSE_RESIDUAL_TOLERANCE: f64 = 1e-6;

/// Inverts the innovation covariance without any regularization.
///
/// A singular or near-singular `S` is a configuration problem of the models
/// or noise matrices, so it is reported instead of papered over.
pub(crate) fn invert_innovation<const O: usize>(
    s: &OutputCovariance<O>,
) -> Result<OutputCovariance<O>, EstimationError> {
    let singular = || {
        EstimationError::numerical(Stage::Update, "innovation covariance", NumericalIssue::Singular)
    };

    let s_inv = (*s).try_inverse().ok_or_else(singular)?;
    if !s_inv.iter().all(|v| v.is_finite()) {
        return Err(singular());
    }
    let residual = (s * s_inv - OutputCovariance::<O>::identity()).amax();
    if residual > INVERSE_RESIDUAL_TOLERANCE {
        return Err(singular());
    }
    Ok(s_inv)
}
