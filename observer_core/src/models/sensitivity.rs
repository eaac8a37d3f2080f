// observer_core/src/models/sensitivity.rs

use serde::{Deserialize, Serialize};

use crate::error::{EstimationError, NumericalIssue, Stage};
use crate::types::{ControlMatrix, StateMatrix, Time};
use crate::utils::numerics::ensure_finite;

/// How continuous-time Jacobians `(A, B)` are turned into the discrete
/// transition sensitivities `(F, G)` over one sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityApproximation {
    /// `F = I + dt A`, `G = dt B`
    #[default]
    ForwardEuler,
    /// `F = (I - dt A)⁻¹`, `G = (I - dt A)⁻¹ dt B`
    BackwardEuler,
    /// `F = (I - dt/2 A)⁻¹ (I + dt/2 A)`, `G = (I - dt/2 A)⁻¹ dt B`
    Tustin,
}

impl SensitivityApproximation {
    pub fn discretize<const N: usize, const M: usize>(
        &self,
        a: &StateMatrix<N>,
        b: &ControlMatrix<N, M>,
        dt: Time,
    ) -> Result<(StateMatrix<N>, ControlMatrix<N, M>), EstimationError> {
        ensure_finite(a, Stage::Discretize, "continuous state jacobian")?;
        ensure_finite(b, Stage::Discretize, "continuous control jacobian")?;

        let identity = StateMatrix::<N>::identity();
        match self {
            SensitivityApproximation::ForwardEuler => Ok((identity + a * dt, b * dt)),
            SensitivityApproximation::BackwardEuler => {
                let inv = invert(identity - a * dt)?;
                Ok((inv, inv * b * dt))
            }
            SensitivityApproximation::Tustin => {
                let half = 0.5 * dt;
                let inv = invert(identity - a * half)?;
                Ok((inv * (identity + a * half), inv * b * dt))
            }
        }
    }
}

fn invert<const N: usize>(m: StateMatrix<N>) -> Result<StateMatrix<N>, EstimationError> {
    m.try_inverse().ok_or(EstimationError::numerical(
        Stage::Discretize,
        "implicit transition matrix",
        NumericalIssue::Singular,
    ))
}
