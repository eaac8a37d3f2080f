// observer_core/src/models/linearization.rs

//! Strategies for obtaining the continuous-time Jacobians `A = ∂f/∂x` and
//! `B = ∂f/∂u` of a [`Dynamics`] model. The estimator never calls these
//! directly; they are consumed by `ContinuousSystemModel`.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, EstimationError};
use crate::models::dynamics::Dynamics;
use crate::types::{ControlMatrix, ControlVector, StateMatrix, StateVector, Time};

/// Produces `(A, B)` for a continuous system at a linearization point.
pub trait Linearizer<const N: usize, const M: usize>: Debug + Send + Sync {
    fn linearize(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Result<(StateMatrix<N>, ControlMatrix<N, M>), EstimationError>;
}

/// Finite-difference stencil used by [`NumDiffLinearizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceScheme {
    Forward,
    #[default]
    Central,
}

impl DifferenceScheme {
    // Step sizes balance truncation against round-off for each stencil.
    fn step(self, value: f64) -> f64 {
        let base = match self {
            DifferenceScheme::Forward => f64::EPSILON.sqrt(),
            DifferenceScheme::Central => f64::EPSILON.cbrt(),
        };
        base * value.abs().max(1.0)
    }
}

/// Approximates the Jacobians by perturbing each state and control entry.
#[derive(Debug, Clone)]
pub struct NumDiffLinearizer<const N: usize, const M: usize> {
    system: Arc<dyn Dynamics<N, M>>,
    scheme: DifferenceScheme,
}

impl<const N: usize, const M: usize> NumDiffLinearizer<N, M> {
    pub fn new(system: Arc<dyn Dynamics<N, M>>) -> Self {
        Self::with_scheme(system, DifferenceScheme::default())
    }

    pub fn with_scheme(system: Arc<dyn Dynamics<N, M>>, scheme: DifferenceScheme) -> Self {
        Self { system, scheme }
    }

    /// `∂f/∂x` alone.
    pub fn derivative_state(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> StateMatrix<N> {
        let f0 = self.system.get_derivatives(x, u, t);
        let mut a = StateMatrix::<N>::zeros();
        for j in 0..N {
            let h = self.scheme.step(x[j]);
            let mut x_plus = *x;
            x_plus[j] += h;
            let column = match self.scheme {
                DifferenceScheme::Forward => (self.system.get_derivatives(&x_plus, u, t) - f0) / h,
                DifferenceScheme::Central => {
                    let mut x_minus = *x;
                    x_minus[j] -= h;
                    (self.system.get_derivatives(&x_plus, u, t)
                        - self.system.get_derivatives(&x_minus, u, t))
                        / (2.0 * h)
                }
            };
            a.set_column(j, &column);
        }
        a
    }

    /// `∂f/∂u` alone.
    pub fn derivative_control(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> ControlMatrix<N, M> {
        let f0 = self.system.get_derivatives(x, u, t);
        let mut b = ControlMatrix::<N, M>::zeros();
        for j in 0..M {
            let h = self.scheme.step(u[j]);
            let mut u_plus = *u;
            u_plus[j] += h;
            let column = match self.scheme {
                DifferenceScheme::Forward => (self.system.get_derivatives(x, &u_plus, t) - f0) / h,
                DifferenceScheme::Central => {
                    let mut u_minus = *u;
                    u_minus[j] -= h;
                    (self.system.get_derivatives(x, &u_plus, t)
                        - self.system.get_derivatives(x, &u_minus, t))
                        / (2.0 * h)
                }
            };
            b.set_column(j, &column);
        }
        b
    }
}

impl<const N: usize, const M: usize> Linearizer<N, M> for NumDiffLinearizer<N, M> {
    fn linearize(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Result<(StateMatrix<N>, ControlMatrix<N, M>), EstimationError> {
        Ok((self.derivative_state(x, u, t), self.derivative_control(x, u, t)))
    }
}

/// Uses the closed-form Jacobians the system itself provides.
#[derive(Debug, Clone)]
pub struct AnalyticLinearizer<const N: usize, const M: usize> {
    system: Arc<dyn Dynamics<N, M>>,
}

impl<const N: usize, const M: usize> AnalyticLinearizer<N, M> {
    /// Fails if `system` has no closed-form Jacobians, probed once at the origin.
    pub fn new(system: Arc<dyn Dynamics<N, M>>) -> Result<Self, ConfigError> {
        system
            .calculate_jacobian(&StateVector::zeros(), &ControlVector::zeros(), 0.0)
            .ok_or(ConfigError::MissingJacobian("dynamics model"))?;
        Ok(Self { system })
    }
}

impl<const N: usize, const M: usize> Linearizer<N, M> for AnalyticLinearizer<N, M> {
    fn linearize(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Result<(StateMatrix<N>, ControlMatrix<N, M>), EstimationError> {
        self.system
            .calculate_jacobian(x, u, t)
            .ok_or_else(|| ConfigError::MissingJacobian("dynamics model").into())
    }
}
