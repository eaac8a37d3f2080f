// observer_core/src/models/estimation/dynamics/mod.rs

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{ConfigError, EstimationError};
use crate::models::dynamics::Dynamics;
use crate::models::linearization::Linearizer;
use crate::models::sensitivity::SensitivityApproximation;
use crate::types::{ControlMatrix, ControlVector, StateMatrix, StateVector, Time};
use crate::utils::integrators::IntegratorKind;

/// A discrete-time dynamics model as seen by an estimator.
///
/// The estimator first asks the model to relinearize at the current point
/// (`update_jacobians`), then propagates the state (`compute_dynamics`) and
/// reads the cached Jacobians back. The cache belongs to the model; two
/// observers must not share one `SystemModel` instance.
pub trait SystemModel<const N: usize, const M: usize>: Debug {
    /// Recomputes the cached Jacobians at `(x, u, t)`.
    fn update_jacobians(
        &mut self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Result<(), EstimationError>;

    /// The state one sampling interval after `t`.
    fn compute_dynamics(&self, x: &StateVector<N>, u: &ControlVector<M>, t: Time) -> StateVector<N>;

    /// `F = ∂x⁺/∂x` at the last linearization point.
    fn state_jacobian(&self) -> &StateMatrix<N>;

    /// `L = ∂x⁺/∂v`, how process noise enters the transition.
    fn process_noise_jacobian(&self) -> &StateMatrix<N>;
}

/// Wraps a continuous [`Dynamics`] model into a sampled [`SystemModel`].
///
/// The state is propagated with the configured integrator; the Jacobians come
/// from the linearizer and are discretized with the sensitivity approximation.
/// Process noise is assumed additive on the discrete state, so `L = I`.
#[derive(Debug)]
pub struct ContinuousSystemModel<const N: usize, const M: usize> {
    system: Arc<dyn Dynamics<N, M>>,
    linearizer: Box<dyn Linearizer<N, M>>,
    sensitivity: SensitivityApproximation,
    integrator: IntegratorKind,
    substeps: usize,
    dt: Time,

    // Cached at the last linearization point.
    dfdx: StateMatrix<N>,
    dfdu: ControlMatrix<N, M>,
    dfdv: StateMatrix<N>,
}

impl<const N: usize, const M: usize> ContinuousSystemModel<N, M> {
    pub fn new(
        system: Arc<dyn Dynamics<N, M>>,
        linearizer: Box<dyn Linearizer<N, M>>,
        dt: Time,
        sensitivity: SensitivityApproximation,
        integrator: IntegratorKind,
        substeps: usize,
    ) -> Result<Self, ConfigError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidSamplingInterval(dt));
        }
        if substeps == 0 {
            return Err(ConfigError::InvalidSubsteps);
        }

        Ok(Self {
            system,
            linearizer,
            sensitivity,
            integrator,
            substeps,
            dt,
            dfdx: StateMatrix::identity(),
            dfdu: ControlMatrix::zeros(),
            dfdv: StateMatrix::identity(),
        })
    }

    pub fn sampling_interval(&self) -> Time {
        self.dt
    }

    pub fn system(&self) -> &Arc<dyn Dynamics<N, M>> {
        &self.system
    }

    /// `G = ∂x⁺/∂u` at the last linearization point.
    pub fn control_jacobian(&self) -> &ControlMatrix<N, M> {
        &self.dfdu
    }
}

impl<const N: usize, const M: usize> SystemModel<N, M> for ContinuousSystemModel<N, M> {
    fn update_jacobians(
        &mut self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Result<(), EstimationError> {
        let (a, b) = self.linearizer.linearize(x, u, t)?;
        let (f, g) = self.sensitivity.discretize(&a, &b, self.dt)?;
        self.dfdx = f;
        self.dfdu = g;
        Ok(())
    }

    fn compute_dynamics(&self, x: &StateVector<N>, u: &ControlVector<M>, t: Time) -> StateVector<N> {
        self.system
            .propagate(x, u, t, self.dt, self.substeps, &self.integrator)
    }

    fn state_jacobian(&self) -> &StateMatrix<N> {
        &self.dfdx
    }

    fn process_noise_jacobian(&self) -> &StateMatrix<N> {
        &self.dfdv
    }
}

/// An exactly linear discrete model `x⁺ = A x + B u`.
#[derive(Debug, Clone)]
pub struct LinearSystemModel<const N: usize, const M: usize> {
    a: StateMatrix<N>,
    b: ControlMatrix<N, M>,
    l: StateMatrix<N>,
}

impl<const N: usize, const M: usize> LinearSystemModel<N, M> {
    pub fn new(a: StateMatrix<N>, b: ControlMatrix<N, M>) -> Self {
        Self {
            a,
            b,
            l: StateMatrix::identity(),
        }
    }

    /// Replaces the default identity process-noise Jacobian.
    pub fn with_noise_jacobian(mut self, l: StateMatrix<N>) -> Self {
        self.l = l;
        self
    }
}

impl<const N: usize, const M: usize> SystemModel<N, M> for LinearSystemModel<N, M> {
    fn update_jacobians(
        &mut self,
        _x: &StateVector<N>,
        _u: &ControlVector<M>,
        _t: Time,
    ) -> Result<(), EstimationError> {
        // Constant Jacobians: nothing to refresh.
        Ok(())
    }

    fn compute_dynamics(&self, x: &StateVector<N>, u: &ControlVector<M>, _t: Time) -> StateVector<N> {
        self.a * x + self.b * u
    }

    fn state_jacobian(&self) -> &StateMatrix<N> {
        &self.a
    }

    fn process_noise_jacobian(&self) -> &StateMatrix<N> {
        &self.l
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dynamics::linear::LinearDynamics;
    use crate::models::linearization::{AnalyticLinearizer, NumDiffLinearizer};
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix2, Vector1, Vector2};

    fn double_integrator() -> Arc<dyn Dynamics<2, 1>> {
        Arc::new(LinearDynamics::new(
            Matrix2::new(0.0, 1.0, 0.0, 0.0),
            Vector2::new(0.0, 1.0),
        ))
    }

    #[test]
    fn test_rejects_bad_sampling_configuration() {
        let system = double_integrator();
        let make = |dt: f64, substeps: usize| {
            ContinuousSystemModel::new(
                system.clone(),
                Box::new(AnalyticLinearizer::new(system.clone()).unwrap()),
                dt,
                SensitivityApproximation::ForwardEuler,
                IntegratorKind::Rk4,
                substeps,
            )
        };
        assert_eq!(
            make(0.0, 1).unwrap_err(),
            ConfigError::InvalidSamplingInterval(0.0)
        );
        assert_eq!(make(0.1, 0).unwrap_err(), ConfigError::InvalidSubsteps);
        assert!(make(0.1, 1).is_ok());
    }

    #[test]
    fn test_discretized_jacobians_and_propagation() {
        let system = double_integrator();
        let dt = 0.1;
        let mut model = ContinuousSystemModel::new(
            system.clone(),
            Box::new(NumDiffLinearizer::new(system.clone())),
            dt,
            SensitivityApproximation::ForwardEuler,
            IntegratorKind::Rk4,
            2,
        )
        .unwrap();

        let x = Vector2::new(1.0, -1.0);
        let u = Vector1::new(2.0);
        model.update_jacobians(&x, &u, 0.0).unwrap();

        assert_abs_diff_eq!(*model.state_jacobian(), Matrix2::new(1.0, dt, 0.0, 1.0), epsilon = 1e-8);
        assert_abs_diff_eq!(*model.control_jacobian(), Vector2::new(0.0, dt), epsilon = 1e-8);
        assert_eq!(*model.process_noise_jacobian(), Matrix2::identity());

        let next = model.compute_dynamics(&x, &u, 0.0);
        assert_abs_diff_eq!(next[0], 1.0 - dt + 0.5 * 2.0 * dt * dt, epsilon = 1e-12);
        assert_abs_diff_eq!(next[1], -1.0 + 2.0 * dt, epsilon = 1e-12);
    }
}
