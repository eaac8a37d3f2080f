// observer_core/src/models/dynamics/disturbed.rs

use std::sync::Arc;

use crate::error::ConfigError;
use crate::models::dynamics::Dynamics;
use crate::types::{ControlMatrix, ControlVector, StateMatrix, StateVector, Time};

/// A system whose state has been augmented with disturbance channels.
///
/// The augmented dimension `A` is `STATE_DIM + DIST_DIM`. The two constants
/// are what a `DisturbanceObserver` checks its own dimensions against when it
/// is constructed.
pub trait DisturbedSystem<const A: usize, const M: usize>: Dynamics<A, M> {
    /// Size of the nominal (physical) state.
    const STATE_DIM: usize;
    /// Number of disturbance channels appended to the nominal state.
    const DIST_DIM: usize;
}

/// Models an unknown, slowly varying disturbance that enters through the
/// control channels of a nominal system.
///
/// Augmented state layout: `[x_nominal (S), d (M)]` with
/// `x_nominal_dot = f(x_nominal, u + d, t)` and `d_dot = 0`.
#[derive(Debug, Clone)]
pub struct InputDisturbedSystem<const S: usize, const A: usize, const M: usize> {
    nominal: Arc<dyn Dynamics<S, M>>,
}

impl<const S: usize, const A: usize, const M: usize> InputDisturbedSystem<S, A, M> {
    pub fn new(nominal: Arc<dyn Dynamics<S, M>>) -> Result<Self, ConfigError> {
        if A != S + M {
            return Err(ConfigError::DimensionMismatch {
                what: "input-disturbed augmented state",
                expected: S + M,
                actual: A,
            });
        }
        Ok(Self { nominal })
    }

    pub fn nominal(&self) -> &Arc<dyn Dynamics<S, M>> {
        &self.nominal
    }

    // Splits the augmented vector into the nominal state and the disturbance.
    fn split(&self, x: &StateVector<A>) -> (StateVector<S>, ControlVector<M>) {
        (
            x.fixed_rows::<S>(0).into_owned(),
            x.fixed_rows::<M>(S).into_owned(),
        )
    }
}

impl<const S: usize, const A: usize, const M: usize> Dynamics<A, M>
    for InputDisturbedSystem<S, A, M>
{
    fn get_derivatives(&self, x: &StateVector<A>, u: &ControlVector<M>, t: Time) -> StateVector<A> {
        let (x_nominal, d) = self.split(x);
        let nominal_dot = self.nominal.get_derivatives(&x_nominal, &(u + d), t);

        // The disturbance itself is modelled as a random walk: zero drift.
        let mut x_dot = StateVector::<A>::zeros();
        x_dot.fixed_rows_mut::<S>(0).copy_from(&nominal_dot);
        x_dot
    }

    fn calculate_jacobian(
        &self,
        x: &StateVector<A>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Option<(StateMatrix<A>, ControlMatrix<A, M>)> {
        let (x_nominal, d) = self.split(x);
        let (a_nominal, b_nominal) = self.nominal.calculate_jacobian(&x_nominal, &(u + d), t)?;

        // [[A_n, B_n], [0, 0]]
        let mut a = StateMatrix::<A>::zeros();
        a.fixed_view_mut::<S, S>(0, 0).copy_from(&a_nominal);
        a.fixed_view_mut::<S, M>(0, S).copy_from(&b_nominal);

        // [[B_n], [0]]
        let mut b = ControlMatrix::<A, M>::zeros();
        b.fixed_view_mut::<S, M>(0, 0).copy_from(&b_nominal);

        Some((a, b))
    }
}

impl<const S: usize, const A: usize, const M: usize> DisturbedSystem<A, M>
    for InputDisturbedSystem<S, A, M>
{
    const STATE_DIM: usize = S;
    const DIST_DIM: usize = M;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dynamics::linear::LinearDynamics;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix2, Vector1, Vector2, Vector3};

    fn oscillator() -> Arc<dyn Dynamics<2, 1>> {
        // Unit mass, stiffness 2, damping 0.5.
        Arc::new(LinearDynamics::new(
            Matrix2::new(0.0, 1.0, -2.0, -0.5),
            Vector2::new(0.0, 1.0),
        ))
    }

    #[test]
    fn test_rejects_inconsistent_augmented_dimension() {
        let err = InputDisturbedSystem::<2, 4, 1>::new(oscillator()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DimensionMismatch {
                what: "input-disturbed augmented state",
                expected: 3,
                actual: 4,
            }
        );
    }

    #[test]
    fn test_disturbance_acts_like_extra_control() {
        let system = InputDisturbedSystem::<2, 3, 1>::new(oscillator()).unwrap();
        let x = Vector3::new(0.1, -0.2, 0.3);
        let u = Vector1::new(0.4);

        let x_dot = system.get_derivatives(&x, &u, 0.0);
        let expected = oscillator().get_derivatives(&Vector2::new(0.1, -0.2), &Vector1::new(0.7), 0.0);

        assert_abs_diff_eq!(x_dot[0], expected[0], epsilon = 1e-12);
        assert_abs_diff_eq!(x_dot[1], expected[1], epsilon = 1e-12);
        assert_eq!(x_dot[2], 0.0);
    }

    #[test]
    fn test_augmented_jacobian_layout() {
        let system = InputDisturbedSystem::<2, 3, 1>::new(oscillator()).unwrap();
        let (a, b) = system
            .calculate_jacobian(&Vector3::zeros(), &Vector1::zeros(), 0.0)
            .unwrap();

        assert_eq!(a[(1, 0)], -2.0);
        assert_eq!(a[(1, 1)], -0.5);
        assert_eq!(a[(1, 2)], 1.0); // disturbance couples like the force input
        assert_eq!(a.row(2).amax(), 0.0);
        assert_eq!(b[(1, 0)], 1.0);
        assert_eq!(b[(2, 0)], 0.0);
        assert_eq!(
            <InputDisturbedSystem<2, 3, 1> as DisturbedSystem<3, 1>>::STATE_DIM,
            2
        );
    }
}
