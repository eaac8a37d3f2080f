// observer_core/src/models/dynamics/linear.rs

use crate::models::dynamics::Dynamics;
use crate::types::{ControlMatrix, ControlVector, StateMatrix, StateVector, Time};

// --- Linear Time-Invariant Model ---
// x_dot = A x + B u. Its analytic Jacobians are exact everywhere, which makes
// it the reference system for checking linearizers and filters.
#[derive(Debug, Clone)]
pub struct LinearDynamics<const N: usize, const M: usize> {
    pub a: StateMatrix<N>,
    pub b: ControlMatrix<N, M>,
}

impl<const N: usize, const M: usize> LinearDynamics<N, M> {
    pub fn new(a: StateMatrix<N>, b: ControlMatrix<N, M>) -> Self {
        Self { a, b }
    }
}

impl<const N: usize, const M: usize> Dynamics<N, M> for LinearDynamics<N, M> {
    fn get_derivatives(&self, x: &StateVector<N>, u: &ControlVector<M>, _t: Time) -> StateVector<N> {
        self.a * x + self.b * u
    }

    fn calculate_jacobian(
        &self,
        _x: &StateVector<N>,
        _u: &ControlVector<M>,
        _t: Time,
    ) -> Option<(StateMatrix<N>, ControlMatrix<N, M>)> {
        Some((self.a, self.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::integrators::RK4;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Matrix2, Vector1, Vector2};

    #[test]
    fn test_double_integrator_propagation() {
        // Position driven by velocity, velocity driven by force.
        let model = LinearDynamics::new(
            Matrix2::new(0.0, 1.0, 0.0, 0.0),
            Vector2::new(0.0, 1.0),
        );
        let x0 = Vector2::new(1.0, 2.0);
        let u = Vector1::new(0.5);

        let x1 = model.propagate(&x0, &u, 0.0, 1.0, 4, &RK4);
        // p = p0 + v0 t + a t^2 / 2, v = v0 + a t
        assert_abs_diff_eq!(x1[0], 3.25, epsilon = 1e-12);
        assert_abs_diff_eq!(x1[1], 2.5, epsilon = 1e-12);
    }
}
