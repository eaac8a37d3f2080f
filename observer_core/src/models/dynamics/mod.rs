// observer_core/src/models/dynamics/mod.rs

use std::fmt::Debug;

use crate::types::{ControlMatrix, ControlVector, StateMatrix, StateVector, Time};
use crate::utils::integrators::Integrator;

// --- DYNAMICS TRAIT ---
/// Represents the continuous-time physics or kinematic model of a system.
///
/// Implementations are stateless with respect to estimation: they may be
/// shared behind an `Arc` by several observers at once, which is why they
/// must be `Send + Sync`.
pub trait Dynamics<const N: usize, const M: usize>: Debug + Send + Sync {
    /// Computes the time derivative of the state vector: `x_dot = f(x, u, t)`.
    ///
    /// # Arguments
    /// * `x`: Current state vector.
    /// * `u`: Current control input vector.
    /// * `t`: Current time.
    fn get_derivatives(&self, x: &StateVector<N>, u: &ControlVector<M>, t: Time) -> StateVector<N>;

    /// (Optional) Analytic Jacobians of `f(x, u, t)`.
    /// Jacobian A = ∂f/∂x (how state derivatives change with state)
    /// Jacobian B = ∂f/∂u (how state derivatives change with control input)
    ///
    /// Returns `None` when the model has no closed-form derivatives; callers
    /// then have to fall back to a numerical linearizer.
    fn calculate_jacobian(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
    ) -> Option<(StateMatrix<N>, ControlMatrix<N, M>)> {
        let _ = (x, u, t);
        None
    }

    /// Propagates the state forward in time using a numerical integrator.
    ///
    /// # Arguments
    /// * `x`: Current state vector.
    /// * `u`: Current control input vector. Assumed constant over `dt`.
    /// * `t`: Current time.
    /// * `dt`: Time step duration. Must be non-negative.
    /// * `substeps`: Number of integrator steps used to cover `dt`.
    /// * `integrator`: A reference to an object implementing the `Integrator` trait (e.g., `RK4`).
    fn propagate(
        &self,
        x: &StateVector<N>,
        u: &ControlVector<M>,
        t: Time,
        dt: Time,
        substeps: usize,
        integrator: &dyn Integrator<N>,
    ) -> StateVector<N> {
        debug_assert!(dt >= 0.0, "Dynamics::propagate: dt cannot be negative");

        // Define the closure f(x, t) for the integrator, capturing the current control input 'u'.
        let func = |func_x: &StateVector<N>, func_t: Time| -> StateVector<N> {
            self.get_derivatives(func_x, u, func_t)
        };

        let n = substeps.max(1);
        integrator.integrate_n_steps(&func, x, t, n, dt / n as f64)
    }
}

pub mod disturbed;
pub mod linear;
