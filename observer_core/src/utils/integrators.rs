// observer_core/src/utils/integrators.rs

use serde::{Deserialize, Serialize};

use crate::types::{StateVector, Time};

/// A fixed-step explicit integrator for `x_dot = func(x, t)`.
pub trait Integrator<const N: usize> {
    /// Advances `x0` from `t0` to `tf` in a single step.
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N>;

    /// Takes `n` steps of size `dt` starting at `t0`.
    fn integrate_n_steps(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        n: usize,
        dt: Time,
    ) -> StateVector<N> {
        let mut x = *x0;
        let mut t = t0;
        for _ in 0..n {
            x = self.step(func, &x, t, t + dt);
            t += dt;
        }
        x
    }
}

// Runge-Kutta methods
#[derive(Debug, Default, Clone, Copy)]
pub struct RK1;

impl<const N: usize> Integrator<N> for RK1 {
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N> {
        let dt = tf - t0;
        x0 + func(x0, t0) * dt // Euler's method
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RK2;

impl<const N: usize> Integrator<N> for RK2 {
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N> {
        let dt = tf - t0;
        let k1 = func(x0, t0);
        let k2 = func(&(x0 + k1 * dt), t0 + dt);

        // Weighted average of k1 and k2
        x0 + (k1 + k2) * (0.5 * dt)
    }
}

/// Third-order strong-stability-preserving scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct RK3;

impl<const N: usize> Integrator<N> for RK3 {
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N> {
        let dt = tf - t0;
        let k1 = func(x0, t0);
        let k2 = func(&(x0 + k1 * dt), t0 + dt);
        let k3 = func(&(x0 + (k1 + k2) * (dt / 4.0)), t0 + dt / 2.0);

        x0 + (k1 + k2 + k3 * 4.0) * (dt / 6.0)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RK4;

impl<const N: usize> Integrator<N> for RK4 {
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N> {
        let dt = tf - t0;
        let half = 0.5 * dt;

        let k1 = func(x0, t0);
        let k2 = func(&(x0 + k1 * half), t0 + half);
        let k3 = func(&(x0 + k2 * half), t0 + half);
        let k4 = func(&(x0 + k3 * dt), tf);

        x0 + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
    }
}

/// Kutta's 3/8-rule, the other classical fourth-order scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct RK4ThreeEighths;

impl<const N: usize> Integrator<N> for RK4ThreeEighths {
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N> {
        let dt = tf - t0;
        let third = dt / 3.0;

        let k1 = func(x0, t0);
        let k2 = func(&(x0 + k1 * third), t0 + third);
        let k3 = func(&(x0 + (k2 - k1 / 3.0) * dt), t0 + 2.0 * third);
        let k4 = func(&(x0 + (k1 - k2 + k3) * dt), tf);

        x0 + (k1 + (k2 + k3) * 3.0 + k4) * (dt / 8.0)
    }
}

/// Serializable selector for the integrators above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    Euler,
    Heun,
    Ssp3,
    #[default]
    Rk4,
    Rk4ThreeEighths,
}

impl<const N: usize> Integrator<N> for IntegratorKind {
    fn step(
        &self,
        func: &dyn Fn(&StateVector<N>, Time) -> StateVector<N>,
        x0: &StateVector<N>,
        t0: Time,
        tf: Time,
    ) -> StateVector<N> {
        match self {
            IntegratorKind::Euler => RK1.step(func, x0, t0, tf),
            IntegratorKind::Heun => RK2.step(func, x0, t0, tf),
            IntegratorKind::Ssp3 => RK3.step(func, x0, t0, tf),
            IntegratorKind::Rk4 => RK4.step(func, x0, t0, tf),
            IntegratorKind::Rk4ThreeEighths => RK4ThreeEighths.step(func, x0, t0, tf),
        }
    }
}
