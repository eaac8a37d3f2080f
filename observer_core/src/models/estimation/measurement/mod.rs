// observer_core/src/models/estimation/measurement/mod.rs

use std::fmt::Debug;

use crate::error::EstimationError;
use crate::types::{OutputCovariance, OutputMatrix, OutputVector, StateVector};

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `y = h(x) + w`
pub trait MeasurementModel<const O: usize, const N: usize>: Debug {
    /// Recomputes the cached Jacobians at `x`.
    fn update_jacobians(&mut self, x: &StateVector<N>) -> Result<(), EstimationError>;

    /// Predicts the ideal measurement `y_pred = h(x)`.
    fn compute_measurement(&self, x: &StateVector<N>) -> OutputVector<O>;

    /// `H = ∂h/∂x` at the last linearization point.
    fn observation_jacobian(&self) -> &OutputMatrix<O, N>;

    /// `M = ∂h/∂w`, how measurement noise enters the observation.
    fn measurement_noise_jacobian(&self) -> &OutputCovariance<O>;
}

/// `y = C x + w`: selects (or mixes) observed channels out of the full state.
#[derive(Debug, Clone)]
pub struct LinearMeasurementModel<const O: usize, const N: usize> {
    c: OutputMatrix<O, N>,
    dhdw: OutputCovariance<O>,
}

impl<const O: usize, const N: usize> LinearMeasurementModel<O, N> {
    pub fn new(c: OutputMatrix<O, N>) -> Self {
        Self {
            c,
            dhdw: OutputCovariance::identity(),
        }
    }

    pub fn observation_matrix(&self) -> &OutputMatrix<O, N> {
        &self.c
    }
}

impl<const O: usize, const N: usize> MeasurementModel<O, N> for LinearMeasurementModel<O, N> {
    fn update_jacobians(&mut self, _x: &StateVector<N>) -> Result<(), EstimationError> {
        Ok(())
    }

    fn compute_measurement(&self, x: &StateVector<N>) -> OutputVector<O> {
        self.c * x
    }

    fn observation_jacobian(&self) -> &OutputMatrix<O, N> {
        &self.c
    }

    fn measurement_noise_jacobian(&self) -> &OutputCovariance<O> {
        &self.dhdw
    }
}

/// A nonlinear sensor `y = h(x) + w` whose Jacobian is approximated by
/// forward differences around the linearization point.
pub struct NumDiffMeasurementModel<const O: usize, const N: usize, F>
where
    F: Fn(&StateVector<N>) -> OutputVector<O>,
{
    h: F,
    dhdx: OutputMatrix<O, N>,
    dhdw: OutputCovariance<O>,
}

impl<const O: usize, const N: usize, F> NumDiffMeasurementModel<O, N, F>
where
    F: Fn(&StateVector<N>) -> OutputVector<O>,
{
    pub fn new(h: F) -> Self {
        Self {
            h,
            dhdx: OutputMatrix::zeros(),
            dhdw: OutputCovariance::identity(),
        }
    }
}

impl<const O: usize, const N: usize, F> Debug for NumDiffMeasurementModel<O, N, F>
where
    F: Fn(&StateVector<N>) -> OutputVector<O>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumDiffMeasurementModel")
            .field("dhdx", &self.dhdx)
            .finish_non_exhaustive()
    }
}

impl<const O: usize, const N: usize, F> MeasurementModel<O, N> for NumDiffMeasurementModel<O, N, F>
where
    F: Fn(&StateVector<N>) -> OutputVector<O>,
{
    fn update_jacobians(&mut self, x: &StateVector<N>) -> Result<(), EstimationError> {
        let y_base = (self.h)(x);
        for j in 0..N {
            let epsilon = f64::EPSILON.sqrt() * x[j].abs().max(1.0);
            let mut perturbed = *x;
            perturbed[j] += epsilon;
            let derivative_column = ((self.h)(&perturbed) - y_base) / epsilon;
            self.dhdx.set_column(j, &derivative_column);
        }
        Ok(())
    }

    fn compute_measurement(&self, x: &StateVector<N>) -> OutputVector<O> {
        (self.h)(x)
    }

    fn observation_jacobian(&self) -> &OutputMatrix<O, N> {
        &self.dhdx
    }

    fn measurement_noise_jacobian(&self) -> &OutputCovariance<O> {
        &self.dhdw
    }
}
