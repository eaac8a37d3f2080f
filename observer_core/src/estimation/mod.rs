// observer_core/src/estimation/mod.rs

use crate::error::EstimationError;
use crate::models::estimation::dynamics::SystemModel;
use crate::models::estimation::measurement::MeasurementModel;
use crate::types::{ControlVector, OutputCovariance, OutputVector, StateMatrix, StateVector, Time};

/// The contract for anything that holds a state estimate.
pub trait Estimator<const N: usize> {
    /// Returns a reference to the current best estimate of the state.
    fn estimate(&self) -> &StateVector<N>;
}

/// The minimal estimator: a state vector and nothing else.
///
/// It has no notion of uncertainty and no predict/update semantics of its
/// own; the filters build on it to hold their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEstimate<const N: usize> {
    x: StateVector<N>,
}

impl<const N: usize> StateEstimate<N> {
    pub fn new(x0: StateVector<N>) -> Self {
        Self { x: x0 }
    }

    // Only the recursive estimators in this crate move the estimate.
    pub(crate) fn set(&mut self, x: StateVector<N>) -> &StateVector<N> {
        self.x = x;
        &self.x
    }
}

impl<const N: usize> Default for StateEstimate<N> {
    fn default() -> Self {
        Self::new(StateVector::zeros())
    }
}

impl<const N: usize> Estimator<N> for StateEstimate<N> {
    fn estimate(&self) -> &StateVector<N> {
        &self.x
    }
}

/// The capability shared by the Kalman-type filters: a covariance plus the
/// predict/update recursion against the discrete model contracts.
///
/// Both methods leave the filter untouched when they return an error.
pub trait RecursiveEstimator<const N: usize>: Estimator<N> {
    /// Returns the current estimate covariance `P`.
    fn covariance(&self) -> &StateMatrix<N>;

    /// Time-advances the estimate by one step of `f` under control `u`.
    fn predict<const M: usize, F>(
        &mut self,
        f: &mut F,
        u: &ControlVector<M>,
        q: &StateMatrix<N>,
        t: Time,
    ) -> Result<&StateVector<N>, EstimationError>
    where
        F: SystemModel<N, M> + ?Sized;

    /// Corrects the estimate with measurement `y` observed through `h`.
    fn update<const O: usize, H>(
        &mut self,
        y: &OutputVector<O>,
        h: &mut H,
        r: &OutputCovariance<O>,
    ) -> Result<&StateVector<N>, EstimationError>
    where
        H: MeasurementModel<O, N> + ?Sized;
}

pub mod filters;
