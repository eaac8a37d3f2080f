// observer_core/src/observer/mod.rs

//! Observers bundle a dynamics model, a measurement model, an estimator and
//! fixed noise statistics into one unit with a predict/update lifecycle.
//!
//! The expected call pattern is one `predict` followed by one `update` per
//! sampling interval. Several `predict` calls in a row are fine (dropped
//! measurements); an `update` with no `predict` since the previous `update`
//! is misuse. By default misuse is only logged; `strict_sequencing` turns it
//! into an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EstimationError;
use crate::models::sensitivity::SensitivityApproximation;
use crate::types::{OutputVector, StateVector, Time};
use crate::utils::integrators::IntegratorKind;

pub mod disturbance;
pub mod state;

pub use disturbance::DisturbanceObserver;
pub use state::StateObserver;

/// The uniform lifecycle every observer exposes to the control loop.
pub trait Observer<const N: usize, const O: usize> {
    /// Advances the held estimator by one sampling interval starting at `t`.
    fn predict(&mut self, t: Time) -> Result<&StateVector<N>, EstimationError>;

    /// Corrects the held estimator with measurement `y` taken at `t`.
    fn update(&mut self, y: &OutputVector<O>, t: Time) -> Result<&StateVector<N>, EstimationError>;

    /// Optional combined predict + update step. Doing nothing is a valid
    /// implementation for observers whose callers sequence the two calls
    /// themselves.
    fn filter(&mut self) -> Result<(), EstimationError> {
        Ok(())
    }

    /// Returns a reference to the current state estimate.
    fn estimate(&self) -> &StateVector<N>;
}

/// Fixed configuration shared by all observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObserverSettings {
    /// Sampling interval of the control loop, in seconds.
    pub dt: Time,
    /// Discretization of the continuous Jacobians.
    pub sensitivity: SensitivityApproximation,
    /// Integrator used to propagate the continuous dynamics.
    pub integrator: IntegratorKind,
    /// Integrator steps per sampling interval.
    pub substeps: usize,
    /// Reject `update` calls that are not preceded by a `predict`.
    pub strict_sequencing: bool,
}

impl Default for ObserverSettings {
    fn default() -> Self {
        Self {
            dt: 0.01,
            sensitivity: SensitivityApproximation::default(),
            integrator: IntegratorKind::default(),
            substeps: 1,
            strict_sequencing: false,
        }
    }
}

/// Which call the observer expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingPredict,
    AwaitingUpdate,
}

#[derive(Debug, Clone)]
pub(crate) struct SequenceGuard {
    strict: bool,
    phase: Phase,
}

impl SequenceGuard {
    pub(crate) fn new(strict: bool) -> Self {
        Self {
            strict,
            phase: Phase::AwaitingPredict,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn before_update(&self) -> Result<(), EstimationError> {
        if self.phase == Phase::AwaitingUpdate {
            return Ok(());
        }
        if self.strict {
            return Err(EstimationError::Sequencing {
                operation: "update",
                expected: "predict",
            });
        }
        debug!("update called without a preceding predict; correcting a stale estimate");
        Ok(())
    }

    pub(crate) fn after_predict(&mut self) {
        self.phase = Phase::AwaitingUpdate;
    }

    pub(crate) fn after_update(&mut self) {
        self.phase = Phase::AwaitingPredict;
    }
}
