// observer_core/src/observer/disturbance.rs

use std::sync::Arc;

use nalgebra::SVector;
use tracing::debug;

use crate::error::{ConfigError, EstimationError};
use crate::estimation::RecursiveEstimator;
use crate::models::dynamics::disturbed::DisturbedSystem;
use crate::models::dynamics::Dynamics;
use crate::models::linearization::Linearizer;
use crate::observer::{Observer, ObserverSettings, StateObserver};
use crate::types::{
    ControlVector, OutputCovariance, OutputMatrix, OutputVector, StateMatrix, StateVector, Time,
};

/// Jointly estimates the nominal state and an additive disturbance.
///
/// The held estimator runs on the augmented state `[x (S), d (D)]` of
/// dimension `A = S + D`. Prediction always applies zero control: the
/// disturbance channels are expected to absorb whatever actually drove the
/// plant, so the observer is never told the commanded input. Callers drive
/// `predict` and `update` directly; `filter` is a no-op.
#[derive(Debug)]
pub struct DisturbanceObserver<
    const S: usize,
    const D: usize,
    const A: usize,
    const M: usize,
    const O: usize,
    E,
> {
    inner: StateObserver<A, M, O, E>,
}

impl<const S: usize, const D: usize, const A: usize, const M: usize, const O: usize, E>
    DisturbanceObserver<S, D, A, M, O, E>
where
    E: RecursiveEstimator<A>,
{
    /// `c`, `q` and `r` are all expressed on the augmented state.
    pub fn new<Sys>(
        system: Arc<Sys>,
        linearizer: Box<dyn Linearizer<A, M>>,
        settings: &ObserverSettings,
        c: OutputMatrix<O, A>,
        estimator: E,
        q: StateMatrix<A>,
        r: OutputCovariance<O>,
    ) -> Result<Self, ConfigError>
    where
        Sys: DisturbedSystem<A, M> + 'static,
    {
        check_dimension("nominal state", S, Sys::STATE_DIM)?;
        check_dimension("disturbance", D, Sys::DIST_DIM)?;
        check_dimension("augmented state", S + D, A)?;

        let system: Arc<dyn Dynamics<A, M>> = system;
        let inner = StateObserver::new(system, linearizer, settings, c, estimator, q, r)?;

        debug!(
            states = S,
            disturbances = D,
            "Created disturbance observer"
        );
        Ok(Self { inner })
    }

    /// The nominal-state part of the augmented estimate.
    pub fn state_estimate(&self) -> StateVector<S> {
        self.inner.estimate().fixed_rows::<S>(0).into_owned()
    }

    /// The disturbance part of the augmented estimate.
    pub fn disturbance_estimate(&self) -> SVector<f64, D> {
        self.inner.estimate().fixed_rows::<D>(S).into_owned()
    }

    pub fn estimator(&self) -> &E {
        self.inner.estimator()
    }

    /// The underlying observer on the augmented state.
    pub fn inner(&self) -> &StateObserver<A, M, O, E> {
        &self.inner
    }
}

fn check_dimension(what: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}

// `filter` keeps the trait's no-op default.
impl<const S: usize, const D: usize, const A: usize, const M: usize, const O: usize, E>
    Observer<A, O> for DisturbanceObserver<S, D, A, M, O, E>
where
    E: RecursiveEstimator<A>,
{
    fn predict(&mut self, t: Time) -> Result<&StateVector<A>, EstimationError> {
        self.inner.predict_with_control(&ControlVector::zeros(), t)
    }

    fn update(&mut self, y: &OutputVector<O>, _t: Time) -> Result<&StateVector<A>, EstimationError> {
        self.inner.correct(y)
    }

    fn estimate(&self) -> &StateVector<A> {
        self.inner.estimate()
    }
}
