// observer_core/src/observer/state.rs

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ConfigError, EstimationError};
use crate::estimation::RecursiveEstimator;
use crate::models::dynamics::Dynamics;
use crate::models::estimation::dynamics::ContinuousSystemModel;
use crate::models::estimation::measurement::LinearMeasurementModel;
use crate::models::linearization::Linearizer;
use crate::observer::{Observer, ObserverSettings, Phase, SequenceGuard};
use crate::types::{
    ControlVector, OutputCovariance, OutputMatrix, OutputVector, StateMatrix, StateVector, Time,
};
use crate::utils::numerics::{validate_finite, validate_symmetric};

/// Estimates the state of a continuous system `ẋ = f(x, u, t)` measured
/// through a linear sensor `y = C x + w`.
///
/// The observer owns its estimator, its discrete system model (and with it the
/// Jacobian cache) and the noise covariances `Q` and `R`, which stay fixed for
/// its whole lifetime. The control used during prediction is the last one set
/// with [`StateObserver::set_control`].
#[derive(Debug)]
pub struct StateObserver<const N: usize, const M: usize, const O: usize, E> {
    system_model: ContinuousSystemModel<N, M>,
    measurement_model: LinearMeasurementModel<O, N>,
    estimator: E,
    process_noise: StateMatrix<N>,
    measurement_noise: OutputCovariance<O>,

    control: ControlVector<M>,
    time: Time,
    pending: Option<OutputVector<O>>,
    guard: SequenceGuard,
}

impl<const N: usize, const M: usize, const O: usize, E> StateObserver<N, M, O, E>
where
    E: RecursiveEstimator<N>,
{
    pub fn new(
        system: Arc<dyn Dynamics<N, M>>,
        linearizer: Box<dyn Linearizer<N, M>>,
        settings: &ObserverSettings,
        c: OutputMatrix<O, N>,
        estimator: E,
        q: StateMatrix<N>,
        r: OutputCovariance<O>,
    ) -> Result<Self, ConfigError> {
        validate_finite(&c, "output matrix")?;
        validate_finite(&q, "process noise covariance")?;
        validate_finite(&r, "measurement noise covariance")?;
        validate_symmetric(&q, "process noise covariance")?;
        validate_symmetric(&r, "measurement noise covariance")?;

        let system_model = ContinuousSystemModel::new(
            system,
            linearizer,
            settings.dt,
            settings.sensitivity,
            settings.integrator,
            settings.substeps,
        )?;

        debug!(
            states = N,
            controls = M,
            outputs = O,
            dt = settings.dt,
            sensitivity = ?settings.sensitivity,
            integrator = ?settings.integrator,
            "Created state observer"
        );

        Ok(Self {
            system_model,
            measurement_model: LinearMeasurementModel::new(c),
            estimator,
            process_noise: q,
            measurement_noise: r,
            control: ControlVector::zeros(),
            time: 0.0,
            pending: None,
            guard: SequenceGuard::new(settings.strict_sequencing),
        })
    }

    /// Sets the control applied during subsequent predictions.
    pub fn set_control(&mut self, u: ControlVector<M>) {
        self.control = u;
    }

    pub fn control(&self) -> &ControlVector<M> {
        &self.control
    }

    /// Stores a measurement to be consumed by the next [`Observer::filter`].
    /// A newer measurement replaces an unconsumed one.
    pub fn queue_measurement(&mut self, y: OutputVector<O>) {
        if self.pending.replace(y).is_some() {
            debug!("Replaced an unconsumed queued measurement");
        }
    }

    /// Start time of the next prediction driven by [`Observer::filter`].
    pub fn time(&self) -> Time {
        self.time
    }

    pub fn sampling_interval(&self) -> Time {
        self.system_model.sampling_interval()
    }

    pub fn phase(&self) -> Phase {
        self.guard.phase()
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn process_noise(&self) -> &StateMatrix<N> {
        &self.process_noise
    }

    pub fn measurement_noise(&self) -> &OutputCovariance<O> {
        &self.measurement_noise
    }

    pub fn observation_matrix(&self) -> &OutputMatrix<O, N> {
        self.measurement_model.observation_matrix()
    }

    /// Predicts with an explicit control instead of the stored one.
    pub(crate) fn predict_with_control(
        &mut self,
        u: &ControlVector<M>,
        t: Time,
    ) -> Result<&StateVector<N>, EstimationError> {
        match self
            .estimator
            .predict(&mut self.system_model, u, &self.process_noise, t)
        {
            Ok(x) => {
                self.guard.after_predict();
                self.time = t + self.system_model.sampling_interval();
                Ok(x)
            }
            Err(e) => {
                warn!(%e, t, "Prediction failed; estimate left unchanged");
                Err(e)
            }
        }
    }

    /// Measurement correction. Time plays no role in a linear sensor model.
    pub(crate) fn correct(&mut self, y: &OutputVector<O>) -> Result<&StateVector<N>, EstimationError> {
        self.guard.before_update()?;
        match self
            .estimator
            .update(y, &mut self.measurement_model, &self.measurement_noise)
        {
            Ok(x) => {
                self.guard.after_update();
                Ok(x)
            }
            Err(e) => {
                warn!(%e, "Update failed; estimate left unchanged");
                Err(e)
            }
        }
    }
}

impl<const N: usize, const M: usize, const O: usize, E> Observer<N, O> for StateObserver<N, M, O, E>
where
    E: RecursiveEstimator<N>,
{
    fn predict(&mut self, t: Time) -> Result<&StateVector<N>, EstimationError> {
        let u = self.control;
        self.predict_with_control(&u, t)
    }

    fn update(&mut self, y: &OutputVector<O>, _t: Time) -> Result<&StateVector<N>, EstimationError> {
        self.correct(y)
    }

    /// Predicts from the internal clock, then consumes the queued measurement
    /// if there is one.
    fn filter(&mut self) -> Result<(), EstimationError> {
        let t = self.time;
        let u = self.control;
        self.predict_with_control(&u, t)?;
        if let Some(y) = self.pending.take() {
            self.correct(&y)?;
        }
        Ok(())
    }

    fn estimate(&self) -> &StateVector<N> {
        self.estimator.estimate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::filters::ekf::ExtendedKalmanFilter;
    use crate::models::dynamics::linear::LinearDynamics;
    use crate::models::linearization::AnalyticLinearizer;
    use crate::models::sensitivity::SensitivityApproximation;
    use crate::utils::integrators::IntegratorKind;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix1, Matrix1x2, Matrix2, Vector1, Vector2};

    type Ekf2 = ExtendedKalmanFilter<2>;

    // Double integrator: position and velocity driven by an acceleration input.
    fn double_integrator() -> Arc<dyn Dynamics<2, 1>> {
        Arc::new(LinearDynamics::new(
            Matrix2::new(0.0, 1.0, 0.0, 0.0),
            Vector2::new(0.0, 1.0),
        ))
    }

    fn settings(strict: bool) -> ObserverSettings {
        ObserverSettings {
            dt: 0.1,
            sensitivity: SensitivityApproximation::Tustin,
            integrator: IntegratorKind::Rk4,
            substeps: 1,
            strict_sequencing: strict,
        }
    }

    fn observer(strict: bool) -> StateObserver<2, 1, 1, Ekf2> {
        let system = double_integrator();
        let linearizer = Box::new(AnalyticLinearizer::new(system.clone()).unwrap());
        StateObserver::new(
            system,
            linearizer,
            &settings(strict),
            Matrix1x2::new(1.0, 0.0),
            Ekf2::default(),
            Matrix2::identity() * 1e-4,
            Matrix1::new(1e-2),
        )
        .expect("valid observer")
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let system = double_integrator();
        let make = |dt: f64, q: Matrix2<f64>, r: f64| {
            StateObserver::<2, 1, 1, Ekf2>::new(
                system.clone(),
                Box::new(AnalyticLinearizer::new(system.clone()).unwrap()),
                &ObserverSettings { dt, ..settings(false) },
                Matrix1x2::new(1.0, 0.0),
                Ekf2::default(),
                q,
                Matrix1::new(r),
            )
        };

        assert!(make(0.1, Matrix2::identity(), 1.0).is_ok());
        assert!(matches!(
            make(0.0, Matrix2::identity(), 1.0),
            Err(ConfigError::InvalidSamplingInterval(_))
        ));
        assert!(matches!(
            make(0.1, Matrix2::new(1.0, 0.5, 0.0, 1.0), 1.0),
            Err(ConfigError::NotSymmetric(_))
        ));
        assert!(matches!(
            make(0.1, Matrix2::identity(), f64::NAN),
            Err(ConfigError::NonFinite(_))
        ));
    }

    #[test]
    fn test_missing_jacobian_fails_at_construction() {
        // Derivatives only; no closed-form Jacobians.
        #[derive(Debug)]
        struct Opaque;

        impl Dynamics<2, 1> for Opaque {
            fn get_derivatives(&self, x: &StateVector<2>, u: &ControlVector<1>, _t: Time) -> StateVector<2> {
                Vector2::new(x[1], u[0] - x[0].sin())
            }
        }

        let system: Arc<dyn Dynamics<2, 1>> = Arc::new(Opaque);
        let build = || -> Result<StateObserver<2, 1, 1, Ekf2>, ConfigError> {
            let linearizer = AnalyticLinearizer::new(system.clone())?;
            StateObserver::new(
                system.clone(),
                Box::new(linearizer),
                &settings(false),
                Matrix1x2::new(1.0, 0.0),
                Ekf2::default(),
                Matrix2::identity(),
                Matrix1::new(1.0),
            )
        };
        assert!(matches!(
            build(),
            Err(ConfigError::MissingJacobian("dynamics model"))
        ));
    }

    #[test]
    fn test_predict_uses_stored_control() {
        let mut obs = observer(false);
        obs.set_control(Vector1::new(2.0));
        let x = *obs.predict(0.0).unwrap();

        // Exact discretization of a constant acceleration over dt = 0.1.
        assert_relative_eq!(x[0], 0.5 * 2.0 * 0.01, epsilon = 1e-12);
        assert_relative_eq!(x[1], 0.2, epsilon = 1e-12);
        assert_relative_eq!(obs.time(), 0.1);
    }

    #[test]
    fn test_update_ignores_time() {
        let mut a = observer(false);
        let mut b = observer(false);
        a.predict(0.0).unwrap();
        b.predict(0.0).unwrap();

        let y = Vector1::new(1.0);
        let xa = *a.update(&y, 0.0).unwrap();
        let xb = *b.update(&y, 123.0).unwrap();
        assert_eq!(xa, xb);
    }

    #[test]
    fn test_strict_sequencing() {
        let mut obs = observer(true);
        let y = Vector1::new(1.0);
        assert!(matches!(
            obs.update(&y, 0.0),
            Err(EstimationError::Sequencing { .. })
        ));
        assert_eq!(*obs.estimate(), Vector2::zeros());

        obs.predict(0.0).unwrap();
        obs.predict(0.1).unwrap();
        assert!(obs.update(&y, 0.2).is_ok());
        assert!(obs.update(&y, 0.2).is_err());
    }

    #[test]
    fn test_lenient_sequencing_allows_update_first() {
        let mut obs = observer(false);
        let x = *obs.update(&Vector1::new(1.0), 0.0).unwrap();
        assert!(x[0] > 0.0);
    }

    #[test]
    fn test_filter_matches_explicit_calls() {
        let mut driven = observer(false);
        let mut manual = observer(false);
        driven.set_control(Vector1::new(1.0));
        manual.set_control(Vector1::new(1.0));

        for k in 0..20 {
            let y = Vector1::new(0.05 * k as f64);
            driven.queue_measurement(y);
            driven.filter().unwrap();

            let t = k as f64 * 0.1;
            manual.predict(t).unwrap();
            manual.update(&y, t).unwrap();
        }

        assert_relative_eq!(*driven.estimate(), *manual.estimate(), epsilon = 1e-12);
        assert_relative_eq!(driven.time(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_filter_without_measurement_only_predicts() {
        let mut obs = observer(false);
        obs.set_control(Vector1::new(1.0));
        obs.filter().unwrap();
        assert_eq!(obs.phase(), Phase::AwaitingUpdate);
        assert_relative_eq!(obs.estimate()[1], 0.1, epsilon = 1e-12);
    }
}
