// observer_sim/src/simulation/runner.rs

use std::fmt;
use std::sync::Arc;

use nalgebra::{Matrix1x2, Matrix1x3, Matrix2, Matrix3, Vector1, Vector2, Vector3};
use observer_core::prelude::*;
use tracing::{debug, info};

use crate::simulation::config::ScenarioConfig;
use crate::simulation::error::SimError;
use crate::simulation::plant::MassSpringDamper;
use crate::simulation::prng::SimulationRng;
use crate::simulation::sensors::PositionSensor;

/// Augmented-state observer on the mass-spring-damper: `[x, v, d]`.
pub type ForceObserver = DisturbanceObserver<2, 1, 3, 1, 1, ExtendedKalmanFilter<3>>;
/// Plain state observer that knows the commanded force but not the disturbance.
pub type NominalObserver = StateObserver<2, 1, 1, ExtendedKalmanFilter<2>>;

/// Outcome of one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub duration: f64,
    /// RMS state error of the disturbance observer's state estimate.
    pub disturbance_observer_rmse: f64,
    /// RMS state error of the nominal observer.
    pub nominal_observer_rmse: f64,
    /// Total unmodelled force at the end of the run. The disturbance observer
    /// predicts with zero control, so the commanded force is part of it.
    pub final_unmodelled_force: f64,
    pub final_disturbance_estimate: f64,
}

impl RunSummary {
    pub fn disturbance_error(&self) -> f64 {
        (self.final_disturbance_estimate - self.final_unmodelled_force).abs()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps over {:.2} s | state RMSE: disturbance observer {:.5}, nominal observer {:.5} | force {:.4} estimated {:.4}",
            self.steps,
            self.duration,
            self.disturbance_observer_rmse,
            self.nominal_observer_rmse,
            self.final_unmodelled_force,
            self.final_disturbance_estimate,
        )
    }
}

fn build_force_observer(
    config: &ScenarioConfig,
    plant: Arc<dyn Dynamics<2, 1>>,
    sensor: &PositionSensor,
) -> Result<ForceObserver, SimError> {
    let augmented = Arc::new(InputDisturbedSystem::<2, 3, 1>::new(plant)?);
    let linearizer = AnalyticLinearizer::new(augmented.clone() as Arc<dyn Dynamics<3, 1>>)?;
    let [p0, v0] = config.plant.initial_state;
    let [q_x, q_v, q_d] = config.tuning.process_noise;

    let observer = ForceObserver::new(
        augmented,
        Box::new(linearizer),
        &config.observer,
        Matrix1x3::new(1.0, 0.0, 0.0),
        ExtendedKalmanFilter::new(
            Vector3::new(p0, v0, 0.0),
            Matrix3::identity() * config.tuning.initial_variance,
        ),
        Matrix3::from_diagonal(&Vector3::new(q_x, q_v, q_d)),
        sensor.covariance(),
    )?;
    Ok(observer)
}

fn build_nominal_observer(
    config: &ScenarioConfig,
    plant: Arc<dyn Dynamics<2, 1>>,
    sensor: &PositionSensor,
) -> Result<NominalObserver, SimError> {
    let linearizer = AnalyticLinearizer::new(plant.clone())?;
    let [p0, v0] = config.plant.initial_state;
    let [q_x, q_v, _] = config.tuning.process_noise;

    let observer = NominalObserver::new(
        plant,
        Box::new(linearizer),
        &config.observer,
        Matrix1x2::new(1.0, 0.0),
        ExtendedKalmanFilter::new(
            Vector2::new(p0, v0),
            Matrix2::identity() * config.tuning.initial_variance,
        ),
        Matrix2::from_diagonal(&Vector2::new(q_x, q_v)),
        sensor.covariance(),
    )?;
    Ok(observer)
}

/// Simulates the true plant and runs both observers side by side.
///
/// The disturbance observer is driven with explicit `predict`/`update`
/// calls; the nominal observer is fed its control and measurement and
/// stepped with `filter`.
pub fn run(config: &ScenarioConfig) -> Result<RunSummary, SimError> {
    config.validate()?;

    let plant_model = MassSpringDamper::from_config(&config.plant);
    let plant: Arc<dyn Dynamics<2, 1>> = Arc::new(plant_model);
    let sensor = PositionSensor::new(config.sensor.noise_stddev)?;
    let mut rng = SimulationRng::from_seed(config.simulation.seed);

    let mut force_observer = build_force_observer(config, plant.clone(), &sensor)?;
    let mut nominal_observer = build_nominal_observer(config, plant.clone(), &sensor)?;

    let settings = &config.observer;
    let dt = settings.dt;
    let steps = config.steps();
    info!(
        steps,
        dt,
        seed = config.simulation.seed,
        equilibrium = plant_model.equilibrium(config.disturbance.magnitude),
        "Starting run"
    );

    let mut truth = Vector2::from(config.plant.initial_state);
    let mut force_sq_error = 0.0;
    let mut nominal_sq_error = 0.0;
    let mut last_force = 0.0;

    for k in 0..steps {
        let t = k as f64 * dt;
        let commanded = config.control.at(t);
        last_force = commanded + config.disturbance.at(t);

        // Truth advances under the commanded force plus the disturbance.
        truth = plant.propagate(
            &truth,
            &Vector1::new(last_force),
            t,
            dt,
            settings.substeps,
            &settings.integrator,
        );
        let y = sensor.measure(&truth, &mut rng);

        force_observer.predict(t).map_err(SimError::at(t))?;
        force_observer.update(&y, t + dt).map_err(SimError::at(t))?;

        nominal_observer.set_control(Vector1::new(commanded));
        nominal_observer.queue_measurement(y);
        nominal_observer.filter().map_err(SimError::at(t))?;

        force_sq_error += (force_observer.state_estimate() - truth).norm_squared();
        nominal_sq_error += (nominal_observer.estimate() - truth).norm_squared();

        if k % 100 == 0 {
            debug!(
                t,
                position = truth[0],
                disturbance_estimate = force_observer.disturbance_estimate()[0],
                "step"
            );
        }
    }

    let denom = steps.max(1) as f64;
    let summary = RunSummary {
        steps,
        duration: steps as f64 * dt,
        disturbance_observer_rmse: (force_sq_error / denom).sqrt(),
        nominal_observer_rmse: (nominal_sq_error / denom).sqrt(),
        final_unmodelled_force: last_force,
        final_disturbance_estimate: force_observer.disturbance_estimate()[0],
    };
    info!(%summary, "Run complete");
    Ok(summary)
}
