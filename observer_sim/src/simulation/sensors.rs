// observer_sim/src/simulation/sensors.rs

use nalgebra::{Matrix1, Vector1};
use observer_core::prelude::*;
use rand_distr::{Distribution, Normal};

use crate::simulation::error::SimError;
use crate::simulation::prng::SimulationRng;

/// Measures the plant position with additive white Gaussian noise.
#[derive(Debug, Clone)]
pub struct PositionSensor {
    noise_stddev: f64,
    // Store the noise distribution for efficiency
    noise_dist: Normal<f64>,
}

impl PositionSensor {
    pub fn new(noise_stddev: f64) -> Result<Self, SimError> {
        // `Normal::new` accepts a negative standard deviation and mirrors the samples.
        if !(noise_stddev.is_finite() && noise_stddev >= 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "sensor noise stddev must be finite and non-negative, got {noise_stddev}"
            )));
        }
        let noise_dist = Normal::new(0.0, noise_stddev).map_err(|e| {
            SimError::InvalidScenario(format!("sensor noise stddev {noise_stddev}: {e}"))
        })?;
        Ok(Self {
            noise_stddev,
            noise_dist,
        })
    }

    /// The measurement noise covariance `R` matching this sensor.
    pub fn covariance(&self) -> OutputCovariance<1> {
        Matrix1::new(self.noise_stddev.powi(2))
    }

    pub fn measure(&self, x: &StateVector<2>, rng: &mut SimulationRng) -> OutputVector<1> {
        Vector1::new(x[0] + self.noise_dist.sample(&mut rng.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn test_rejects_invalid_noise() {
        assert!(PositionSensor::new(-1.0).is_err());
        assert!(PositionSensor::new(f64::NAN).is_err());
    }

    #[test]
    fn test_same_seed_same_measurements() {
        let sensor = PositionSensor::new(0.1).unwrap();
        let x = Vector2::new(1.0, 0.0);
        let mut a = SimulationRng::from_seed(9);
        let mut b = SimulationRng::from_seed(9);
        for _ in 0..10 {
            assert_eq!(sensor.measure(&x, &mut a), sensor.measure(&x, &mut b));
        }
    }

    #[test]
    fn test_noise_free_sensor_is_exact() {
        let sensor = PositionSensor::new(0.0).unwrap();
        let mut rng = SimulationRng::from_seed(1);
        let y = sensor.measure(&Vector2::new(0.25, 3.0), &mut rng);
        assert_eq!(y[0], 0.25);
        assert_eq!(sensor.covariance()[(0, 0)], 0.0);
    }
}
