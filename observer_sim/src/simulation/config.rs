// observer_sim/src/simulation/config.rs

//! Scenario configuration. Values are layered with figment: built-in
//! defaults, then the scenario TOML file, then command-line overrides.

use std::path::Path;

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use observer_core::observer::ObserverSettings;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::Cli;
use crate::simulation::error::SimError;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// The root of the data parsed from a scenario TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub plant: PlantConfig,
    #[serde(default)]
    pub disturbance: DisturbanceConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub observer: ObserverSettings,
    #[serde(default)]
    pub tuning: TuningConfig,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    /// Seed for the pseudo-random number generator.
    pub seed: u64,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: 42,
            duration_seconds: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
    /// Initial `[position, velocity]` of the true plant.
    pub initial_state: [f64; 2],
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: 2.0,
            damping: 0.5,
            initial_state: [0.0, 0.0],
        }
    }
}

/// A force step of `magnitude` newtons applied from `onset` seconds on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisturbanceConfig {
    pub magnitude: f64,
    pub onset: f64,
}

impl Default for DisturbanceConfig {
    fn default() -> Self {
        Self {
            magnitude: 0.5,
            onset: 0.0,
        }
    }
}

impl DisturbanceConfig {
    pub fn at(&self, t: f64) -> f64 {
        if t >= self.onset {
            self.magnitude
        } else {
            0.0
        }
    }
}

/// Commanded force `amplitude * sin(2π frequency_hz t)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    pub amplitude: f64,
    pub frequency_hz: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            amplitude: 0.0,
            frequency_hz: 0.2,
        }
    }
}

impl ControlConfig {
    pub fn at(&self, t: f64) -> f64 {
        self.amplitude * (std::f64::consts::TAU * self.frequency_hz * t).sin()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    pub noise_stddev: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { noise_stddev: 0.01 }
    }
}

/// Filter tuning. Covariances are given as diagonals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuningConfig {
    /// Process noise on `[position, velocity, disturbance]`.
    pub process_noise: [f64; 3],
    /// Initial variance of every estimated component.
    pub initial_variance: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            process_noise: [1e-8, 1e-6, 1e-6],
            initial_variance: 1.0,
        }
    }
}

// =========================================================================
// == Loading ==
// =========================================================================

impl ScenarioConfig {
    /// Layers defaults, the TOML file at `path` and the CLI overrides.
    pub fn figment(path: &Path, cli: &Cli) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(ScenarioConfig::default()))
            .merge(Toml::file(path));
        if let Some(seed) = cli.seed {
            figment = figment.merge(Serialized::default("simulation.seed", seed));
        }
        if let Some(duration) = cli.duration {
            figment = figment.merge(Serialized::default("simulation.duration_seconds", duration));
        }
        figment
    }

    pub fn load(cli: &Cli) -> Result<Self, SimError> {
        info!("Loading scenario from: {}", cli.scenario.display());
        if !cli.scenario.exists() {
            return Err(SimError::InvalidScenario(format!(
                "scenario file {} not found",
                cli.scenario.display()
            )));
        }
        let config: ScenarioConfig = Self::figment(&cli.scenario, cli).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values figment cannot: physical parameters and durations.
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("plant.mass", self.plant.mass),
            ("plant.stiffness", self.plant.stiffness),
            ("simulation.duration_seconds", self.simulation.duration_seconds),
            ("tuning.initial_variance", self.tuning.initial_variance),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidScenario(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.sensor.noise_stddev.is_finite() && self.sensor.noise_stddev >= 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "sensor.noise_stddev must be non-negative, got {}",
                self.sensor.noise_stddev
            )));
        }
        if self.plant.damping < 0.0 {
            return Err(SimError::InvalidScenario(format!(
                "plant.damping must be non-negative, got {}",
                self.plant.damping
            )));
        }
        Ok(())
    }

    /// Number of whole sampling intervals in the run.
    pub fn steps(&self) -> usize {
        (self.simulation.duration_seconds / self.observer.dt).round() as usize
    }
}
