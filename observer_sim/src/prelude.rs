// observer_sim/src/prelude.rs

pub use crate::cli::Cli;
pub use crate::simulation::config::ScenarioConfig;
pub use crate::simulation::error::SimError;
pub use crate::simulation::plant::MassSpringDamper;
pub use crate::simulation::prng::SimulationRng;
pub use crate::simulation::runner::{run, RunSummary};
pub use crate::simulation::sensors::PositionSensor;
