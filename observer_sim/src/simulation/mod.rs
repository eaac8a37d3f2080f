// observer_sim/src/simulation/mod.rs

//! Everything needed to run one closed-loop estimation scenario: the plant,
//! its sensor, the configuration that describes them, and the runner that
//! drives the observers.

pub mod config;
pub mod error;
pub mod plant;
pub mod prng;
pub mod runner;
pub mod sensors;
