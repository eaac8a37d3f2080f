// observer_core/src/models/estimation/mod.rs

//! The discrete-time model contracts consumed by the estimators.

pub mod dynamics;
pub mod measurement;
