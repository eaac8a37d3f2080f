// observer_core/src/utils/mod.rs

pub mod integrators;
pub mod numerics;
