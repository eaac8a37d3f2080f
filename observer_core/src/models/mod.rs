// observer_core/src/models/mod.rs

pub mod dynamics;
pub mod estimation;
pub mod linearization;
pub mod sensitivity;
