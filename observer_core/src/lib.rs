// observer_core/src/lib.rs

//! State and disturbance observers for continuous-time systems sampled by a
//! discrete control loop.
//!
//! A continuous model ([`models::dynamics::Dynamics`]) is linearized and
//! discretized once per sampling interval and fed to a recursive estimator
//! (EKF or UKF). Observers wrap the whole arrangement behind a
//! predict/update lifecycle.

pub mod error;
pub mod estimation;
pub mod models;
pub mod observer;
pub mod prelude;
pub mod types;
pub mod utils;
