// observer_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::estimation::{Estimator, RecursiveEstimator, StateEstimate};
pub use crate::models::dynamics::disturbed::DisturbedSystem;
pub use crate::models::dynamics::Dynamics;
pub use crate::models::estimation::dynamics::SystemModel;
pub use crate::models::estimation::measurement::MeasurementModel;
pub use crate::models::linearization::Linearizer;
pub use crate::observer::Observer;
pub use crate::utils::integrators::Integrator;

// --- Errors and Types ---
pub use crate::error::{ConfigError, EstimationError, NumericalIssue, Stage};
pub use crate::types::{
    ControlMatrix, ControlVector, OutputCovariance, OutputMatrix, OutputVector, StateMatrix,
    StateVector, Time,
};

// --- Estimation Algorithms ---
pub use crate::estimation::filters::ekf::{CovarianceUpdate, ExtendedKalmanFilter};
pub use crate::estimation::filters::ukf::{UkfParams, UnscentedKalmanFilter};

// --- Concrete Model Implementations ---
pub use crate::models::dynamics::disturbed::InputDisturbedSystem;
pub use crate::models::dynamics::linear::LinearDynamics;
pub use crate::models::estimation::dynamics::{ContinuousSystemModel, LinearSystemModel};
pub use crate::models::estimation::measurement::{LinearMeasurementModel, NumDiffMeasurementModel};
pub use crate::models::linearization::{AnalyticLinearizer, DifferenceScheme, NumDiffLinearizer};
pub use crate::models::sensitivity::SensitivityApproximation;
pub use crate::utils::integrators::{IntegratorKind, RK1, RK2, RK3, RK4, RK4ThreeEighths};

// --- Observers ---
pub use crate::observer::{DisturbanceObserver, ObserverSettings, Phase, StateObserver};
