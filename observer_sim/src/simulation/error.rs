// observer_sim/src/simulation/error.rs

use observer_core::error::{ConfigError, EstimationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load scenario: {0}")]
    Scenario(#[from] figment::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("observer setup failed: {0}")]
    Setup(#[from] ConfigError),

    #[error("estimation failed at t = {t:.3} s: {source}")]
    Estimation {
        t: f64,
        #[source]
        source: EstimationError,
    },
}

impl SimError {
    pub fn at(t: f64) -> impl FnOnce(EstimationError) -> SimError {
        move |source| SimError::Estimation { t, source }
    }
}
