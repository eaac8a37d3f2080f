// observer_core/src/error.rs

use std::fmt;
use thiserror::Error;

/// Problems with how an observer or model was put together.
///
/// These are raised at construction time, never deferred to the first
/// predict/update.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("sampling interval must be finite and positive, got {0}")]
    InvalidSamplingInterval(f64),

    #[error("integration substeps must be at least 1")]
    InvalidSubsteps,

    #[error("{0} contains non-finite entries")]
    NonFinite(&'static str),

    #[error("{0} must be symmetric")]
    NotSymmetric(&'static str),

    #[error("{0} does not provide analytic Jacobians")]
    MissingJacobian(&'static str),
}

/// The step of the recursion in which a numerical failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Predict,
    Update,
    Linearize,
    Discretize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Predict => "predict",
            Stage::Update => "update",
            Stage::Linearize => "linearize",
            Stage::Discretize => "discretize",
        };
        f.write_str(name)
    }
}

/// What went wrong with the offending matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericalIssue {
    Singular,
    NonFinite,
    NotPositiveDefinite,
}

impl fmt::Display for NumericalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumericalIssue::Singular => "is singular",
            NumericalIssue::NonFinite => "contains non-finite entries",
            NumericalIssue::NotPositiveDefinite => "is not positive definite",
        };
        f.write_str(name)
    }
}

/// Every failure the estimation core can surface to its caller.
///
/// Nothing is retried or regularized internally; the control loop that owns
/// the observer decides on the fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("numerical failure during {stage}: {matrix} {issue}")]
    Numerical {
        stage: Stage,
        matrix: &'static str,
        issue: NumericalIssue,
    },

    #[error("sequencing error: {operation} called while awaiting {expected}")]
    Sequencing {
        operation: &'static str,
        expected: &'static str,
    },
}

impl EstimationError {
    pub fn numerical(stage: Stage, matrix: &'static str, issue: NumericalIssue) -> Self {
        EstimationError::Numerical {
            stage,
            matrix,
            issue,
        }
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, EstimationError::Numerical { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, EstimationError::Config(_))
    }
}
