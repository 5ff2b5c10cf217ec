use thiserror::Error;

use crate::geometry::ValidationError;

/// Rejected simplifier parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("epsilon must be finite, got {0}")]
    NonFiniteEpsilon(f64),
    #[error("epsilon must be positive, got {0}")]
    NonPositiveEpsilon(f64),
    #[error("mitre limit must be finite and at least 1, got {0}")]
    MitreLimitTooSmall(f64),
}

/// Why no simplification was attempted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainmentError {
    #[error("invalid hazard polygon: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid parameter: {0}")]
    Parameter(#[from] ParameterError),
}
