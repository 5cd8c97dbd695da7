//! Error types for the HAL crate.

use thiserror::Error;

/// Errors a backend can report.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Circuit exceeds backend capabilities.
    #[error("Circuit exceeds backend capabilities: {0}")]
    CircuitTooLarge(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Invalid circuit.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// The run observed its cancel signal and stopped.
    #[error("Job cancelled")]
    Cancelled,

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl HalError {
    /// Whether the error describes the submitted circuit rather than the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HalError::CircuitTooLarge(_)
                | HalError::InvalidShots(_)
                | HalError::InvalidCircuit(_)
                | HalError::Unsupported(_)
        )
    }
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
