//! Error types for hardening configuration and protected values

use crate::tmr::ChecksumMismatch;
use thiserror::Error;

/// Rejected hardening configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HardeningError {
    /// Budget outside [0, 1]
    #[error("resource budget must be within [0, 1], got {0}")]
    InvalidBudget(f64),

    /// Criticality threshold outside [0, 1]
    #[error("criticality threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    /// Metric weight negative or not finite
    #[error("metric weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
}

/// A protected value could not be recovered
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecoverError {
    #[error(transparent)]
    ChecksumMismatch(#[from] ChecksumMismatch),
}
