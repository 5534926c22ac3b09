//! Circuit breaker error types.

use thiserror::Error;

/// Errors returned from [`CircuitBreaker::call`](crate::CircuitBreaker::call).
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker is open and the operation was not invoked.
    #[error("circuit breaker is open")]
    Open,

    /// The operation ran and failed.
    #[error("operation failed: {0}")]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// Returns true if the call was rejected without running the operation.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open)
    }

    /// Returns the operation's own error, if it ran.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BreakerError::Open => None,
            BreakerError::Operation(e) => Some(e),
        }
    }
}

/// Invalid breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A threshold was configured as zero.
    #[error("{name} must be greater than zero")]
    ZeroThreshold { name: &'static str },

    /// The open timeout was configured as zero.
    #[error("open timeout must be greater than zero")]
    ZeroTimeout,
}
