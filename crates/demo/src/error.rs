//! Demo error types.

use breaker::{BreakerError, ConfigError};
use saga::SagaError;
use thiserror::Error;

/// Errors that abort a demo scenario.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The breaker configuration was rejected.
    #[error("Invalid breaker configuration: {0}")]
    Config(#[from] ConfigError),

    /// The saga could not accept or settle an order.
    #[error("Saga error: {0}")]
    Saga(#[from] SagaError),

    /// An order submission was rejected by the breaker or failed outright.
    #[error("Order submission failed: {0}")]
    Submission(#[from] BreakerError<SagaError>),
}
