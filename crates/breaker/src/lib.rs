//! Circuit breaker for fallible async operations.
//!
//! A [`CircuitBreaker`] wraps calls to an unreliable collaborator:
//! 1. While Closed, calls pass through and consecutive failures are counted
//! 2. Once the failure threshold is hit, the breaker opens and rejects calls
//! 3. After the open timeout a timer moves it to HalfOpen for trial calls
//!
//! Trial successes close the breaker again. A trial failure reopens it.

pub mod breaker;
pub mod config;
pub mod error;
pub mod state;

pub use breaker::CircuitBreaker;
pub use config::BreakerConfig;
pub use error::{BreakerError, ConfigError};
pub use state::BreakerState;
