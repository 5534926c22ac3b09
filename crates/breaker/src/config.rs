//! Breaker configuration loaded from environment variables.

use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_HALF_OPEN_SUCCESSES: u32 = 1;
const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Thresholds and cooldown for a circuit breaker.
///
/// Reads from environment variables:
/// - `BREAKER_FAILURE_THRESHOLD`: consecutive failures that open the breaker (default: `5`)
/// - `BREAKER_HALF_OPEN_SUCCESSES`: trial successes that close it again (default: `1`)
/// - `BREAKER_OPEN_TIMEOUT_MS`: cooldown before half-open, in milliseconds (default: `30000`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub half_open_success_threshold: u32,
    pub open_timeout: Duration,
}

impl BreakerConfig {
    /// Creates a configuration from explicit values.
    pub fn new(
        failure_threshold: u32,
        half_open_success_threshold: u32,
        open_timeout: Duration,
    ) -> Self {
        Self {
            failure_threshold,
            half_open_success_threshold,
            open_timeout,
        }
    }

    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            failure_threshold: lookup("BREAKER_FAILURE_THRESHOLD")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.failure_threshold),
            half_open_success_threshold: lookup("BREAKER_HALF_OPEN_SUCCESSES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.half_open_success_threshold),
            open_timeout: lookup("BREAKER_OPEN_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.open_timeout),
        }
    }

    /// Checks that both thresholds and the timeout are positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroThreshold {
                name: "failure_threshold",
            });
        }
        if self.half_open_success_threshold == 0 {
            return Err(ConfigError::ZeroThreshold {
                name: "half_open_success_threshold",
            });
        }
        if self.open_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            half_open_success_threshold: DEFAULT_HALF_OPEN_SUCCESSES,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }
}
