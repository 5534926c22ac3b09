//! Circuit breaker state machine.

use serde::{Deserialize, Serialize};

/// The state of a circuit breaker.
///
/// State transitions:
/// ```text
/// Closed ──(failures >= threshold)──► Open ──(open timeout)──► HalfOpen
///   ▲                                  ▲                          │
///   │                                  └────(trial call fails)────┤
///   └────────────────(successes >= threshold)─────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BreakerState {
    /// Calls pass through and failures are counted.
    #[default]
    Closed,

    /// Calls are rejected without invoking the operation.
    Open,

    /// Trial calls pass through to check for recovery.
    HalfOpen,
}

impl BreakerState {
    /// Returns true if the wrapped operation may be invoked in this state.
    pub fn allows_calls(&self) -> bool {
        matches!(self, BreakerState::Closed | BreakerState::HalfOpen)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "Closed",
            BreakerState::Open => "Open",
            BreakerState::HalfOpen => "HalfOpen",
        }
    }
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_closed() {
        assert_eq!(BreakerState::default(), BreakerState::Closed);
    }

    #[test]
    fn test_allows_calls() {
        assert!(BreakerState::Closed.allows_calls());
        assert!(!BreakerState::Open.allows_calls());
        assert!(BreakerState::HalfOpen.allows_calls());
    }

    #[test]
    fn test_display() {
        assert_eq!(BreakerState::Closed.to_string(), "Closed");
        assert_eq!(BreakerState::Open.to_string(), "Open");
        assert_eq!(BreakerState::HalfOpen.to_string(), "HalfOpen");
    }

    #[test]
    fn test_serialization() {
        let state = BreakerState::HalfOpen;
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: BreakerState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
