//! Order lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The state of an order in the saga.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Accepted
///           └──► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderState {
    /// Submitted, waiting for the ledger's reservation outcome.
    #[default]
    Pending,

    /// Credit was reserved and the order went through (terminal state).
    Accepted,

    /// Credit could not be reserved (terminal state).
    Rejected,
}

impl OrderState {
    /// Returns true if a reservation outcome can still be applied.
    pub fn can_settle(&self) -> bool {
        matches!(self, OrderState::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_settled(&self) -> bool {
        matches!(self, OrderState::Accepted | OrderState::Rejected)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "Pending",
            OrderState::Accepted => "Accepted",
            OrderState::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
