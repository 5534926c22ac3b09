//! Orders and the command that submits them.

use common::{Amount, OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagaError};
use crate::state::OrderState;

/// An order as recorded in the tracker's log and carried on the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Position in the tracker's append-only log.
    pub id: OrderId,
    pub user_id: UserId,
    /// Credit to reserve for this order.
    pub price: Amount,
    pub state: OrderState,
}

impl Order {
    /// Creates a freshly submitted order.
    pub fn pending(id: OrderId, user_id: UserId, price: Amount) -> Self {
        Self {
            id,
            user_id,
            price,
            state: OrderState::Pending,
        }
    }

    /// Applies a reservation outcome, moving Pending to Accepted or Rejected.
    pub fn settle(&mut self, reserved: bool) -> Result<OrderState> {
        if !self.state.can_settle() {
            return Err(SagaError::AlreadySettled {
                order_id: self.id,
                state: self.state,
            });
        }
        self.state = if reserved {
            OrderState::Accepted
        } else {
            OrderState::Rejected
        };
        Ok(self.state)
    }
}

/// Command to submit a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOrder {
    pub user_id: UserId,
    pub price: Amount,
}

impl SubmitOrder {
    pub fn new(user_id: impl Into<UserId>, price: Amount) -> Self {
        Self {
            user_id: user_id.into(),
            price,
        }
    }
}
