//! Saga error types.

use common::{OrderId, UserId};
use thiserror::Error;

use crate::state::OrderState;

/// Errors that can occur while running the saga.
///
/// Insufficient credit is not an error: it is reported as a failed
/// reservation and ends with the order rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SagaError {
    /// No order with this id exists in the log.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order has already left Pending.
    #[error("Order {order_id} already settled as {state}")]
    AlreadySettled { order_id: OrderId, state: OrderState },

    /// The ledger already holds a reservation for this order.
    #[error("Order {0} already holds a reservation")]
    AlreadyReserved(OrderId),

    /// Crediting the user would overflow their balance.
    #[error("Balance overflow for user {0}")]
    BalanceOverflow(UserId),

    /// The peer service's inbound channel is gone.
    #[error("Event channel closed")]
    ChannelClosed,
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
