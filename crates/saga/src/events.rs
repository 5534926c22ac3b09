//! Events exchanged between the order tracker and the credit ledger.

use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Outcome of a single reservation attempt for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEvent {
    pub order_id: OrderId,
    pub success: bool,
}

/// Payloads carried on the saga's event streams.
///
/// The tracker publishes `Order` and consumes `Wallet`. The ledger does the
/// reverse. Each side ignores the kind it does not handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// An order was submitted or settled.
    Order(Order),

    /// The ledger reserved credit for an order, or declined to.
    Wallet(WalletEvent),
}

impl SagaEvent {
    /// Returns the event kind as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::Order(_) => "Order",
            SagaEvent::Wallet(_) => "Wallet",
        }
    }

    /// Creates a successful reservation outcome.
    pub fn reservation_succeeded(order_id: OrderId) -> Self {
        SagaEvent::Wallet(WalletEvent {
            order_id,
            success: true,
        })
    }

    /// Creates a declined reservation outcome.
    pub fn reservation_failed(order_id: OrderId) -> Self {
        SagaEvent::Wallet(WalletEvent {
            order_id,
            success: false,
        })
    }
}

impl From<Order> for SagaEvent {
    fn from(order: Order) -> Self {
        SagaEvent::Order(order)
    }
}

impl From<WalletEvent> for SagaEvent {
    fn from(event: WalletEvent) -> Self {
        SagaEvent::Wallet(event)
    }
}
