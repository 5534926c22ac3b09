//! Wires the order tracker and credit ledger into a running saga.

use common::OrderId;
use tokio::task::JoinHandle;

use crate::channel::event_channel;
use crate::error::Result;
use crate::services::{CreditLedger, OrderTracker};
use crate::state::OrderState;

/// A running saga: both services plus their event-loop workers.
///
/// ```text
/// OrderTracker ──(Order events)──► CreditLedger
///      ▲                                │
///      └──────(Wallet events)───────────┘
/// ```
///
/// Dropping the saga aborts both workers.
pub struct Saga {
    orders: OrderTracker,
    ledger: CreditLedger,
    workers: Vec<JoinHandle<()>>,
}

impl Saga {
    /// Creates both event streams and services and spawns their event loops.
    pub fn spawn() -> Self {
        let (order_tx, order_rx) = event_channel();
        let (wallet_tx, wallet_rx) = event_channel();

        let (ledger, ledger_worker) = CreditLedger::spawn(order_rx, wallet_tx);
        let (orders, orders_worker) = OrderTracker::spawn(wallet_rx, order_tx);

        tracing::info!("saga started");
        Self {
            orders,
            ledger,
            workers: vec![ledger_worker, orders_worker],
        }
    }

    pub fn orders(&self) -> &OrderTracker {
        &self.orders
    }

    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Waits for the full round trip of an order: settlement by the tracker,
    /// then commit or compensation by the ledger.
    pub async fn await_settled(&self, order_id: OrderId) -> Result<OrderState> {
        let state = self.orders.await_settled(order_id).await?;
        self.ledger.await_released(order_id).await;
        Ok(state)
    }

    /// Stops both event loops and waits for them to finish.
    pub async fn shutdown(mut self) {
        for worker in self.workers.drain(..) {
            worker.abort();
            let _ = worker.await;
        }
    }
}

impl Drop for Saga {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
        tracing::info!("saga stopped");
    }
}
