//! Order tracker: owns the order log and each order's lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;

use crate::channel::{EventReceiver, EventSender, publish};
use crate::error::{Result, SagaError};
use crate::event_loop::{EventHandler, EventLoop};
use crate::events::{SagaEvent, WalletEvent};
use crate::order::{Order, SubmitOrder};
use crate::state::OrderState;

/// Service that records orders and settles them from reservation outcomes.
///
/// Submitted orders are appended to an in-memory log and published to the
/// ledger. The tracker's event loop consumes the ledger's [`WalletEvent`]s,
/// moves each order to Accepted or Rejected and publishes the settled order
/// back so the ledger can commit or compensate.
///
/// Clones share the same log.
#[derive(Debug, Clone)]
pub struct OrderTracker {
    orders: Arc<RwLock<Vec<Order>>>,
    outbound: EventSender,
    settled: Arc<Notify>,
}

impl OrderTracker {
    /// Creates a tracker publishing to `outbound`. Its event loop is not started.
    pub fn new(outbound: EventSender) -> Self {
        Self {
            orders: Arc::new(RwLock::new(Vec::new())),
            outbound,
            settled: Arc::new(Notify::new()),
        }
    }

    /// Creates a tracker and spawns its event loop on `inbound`.
    pub fn spawn(inbound: EventReceiver, outbound: EventSender) -> (Self, JoinHandle<()>) {
        let tracker = Self::new(outbound);
        let worker = EventLoop::new(tracker.clone()).spawn(inbound);
        (tracker, worker)
    }

    /// Records a new Pending order and publishes it.
    ///
    /// Returns as soon as the order is published; settlement happens
    /// asynchronously.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, cmd: SubmitOrder) -> Result<OrderId> {
        let mut orders = self.orders.write().await;
        let order_id = OrderId::new(orders.len() as u64);
        let order = Order::pending(order_id, cmd.user_id, cmd.price);
        orders.push(order.clone());

        // Publishing under the write lock keeps stream order equal to id order.
        if let Err(e) = publish(&self.outbound, order) {
            orders.pop();
            return Err(e);
        }

        metrics::counter!("saga_orders_submitted_total").increment(1);
        tracing::info!(%order_id, "order submitted");
        Ok(order_id)
    }

    /// Returns the current state of an order.
    pub async fn get_state(&self, order_id: OrderId) -> Result<OrderState> {
        self.get_order(order_id).await.map(|order| order.state)
    }

    /// Returns a copy of an order.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        let orders = self.orders.read().await;
        order_id
            .index()
            .and_then(|i| orders.get(i))
            .cloned()
            .ok_or(SagaError::OrderNotFound(order_id))
    }

    /// Returns the number of orders in the log.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Waits until the order leaves Pending and returns its final state.
    pub async fn await_settled(&self, order_id: OrderId) -> Result<OrderState> {
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let state = self.get_state(order_id).await?;
            if state.is_settled() {
                return Ok(state);
            }
            notified.await;
        }
    }

    async fn settle(&self, event: WalletEvent) -> Result<()> {
        let settled = {
            let mut orders = self.orders.write().await;
            let order = event
                .order_id
                .index()
                .and_then(|i| orders.get_mut(i))
                .ok_or(SagaError::OrderNotFound(event.order_id))?;
            order.settle(event.success)?;
            order.clone()
        };

        metrics::counter!("saga_orders_settled_total", "state" => settled.state.as_str())
            .increment(1);
        tracing::info!(
            order_id = %settled.id,
            user_id = %settled.user_id,
            state = %settled.state,
            "order settled"
        );

        self.settled.notify_waiters();
        publish(&self.outbound, settled)
    }
}

#[async_trait]
impl EventHandler for OrderTracker {
    fn name(&self) -> &'static str {
        "order-tracker"
    }

    async fn handle(&self, event: SagaEvent) -> Result<()> {
        match event {
            SagaEvent::Wallet(outcome) => self.settle(outcome).await,
            SagaEvent::Order(order) => {
                tracing::debug!(order_id = %order.id, "ignoring order event");
                Ok(())
            }
        }
    }
}
