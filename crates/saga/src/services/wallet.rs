//! Credit ledger: owns user balances and the credit locked against orders.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Amount, OrderId, UserId};
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;

use crate::channel::{EventReceiver, EventSender, publish};
use crate::error::{Result, SagaError};
use crate::event_loop::{EventHandler, EventLoop};
use crate::events::SagaEvent;
use crate::order::Order;
use crate::state::OrderState;

/// A user's spendable and reserved credit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: Amount,
    pub locked: Amount,
}

impl Account {
    /// Credit owned by the user, reserved or not.
    pub fn total(&self) -> Amount {
        self.balance.saturating_add(self.locked)
    }
}

/// Credit held for one order between reservation and commit or compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reservation {
    user_id: UserId,
    amount: Amount,
}

#[derive(Debug, Default)]
struct Ledger {
    accounts: HashMap<UserId, Account>,
    reservations: HashMap<OrderId, Reservation>,
}

impl Ledger {
    fn account(&self, user_id: UserId) -> Account {
        self.accounts.get(&user_id).copied().unwrap_or_default()
    }

    /// Credits `amount` to the balance.
    ///
    /// Fails if `balance + locked` would no longer fit in an [`Amount`].
    /// Reservations and compensations only move credit between the two.
    fn deposit(&mut self, user_id: UserId, amount: Amount) -> Result<Amount> {
        let account = self.accounts.entry(user_id).or_default();
        account
            .balance
            .checked_add(account.locked)
            .and_then(|total| total.checked_add(amount))
            .ok_or(SagaError::BalanceOverflow(user_id))?;
        account.balance += amount;
        Ok(account.balance)
    }

    /// Moves `order.price` from balance to locked if the user can afford it.
    fn reserve(&mut self, order: &Order) -> Result<bool> {
        if self.reservations.contains_key(&order.id) {
            return Err(SagaError::AlreadyReserved(order.id));
        }

        let account = self.accounts.entry(order.user_id).or_default();
        if account.balance < order.price {
            return Ok(false);
        }
        account.locked = account
            .locked
            .checked_add(order.price)
            .ok_or(SagaError::BalanceOverflow(order.user_id))?;
        account.balance -= order.price;
        self.reservations.insert(
            order.id,
            Reservation {
                user_id: order.user_id,
                amount: order.price,
            },
        );
        Ok(true)
    }

    /// Realizes a reservation: the locked credit is spent.
    fn commit(&mut self, order_id: OrderId) -> Option<Reservation> {
        let reservation = self.reservations.remove(&order_id)?;
        let account = self.accounts.entry(reservation.user_id).or_default();
        account.locked -= reservation.amount;
        Some(reservation)
    }

    /// Reverses a reservation: the locked credit goes back to the balance.
    fn compensate(&mut self, order_id: OrderId) -> Option<Reservation> {
        let reservation = self.reservations.remove(&order_id)?;
        let account = self.accounts.entry(reservation.user_id).or_default();
        account.locked -= reservation.amount;
        account.balance = account.balance.saturating_add(reservation.amount);
        Some(reservation)
    }
}

/// Service that reserves credit for pending orders and finalizes it once the
/// order is settled.
///
/// Clones share the same ledger.
#[derive(Debug, Clone)]
pub struct CreditLedger {
    ledger: Arc<RwLock<Ledger>>,
    outbound: EventSender,
    released: Arc<Notify>,
}

impl CreditLedger {
    /// Creates a ledger publishing to `outbound`. Its event loop is not started.
    pub fn new(outbound: EventSender) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(Ledger::default())),
            outbound,
            released: Arc::new(Notify::new()),
        }
    }

    /// Creates a ledger and spawns its event loop on `inbound`.
    pub fn spawn(inbound: EventReceiver, outbound: EventSender) -> (Self, JoinHandle<()>) {
        let ledger = Self::new(outbound);
        let worker = EventLoop::new(ledger.clone()).spawn(inbound);
        (ledger, worker)
    }

    /// Returns the user's spendable credit, zero for unknown users.
    pub async fn get_balance(&self, user_id: impl Into<UserId>) -> Amount {
        self.account(user_id).await.balance
    }

    /// Returns the user's reserved credit, zero for unknown users.
    pub async fn get_locked(&self, user_id: impl Into<UserId>) -> Amount {
        self.account(user_id).await.locked
    }

    /// Returns both balances of a user in one read.
    pub async fn account(&self, user_id: impl Into<UserId>) -> Account {
        self.ledger.read().await.account(user_id.into())
    }

    /// Credits a user's balance and returns the new balance.
    pub async fn deposit(&self, user_id: impl Into<UserId>, amount: Amount) -> Result<Amount> {
        let user_id = user_id.into();
        let balance = self.ledger.write().await.deposit(user_id, amount)?;
        tracing::debug!(%user_id, amount, balance, "credit deposited");
        Ok(balance)
    }

    /// Returns the credit currently locked for an order, if any.
    pub async fn reservation(&self, order_id: OrderId) -> Option<Amount> {
        self.ledger
            .read()
            .await
            .reservations
            .get(&order_id)
            .map(|r| r.amount)
    }

    /// Returns the number of reservations not yet committed or compensated.
    pub async fn open_reservations(&self) -> usize {
        self.ledger.read().await.reservations.len()
    }

    /// Waits until the ledger holds no reservation for the order.
    pub async fn await_released(&self, order_id: OrderId) {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.reservation(order_id).await.is_none() {
                return;
            }
            notified.await;
        }
    }

    async fn on_pending(&self, order: Order) -> Result<()> {
        // Check and debit under one write lock so concurrent orders for the
        // same user cannot both spend the same credit.
        let reserved = self.ledger.write().await.reserve(&order)?;

        let outcome = if reserved { "reserved" } else { "declined" };
        metrics::counter!("ledger_reservations_total", "outcome" => outcome).increment(1);
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            price = order.price,
            outcome,
            "reservation attempted"
        );

        let event = if reserved {
            SagaEvent::reservation_succeeded(order.id)
        } else {
            SagaEvent::reservation_failed(order.id)
        };
        publish(&self.outbound, event)
    }

    async fn on_accepted(&self, order: Order) {
        let committed = self.ledger.write().await.commit(order.id);
        match committed {
            Some(reservation) => {
                tracing::info!(
                    order_id = %order.id,
                    user_id = %reservation.user_id,
                    amount = reservation.amount,
                    "reservation committed"
                );
                self.released.notify_waiters();
            }
            None => {
                tracing::warn!(order_id = %order.id, "accepted order has no reservation");
            }
        }
    }

    async fn on_rejected(&self, order: Order) {
        let compensated = self.ledger.write().await.compensate(order.id);
        match compensated {
            Some(reservation) => {
                metrics::counter!("ledger_compensations_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    user_id = %reservation.user_id,
                    amount = reservation.amount,
                    "reservation compensated"
                );
                self.released.notify_waiters();
            }
            None => {
                tracing::debug!(order_id = %order.id, "rejected order held no credit");
            }
        }
    }
}

#[async_trait]
impl EventHandler for CreditLedger {
    fn name(&self) -> &'static str {
        "credit-ledger"
    }

    async fn handle(&self, event: SagaEvent) -> Result<()> {
        let order = match event {
            SagaEvent::Order(order) => order,
            SagaEvent::Wallet(outcome) => {
                tracing::debug!(order_id = %outcome.order_id, "ignoring wallet event");
                return Ok(());
            }
        };

        match order.state {
            OrderState::Pending => self.on_pending(order).await?,
            OrderState::Accepted => self.on_accepted(order).await,
            OrderState::Rejected => self.on_rejected(order).await,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::event_channel;

    fn order(id: u64, user: u64, price: Amount, state: OrderState) -> Order {
        Order {
            id: OrderId::new(id),
            user_id: UserId::new(user),
            price,
            state,
        }
    }

    async fn funded_ledger(balance: Amount) -> (CreditLedger, EventReceiver) {
        let (tx, rx) = event_channel();
        let ledger = CreditLedger::new(tx);
        ledger.deposit(1u64, balance).await.unwrap();
        (ledger, rx)
    }

    #[tokio::test]
    async fn test_unknown_user_reads_zero() {
        let (ledger, _rx) = funded_ledger(0).await;
        assert_eq!(ledger.get_balance(42u64).await, 0);
        assert_eq!(ledger.get_locked(42u64).await, 0);
    }

    #[tokio::test]
    async fn test_pending_reserves_when_affordable() {
        let (ledger, mut rx) = funded_ledger(100).await;

        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Pending)))
            .await
            .unwrap();

        assert_eq!(
            ledger.account(1u64).await,
            Account {
                balance: 50,
                locked: 50
            }
        );
        assert_eq!(ledger.reservation(OrderId::new(0)).await, Some(50));
        assert_eq!(
            rx.recv().await,
            Some(SagaEvent::reservation_succeeded(OrderId::new(0)))
        );
    }

    #[tokio::test]
    async fn test_pending_declines_without_touching_ledger() {
        let (ledger, mut rx) = funded_ledger(30).await;

        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Pending)))
            .await
            .unwrap();

        assert_eq!(
            ledger.account(1u64).await,
            Account {
                balance: 30,
                locked: 0
            }
        );
        assert_eq!(ledger.reservation(OrderId::new(0)).await, None);
        assert_eq!(
            rx.recv().await,
            Some(SagaEvent::reservation_failed(OrderId::new(0)))
        );
    }

    #[tokio::test]
    async fn test_exact_balance_is_affordable() {
        let (ledger, _rx) = funded_ledger(50).await;

        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Pending)))
            .await
            .unwrap();

        assert_eq!(ledger.get_balance(1u64).await, 0);
        assert_eq!(ledger.get_locked(1u64).await, 50);
    }

    #[tokio::test]
    async fn test_accepted_commits_reservation() {
        let (ledger, _rx) = funded_ledger(100).await;
        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Pending)))
            .await
            .unwrap();

        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Accepted)))
            .await
            .unwrap();

        assert_eq!(ledger.get_balance(1u64).await, 50);
        assert_eq!(ledger.get_locked(1u64).await, 0);
        assert_eq!(ledger.open_reservations().await, 0);
    }

    #[tokio::test]
    async fn test_rejected_compensates_reservation() {
        let (ledger, _rx) = funded_ledger(100).await;
        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Pending)))
            .await
            .unwrap();

        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Rejected)))
            .await
            .unwrap();

        assert_eq!(ledger.get_balance(1u64).await, 100);
        assert_eq!(ledger.get_locked(1u64).await, 0);
    }

    #[tokio::test]
    async fn test_rejected_without_reservation_is_noop() {
        let (ledger, _rx) = funded_ledger(30).await;
        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Pending)))
            .await
            .unwrap();

        ledger
            .handle(SagaEvent::Order(order(0, 1, 50, OrderState::Rejected)))
            .await
            .unwrap();

        assert_eq!(ledger.get_balance(1u64).await, 30);
        assert_eq!(ledger.get_locked(1u64).await, 0);
    }

    #[tokio::test]
    async fn test_locked_accumulates_across_in_flight_orders() {
        let (ledger, _rx) = funded_ledger(100).await;
        for id in 0..2 {
            ledger
                .handle(SagaEvent::Order(order(id, 1, 40, OrderState::Pending)))
                .await
                .unwrap();
        }

        assert_eq!(
            ledger.account(1u64).await,
            Account {
                balance: 20,
                locked: 80
            }
        );

        ledger
            .handle(SagaEvent::Order(order(0, 1, 40, OrderState::Accepted)))
            .await
            .unwrap();
        assert_eq!(ledger.get_locked(1u64).await, 40);
    }

    #[tokio::test]
    async fn test_duplicate_pending_is_rejected() {
        let (ledger, _rx) = funded_ledger(100).await;
        let pending = SagaEvent::Order(order(0, 1, 10, OrderState::Pending));

        ledger.handle(pending.clone()).await.unwrap();
        let result = ledger.handle(pending).await;

        assert_eq!(result, Err(SagaError::AlreadyReserved(OrderId::new(0))));
        assert_eq!(ledger.get_locked(1u64).await, 10);
    }

    #[tokio::test]
    async fn test_wallet_events_are_ignored() {
        let (ledger, mut rx) = funded_ledger(100).await;

        ledger
            .handle(SagaEvent::reservation_succeeded(OrderId::new(0)))
            .await
            .unwrap();

        assert_eq!(ledger.get_balance(1u64).await, 100);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_deposit_overflow() {
        let (ledger, _rx) = funded_ledger(Amount::MAX).await;
        let result = ledger.deposit(1u64, 1).await;
        assert_eq!(result, Err(SagaError::BalanceOverflow(UserId::new(1))));
        assert_eq!(ledger.get_balance(1u64).await, Amount::MAX);
    }

    #[tokio::test]
    async fn test_deposit_bounded_by_locked_credit() {
        let (ledger, mut rx) = funded_ledger(Amount::MAX).await;
        ledger
            .handle(SagaEvent::Order(order(0, 1, Amount::MAX, OrderState::Pending)))
            .await
            .unwrap();
        rx.recv().await.unwrap();

        let result = ledger.deposit(1u64, Amount::MAX).await;
        assert_eq!(result, Err(SagaError::BalanceOverflow(UserId::new(1))));
        assert_eq!(
            ledger.account(1u64).await,
            Account {
                balance: 0,
                locked: Amount::MAX
            }
        );

        // The ledger keeps serving orders for the same user.
        ledger
            .handle(SagaEvent::Order(order(1, 1, 1, OrderState::Pending)))
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(SagaEvent::reservation_failed(OrderId::new(1)))
        );

        ledger
            .handle(SagaEvent::Order(order(0, 1, Amount::MAX, OrderState::Rejected)))
            .await
            .unwrap();
        assert_eq!(ledger.get_balance(1u64).await, Amount::MAX);
        assert_eq!(ledger.get_locked(1u64).await, 0);
    }

    #[tokio::test]
    async fn test_total_stays_representable_with_locked_credit() {
        let (ledger, _rx) = funded_ledger(10).await;
        ledger
            .handle(SagaEvent::Order(order(0, 1, 10, OrderState::Pending)))
            .await
            .unwrap();

        let result = ledger.deposit(1u64, Amount::MAX).await;
        assert_eq!(result, Err(SagaError::BalanceOverflow(UserId::new(1))));
        assert_eq!(ledger.account(1u64).await.total(), 10);

        ledger.deposit(1u64, Amount::MAX - 10).await.unwrap();
        assert_eq!(ledger.account(1u64).await.total(), Amount::MAX);
    }

    #[test]
    fn test_account_total_saturates() {
        let account = Account {
            balance: Amount::MAX,
            locked: 1,
        };
        assert_eq!(account.total(), Amount::MAX);
    }
}
