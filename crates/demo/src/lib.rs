//! Demo scenarios for the circuit breaker and the credit reservation saga.
//!
//! Both scenarios are driven by [`Config`](config::Config) and return a report
//! that the binary logs.

pub mod config;
pub mod error;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use breaker::{BreakerError, BreakerState, CircuitBreaker};
use common::UserId;
use saga::{Account, OrderState, Saga, SubmitOrder};

use config::Config;
use error::DemoError;

const MAX_BREAKER_ATTEMPTS: u32 = 20;
const COOLDOWN_MARGIN: Duration = Duration::from_millis(10);

/// Outcome counts of the breaker scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerReport {
    pub succeeded: u32,
    pub failed: u32,
    pub rejected: u32,
    pub final_state: BreakerState,
}

/// Outcome of the saga scenario for the demo user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaReport {
    pub accepted: usize,
    pub rejected: usize,
    pub account: Account,
}

/// Upstream that fails a fixed number of calls and then recovers.
#[derive(Debug)]
struct FlakyUpstream {
    remaining_failures: AtomicU32,
}

impl FlakyUpstream {
    fn new(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
        }
    }

    async fn fetch_quote(&self) -> Result<u32, &'static str> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err("upstream unavailable")
        } else {
            Ok(42)
        }
    }
}

/// Calls a flaky upstream through a breaker until it has recovered, waiting
/// out the cooldown whenever the breaker is open.
#[tracing::instrument(skip(config))]
pub async fn run_breaker_scenario(config: &Config) -> Result<BreakerReport, DemoError> {
    let cb = CircuitBreaker::new(config.breaker)?;
    let upstream = Arc::new(FlakyUpstream::new(config.upstream_failures));
    let mut report = BreakerReport {
        succeeded: 0,
        failed: 0,
        rejected: 0,
        final_state: BreakerState::Closed,
    };

    for attempt in 1..=MAX_BREAKER_ATTEMPTS {
        let upstream = Arc::clone(&upstream);
        match cb.call(move || async move { upstream.fetch_quote().await }).await {
            Ok(quote) => {
                report.succeeded += 1;
                tracing::info!(attempt, quote, "upstream call succeeded");
            }
            Err(BreakerError::Open) => {
                report.rejected += 1;
                tracing::info!(attempt, "breaker open, waiting for cooldown");
                tokio::time::sleep(config.breaker.open_timeout + COOLDOWN_MARGIN).await;
            }
            Err(BreakerError::Operation(e)) => {
                report.failed += 1;
                tracing::warn!(attempt, error = e, "upstream call failed");
            }
        }

        if report.succeeded > 0 && cb.state().await == BreakerState::Closed {
            break;
        }
    }

    report.final_state = cb.state().await;
    Ok(report)
}

/// Submits the configured orders for one user through a breaker and waits
/// for every order to settle.
#[tracing::instrument(skip(config))]
pub async fn run_saga_scenario(config: &Config) -> Result<SagaReport, DemoError> {
    let saga = Saga::spawn();
    let cb = CircuitBreaker::new(config.breaker)?;
    let user_id = UserId::new(1);
    saga.ledger().deposit(user_id, config.initial_balance).await?;

    let mut order_ids = Vec::with_capacity(config.order_prices.len());
    for &price in &config.order_prices {
        let orders = saga.orders().clone();
        let order_id = cb
            .call(move || async move { orders.submit(SubmitOrder::new(user_id, price)).await })
            .await?;
        order_ids.push(order_id);
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for order_id in order_ids {
        match saga.await_settled(order_id).await? {
            OrderState::Accepted => accepted += 1,
            OrderState::Rejected => rejected += 1,
            OrderState::Pending => {}
        }
    }

    let account = saga.ledger().account(user_id).await;
    saga.shutdown().await;

    Ok(SagaReport {
        accepted,
        rejected,
        account,
    })
}
