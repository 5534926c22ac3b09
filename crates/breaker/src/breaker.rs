//! Circuit breaker wrapping a fallible async operation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::BreakerConfig;
use crate::error::{BreakerError, ConfigError};
use crate::state::BreakerState;

#[derive(Debug, Default)]
struct Inner {
    state: BreakerState,
    closed_failures: u32,
    half_open_successes: u32,
    /// Bumped on every transition. Outcomes and timers carry the epoch they
    /// were started under and are discarded if it has moved on.
    epoch: u64,
    cooldown: Option<JoinHandle<()>>,
}

impl Inner {
    fn transition(&mut self, to: BreakerState) {
        let from = self.state;
        self.state = to;
        self.epoch += 1;
        self.closed_failures = 0;
        self.half_open_successes = 0;

        metrics::counter!("circuit_breaker_transitions_total", "to" => to.as_str()).increment(1);
        if to == BreakerState::Open {
            tracing::warn!(%from, %to, "circuit breaker opened");
        } else {
            tracing::info!(%from, %to, "circuit breaker state changed");
        }
    }
}

/// Guards a fallible operation and stops invoking it once it keeps failing.
///
/// The breaker starts Closed. After `failure_threshold` consecutive failures it
/// opens and rejects every call with [`BreakerError::Open`] until
/// `open_timeout` has elapsed, at which point a timer task moves it to
/// HalfOpen. Trial calls in HalfOpen either close it again after
/// `half_open_success_threshold` successes or reopen it on the first failure.
///
/// Clones share the same state. Opening the breaker spawns the cooldown timer
/// onto the current tokio runtime.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    /// Creates a closed breaker, rejecting zero thresholds or a zero timeout.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(Inner::default())),
        })
    }

    /// Returns the configuration this breaker was built with.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Returns the current state.
    pub async fn state(&self) -> BreakerState {
        self.inner.lock().await.state
    }

    /// Returns the consecutive failures counted while Closed.
    pub async fn consecutive_failures(&self) -> u32 {
        self.inner.lock().await.closed_failures
    }

    /// Runs `operation` unless the breaker is open.
    ///
    /// The lock is not held while the operation runs. If another call changes
    /// the state in the meantime, this call's outcome is returned to the
    /// caller but does not count towards any threshold.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        metrics::counter!("circuit_breaker_calls_total").increment(1);

        let admitted_epoch = {
            let inner = self.inner.lock().await;
            if !inner.state.allows_calls() {
                metrics::counter!("circuit_breaker_rejections_total").increment(1);
                tracing::debug!("circuit breaker open, call rejected");
                return Err(BreakerError::Open);
            }
            inner.epoch
        };

        let outcome = operation().await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != admitted_epoch {
            tracing::debug!(state = %inner.state, "breaker moved on while call was in flight");
            return outcome.map_err(BreakerError::Operation);
        }

        match outcome {
            Ok(value) => {
                self.record_success(&mut inner);
                Ok(value)
            }
            Err(e) => {
                self.record_failure(&mut inner);
                Err(BreakerError::Operation(e))
            }
        }
    }

    fn record_success(&self, inner: &mut Inner) {
        match inner.state {
            BreakerState::Closed => inner.closed_failures = 0,
            BreakerState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_success_threshold {
                    inner.transition(BreakerState::Closed);
                }
            }
            BreakerState::Open => {}
        }
    }

    fn record_failure(&self, inner: &mut Inner) {
        match inner.state {
            BreakerState::Closed => {
                inner.closed_failures += 1;
                tracing::debug!(
                    failures = inner.closed_failures,
                    threshold = self.config.failure_threshold,
                    "call failed while closed"
                );
                if inner.closed_failures >= self.config.failure_threshold {
                    self.trip(inner);
                }
            }
            BreakerState::HalfOpen => self.trip(inner),
            BreakerState::Open => {}
        }
    }

    /// Opens the breaker and arms the cooldown timer.
    ///
    /// A trip only happens from Closed or HalfOpen, so any earlier timer has
    /// normally fired already. Aborting it and checking the epoch keep a timer
    /// from an earlier Open period from ever moving the breaker.
    fn trip(&self, inner: &mut Inner) {
        inner.transition(BreakerState::Open);
        if let Some(previous) = inner.cooldown.take() {
            previous.abort();
        }

        let armed_epoch = inner.epoch;
        let shared = Arc::clone(&self.inner);
        let open_timeout = self.config.open_timeout;
        inner.cooldown = Some(tokio::spawn(async move {
            tokio::time::sleep(open_timeout).await;
            let mut inner = shared.lock().await;
            if inner.state == BreakerState::Open && inner.epoch == armed_epoch {
                inner.cooldown = None;
                inner.transition(BreakerState::HalfOpen);
            }
        }));
    }
}
