//! Demo configuration loaded from environment variables.

use std::time::Duration;

use breaker::BreakerConfig;
use common::Amount;

/// Demo configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DEMO_INITIAL_BALANCE`: credit deposited for the demo user (default: `100`)
/// - `DEMO_ORDER_PRICES`: comma separated order prices (default: `"50,30,40"`)
/// - `DEMO_UPSTREAM_FAILURES`: calls the fake upstream fails before recovering (default: `3`)
/// - `BREAKER_*`: see [`BreakerConfig`]; the demo defaults to a 2 failure
///   threshold and a 250ms cooldown so it finishes quickly
#[derive(Debug, Clone)]
pub struct Config {
    pub initial_balance: Amount,
    pub order_prices: Vec<Amount>,
    pub upstream_failures: u32,
    pub breaker: BreakerConfig,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            initial_balance: lookup("DEMO_INITIAL_BALANCE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.initial_balance),
            order_prices: lookup("DEMO_ORDER_PRICES")
                .and_then(|v| parse_prices(&v))
                .unwrap_or(defaults.order_prices),
            upstream_failures: lookup("DEMO_UPSTREAM_FAILURES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_failures),
            breaker: BreakerConfig::from_lookup(|key| {
                lookup(key).or_else(|| demo_breaker_default(key))
            }),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_balance: 100,
            order_prices: vec![50, 30, 40],
            upstream_failures: 3,
            breaker: BreakerConfig::new(2, 1, Duration::from_millis(250)),
        }
    }
}

fn demo_breaker_default(key: &str) -> Option<String> {
    match key {
        "BREAKER_FAILURE_THRESHOLD" => Some("2".to_string()),
        "BREAKER_OPEN_TIMEOUT_MS" => Some("250".to_string()),
        _ => None,
    }
}

/// Parses `"50, 30,40"` into prices. Any bad entry rejects the whole list.
fn parse_prices(raw: &str) -> Option<Vec<Amount>> {
    raw.split(',')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<Vec<_>>>()
        .filter(|prices| !prices.is_empty())
}
