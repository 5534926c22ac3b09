//! Demo entry point.

use demo::config::Config;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = match metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
    {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to install Prometheus recorder");
            std::process::exit(1);
        }
    };

    // 3. Circuit breaker against a flaky upstream
    match demo::run_breaker_scenario(&config).await {
        Ok(report) => tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            rejected = report.rejected,
            state = %report.final_state,
            "breaker scenario finished"
        ),
        Err(e) => {
            tracing::error!(error = %e, "breaker scenario failed");
            std::process::exit(1);
        }
    }

    // 4. Credit reservation saga
    match demo::run_saga_scenario(&config).await {
        Ok(report) => tracing::info!(
            accepted = report.accepted,
            rejected = report.rejected,
            balance = report.account.balance,
            locked = report.account.locked,
            "saga scenario finished"
        ),
        Err(e) => {
            tracing::error!(error = %e, "saga scenario failed");
            std::process::exit(1);
        }
    }

    // 5. Metrics snapshot
    tracing::info!(metrics = %metrics_handle.render(), "metrics at exit");
}
