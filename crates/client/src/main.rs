//! `healthmon-client` -- consumer of the hardware health monitor.
//!
//! Connects to the service, subscribes to the
//! `TemperatureThresholdExceeded` signal (logged as a critical alert), and
//! polls Temperature, Voltage and Version on an interval.
//!
//! See [`ClientConfig::from_env`] for the environment variables.

use healthmon_client::{ClientConfig, MonitorClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "healthmon_client=info".into());
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid client configuration");
        std::process::exit(1);
    });

    tracing::info!(
        service_url = %config.service_url,
        poll_interval_secs = config.poll_interval.as_secs(),
        failure_policy = %config.failure_policy,
        "Starting healthmon-client",
    );

    let mut client = MonitorClient::connect(config).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Could not connect to the health monitor service");
        std::process::exit(1);
    });

    if let Err(e) = client.subscribe().await {
        tracing::error!(error = %e, "Could not subscribe to threshold signals");
        std::process::exit(1);
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received SIGINT (Ctrl-C), stopping client"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C"),
        }
        interrupt.cancel();
    });

    tracing::info!("Monitoring service. Press Ctrl+C to exit.");

    if let Err(e) = client.run(cancel).await {
        tracing::error!(error = %e, "Client stopped");
        std::process::exit(1);
    }

    tracing::info!("Client has been shut down");
}
