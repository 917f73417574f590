//! `healthmon-service` -- simulated hardware health monitor.
//!
//! Simulates a temperature/voltage sensor, publishes the readings as
//! read-only properties over HTTP, and pushes a
//! `TemperatureThresholdExceeded` signal to WebSocket subscribers whenever
//! the temperature rises above 85.0 C.
//!
//! See [`ServiceConfig::from_env`] for the environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use healthmon_core::names::{BUS_NAME, OBJECT_PATH};
use healthmon_core::sensor::{DriftModel, SensorSource};
use healthmon_service::config::ServiceConfig;
use healthmon_service::router::build_app;
use healthmon_service::runtime::ServiceRuntime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "healthmon_service=info,tower_http=info".into());
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

    // --- Configuration ---
    let config = ServiceConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid service configuration");
        std::process::exit(1);
    });
    tracing::info!(
        host = %config.host,
        port = config.port,
        sensor_interval_ms = config.sensor_interval.as_millis() as u64,
        monitor_interval_ms = config.monitor_interval.as_millis() as u64,
        spike_probability = config.spike.probability(),
        "Loaded service configuration"
    );

    let addr = config
        .host
        .parse()
        .map(|ip| SocketAddr::new(ip, config.port))
        .unwrap_or_else(|e: std::net::AddrParseError| {
            tracing::error!(
                host = %config.host,
                port = config.port,
                error = %e,
                "Invalid bind address"
            );
            std::process::exit(1);
        });

    // --- Published endpoint ---
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(%addr, error = %e, "Failed to publish service endpoint");
            std::process::exit(1);
        });

    // --- Producer loops ---
    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let source = SensorSource::new(DriftModel::new(config.spike));
    let runtime = ServiceRuntime::start(config, source);
    let app = build_app(runtime.state());

    tracing::info!(
        %addr,
        bus_name = BUS_NAME,
        object_path = OBJECT_PATH,
        "Service running. Press Ctrl+C to stop."
    );

    let shutdown = runtime.shutdown_token();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    let serve_result = server.await;

    // --- Post-shutdown cleanup ---
    tracing::info!("Stopped accepting connections, stopping producer loops");
    runtime.shutdown(shutdown_timeout).await;

    if let Err(e) = serve_result {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Service has been shut down");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
