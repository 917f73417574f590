#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use healthmon_core::names::SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED;
use healthmon_core::published::PublishedState;
use healthmon_core::reading::ServiceIdentity;
use healthmon_core::sensor::{ScriptedModel, SensorSource};
use healthmon_events::EventChannel;
use healthmon_service::config::ServiceConfig;
use healthmon_service::router::build_app;
use healthmon_service::state::AppState;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use healthmon_client::{ClientConfig, PollFailurePolicy};

/// A service instance served on an ephemeral loopback port.
///
/// No background loops run; tests drive the sensor and publish events
/// directly.
pub struct TestService {
    pub addr: SocketAddr,
    pub source: SensorSource,
    pub state: AppState,
    server: JoinHandle<()>,
}

impl TestService {
    pub async fn start(temperatures: &[f64]) -> Self {
        Self::start_on("127.0.0.1:0".parse().unwrap(), temperatures).await
    }

    /// Serve on a specific address, e.g. to restart a stopped service.
    pub async fn start_on(addr: SocketAddr, temperatures: &[f64]) -> Self {
        let source = SensorSource::new(ScriptedModel::new(temperatures.iter().copied()));
        let state = AppState {
            published: PublishedState::new(source.handle(), ServiceIdentity::default()),
            channel: Arc::new(EventChannel::default()),
            config: Arc::new(ServiceConfig::default()),
            shutdown: CancellationToken::new(),
        };

        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_app(state.clone());
        let shutdown = state.shutdown.clone();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .unwrap();
        });

        Self {
            addr,
            source,
            state,
            server,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config for this service with a short poll period.
    pub fn client_config(&self, policy: PollFailurePolicy) -> ClientConfig {
        let mut config = ClientConfig::new(&self.url()).unwrap();
        config.poll_interval = Duration::from_millis(200);
        config.failure_policy = policy;
        config.reconnect_max_delay = Duration::from_millis(200);
        config.request_timeout = Duration::from_secs(1);
        config
    }

    pub fn channel(&self) -> &EventChannel {
        &self.state.channel
    }

    /// Wait until the signal has `expected` attached subscribers.
    pub async fn wait_for_subscribers(&self, expected: usize) {
        for _ in 0..200 {
            if self
                .channel()
                .subscriber_count(SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED)
                .await
                == expected
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("subscriber count never reached {expected}");
    }

    /// Close every signal stream and stop serving.
    pub async fn stop(self) {
        self.state.shutdown.cancel();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.server).await;
    }
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// An address that accepts TCP connections but never answers on them.
pub async fn silent_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}
