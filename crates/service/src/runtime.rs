//! Producer-side task supervision.
//!
//! [`ServiceRuntime`] wires the sensor source, threshold monitor, event
//! channel and published state together, spawns the periodic loops on a
//! [`TaskTracker`], and joins them on shutdown.

use std::sync::Arc;
use std::time::Duration;

use healthmon_core::published::PublishedState;
use healthmon_core::reading::ServiceIdentity;
use healthmon_core::sensor::SensorSource;
use healthmon_events::EventChannel;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::background::{sensor_loop, ThresholdMonitor};
use crate::config::ServiceConfig;
use crate::state::AppState;

/// Running set of producer loops plus the state they share.
pub struct ServiceRuntime {
    state: AppState,
    tracker: TaskTracker,
}

impl ServiceRuntime {
    /// Spawn the sensor loop and the threshold monitor for `source`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(config: ServiceConfig, source: SensorSource) -> Self {
        let shutdown = CancellationToken::new();
        let channel = Arc::new(EventChannel::default());
        let published = PublishedState::new(source.handle(), ServiceIdentity::default());

        let monitor = ThresholdMonitor::new(source.handle(), Arc::clone(&channel));

        let tracker = TaskTracker::new();
        tracker.spawn(sensor_loop::run(
            source,
            config.sensor_interval,
            shutdown.child_token(),
        ));
        tracker.spawn(monitor.run(config.monitor_interval, shutdown.child_token()));
        tracker.close();

        tracing::info!("Producer loops started (sensor simulation, threshold monitor)");

        Self {
            state: AppState {
                published,
                channel,
                config: Arc::new(config),
                shutdown,
            },
            tracker,
        }
    }

    /// State to hand to the HTTP router.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Token that fires when shutdown begins.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Stop all loops, wait up to `timeout` for them to exit, then detach
    /// every event subscriber.
    ///
    /// Returns `false` if the loops did not stop in time. The published
    /// state keeps its last reading either way.
    pub async fn shutdown(self, timeout: Duration) -> bool {
        self.state.shutdown.cancel();

        let stopped = tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok();
        if stopped {
            tracing::info!("Producer loops stopped");
        } else {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Producer loops did not stop in time"
            );
        }

        self.state.channel.close().await;
        stopped
    }
}
