//! Client orchestration.
//!
//! [`MonitorClient`] connects to the service, optionally subscribes to the
//! threshold signal, then supervises the alert listener and the property
//! poller until cancelled. How a failing task affects the other one is
//! governed by [`PollFailurePolicy`].

use std::sync::Arc;

use healthmon_core::threshold::ThresholdEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::alerts::{AlertHook, AlertListener, SignalStream};
use crate::config::{ClientConfig, PollFailurePolicy};
use crate::error::ClientError;
use crate::poller;
use crate::proxy::ServiceProxy;

const POLLER_TASK: &str = "poller";
const ALERTS_TASK: &str = "alerts";

/// A connected health monitor client.
pub struct MonitorClient {
    config: ClientConfig,
    proxy: ServiceProxy,
    listener: AlertListener,
    signals: Option<SignalStream>,
    subscribed: bool,
}

impl std::fmt::Debug for MonitorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorClient")
            .field("config", &self.config)
            .field("proxy", &self.proxy)
            .field("subscribed", &self.subscribed)
            .finish_non_exhaustive()
    }
}

impl MonitorClient {
    /// Establish reachability to the service.
    ///
    /// Fails with [`ClientError::Connection`] if the service is not there.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let proxy =
            ServiceProxy::connect(config.service_url.as_str(), config.request_timeout).await?;
        let listener = AlertListener::new(config.signals_url(), config.request_timeout);
        Ok(Self {
            config,
            proxy,
            listener,
            signals: None,
            subscribed: false,
        })
    }

    pub fn proxy(&self) -> &ServiceProxy {
        &self.proxy
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call `hook` for every threshold event, after it has been logged.
    pub fn on_alert<F>(&mut self, hook: F)
    where
        F: Fn(&ThresholdEvent) + Send + Sync + 'static,
    {
        let hook: AlertHook = Arc::new(hook);
        self.listener = self.listener.clone().with_hook(hook);
    }

    /// Attach to the threshold signal.
    ///
    /// Events published before this call are never delivered.
    pub async fn subscribe(&mut self) -> Result<(), ClientError> {
        let stream = self.listener.connect().await?;
        self.signals = Some(stream);
        self.subscribed = true;
        Ok(())
    }

    /// Run the alert listener (if subscribed) and the poller until `cancel`
    /// fires.
    ///
    /// * `Shutdown`: the first task failure stops the other task and is
    ///   returned.
    /// * `Stop`: a failed task ends on its own; the client stays up until
    ///   cancelled.
    /// * `Reconnect`: tasks retry internally and only end on cancellation.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ClientError> {
        let policy = self.config.failure_policy;
        let max_delay = self.config.reconnect_max_delay;
        let tasks_cancel = cancel.child_token();

        let mut tasks = JoinSet::new();
        tasks.spawn({
            let token = tasks_cancel.clone();
            let run = poller::run(
                self.proxy,
                self.config.poll_interval,
                policy,
                max_delay,
                token,
            );
            async move { (POLLER_TASK, run.await) }
        });
        if self.subscribed {
            let run = self
                .listener
                .run(self.signals, policy, max_delay, tasks_cancel.clone());
            tasks.spawn(async move { (ALERTS_TASK, run.await) });
        }

        tracing::info!(%policy, subscribed = self.subscribed, "Monitor client running");

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let (task, result) = match joined {
                Ok(finished) => finished,
                Err(e) => ("unknown", Err(ClientError::Task(e.to_string()))),
            };

            let Err(e) = result else {
                tracing::debug!(task, "Client task finished");
                continue;
            };

            match policy {
                PollFailurePolicy::Shutdown => {
                    if first_error.is_none() {
                        tracing::error!(task, error = %e, "Client task failed, shutting down");
                        tasks_cancel.cancel();
                        first_error = Some(e);
                    }
                }
                PollFailurePolicy::Stop | PollFailurePolicy::Reconnect => {
                    tracing::warn!(task, error = %e, "Client task stopped");
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        if !cancel.is_cancelled() {
            tracing::warn!("All client tasks stopped, waiting for shutdown");
            cancel.cancelled().await;
        }
        Ok(())
    }
}
