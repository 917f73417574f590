//! Periodic property poll.
//!
//! Reads Temperature, Voltage and Version from the service on a fixed
//! interval and logs them. What happens when a read fails is decided by the
//! configured [`PollFailurePolicy`].

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;
use crate::config::PollFailurePolicy;
use crate::error::ClientError;
use crate::proxy::ServiceProxy;

/// One round of property reads.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyStatus {
    pub temperature: f64,
    pub voltage: f64,
    pub version: String,
}

/// Read all three properties, each with its own request.
pub async fn poll_once(proxy: &ServiceProxy) -> Result<PropertyStatus, ClientError> {
    Ok(PropertyStatus {
        temperature: proxy.temperature().await?,
        voltage: proxy.voltage().await?,
        version: proxy.version().await?,
    })
}

/// Run the poll loop until `cancel` is triggered.
///
/// The first poll happens immediately. On a failed read the loop returns
/// the error, except under [`PollFailurePolicy::Reconnect`] where it waits
/// with exponential backoff and tries again.
pub async fn run(
    proxy: ServiceProxy,
    interval: Duration,
    policy: PollFailurePolicy,
    max_delay: Duration,
    cancel: CancellationToken,
) -> Result<(), ClientError> {
    tracing::info!(
        interval_secs = interval.as_secs(),
        %policy,
        "Property poller started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut backoff = Backoff::new(max_delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Property poller stopping");
                return Ok(());
            }
            _ = ticker.tick() => {
                match poll_once(&proxy).await {
                    Ok(status) => {
                        backoff.reset();
                        tracing::info!(
                            temperature = status.temperature,
                            voltage = status.voltage,
                            version = %status.version,
                            "Status"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Lost connection to service while polling");
                        if policy != PollFailurePolicy::Reconnect {
                            return Err(e);
                        }

                        let delay = backoff.next_delay();
                        tracing::info!(delay_ms = delay.as_millis() as u64, "Retrying poll");
                        tokio::select! {
                            _ = cancel.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        ticker.reset_immediately();
                    }
                }
            }
        }
    }
}
