//! Threshold signal subscription.
//!
//! Connects to the service's WebSocket signal stream and turns every
//! `TemperatureThresholdExceeded` frame into a critical alert log entry.
//! Malformed frames are logged at warning level and dropped.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use healthmon_core::names::SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED;
use healthmon_core::threshold::ThresholdEvent;
use healthmon_core::wire::SignalMessage;
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::backoff::Backoff;
use crate::config::PollFailurePolicy;
use crate::error::ClientError;

/// An open signal stream.
pub type SignalStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Extra callback invoked for every threshold event after it is logged.
pub type AlertHook = Arc<dyn Fn(&ThresholdEvent) + Send + Sync>;

/// Open the signal stream at `url`, giving up after `timeout`.
pub async fn connect(url: &Url, timeout: Duration) -> Result<SignalStream, ClientError> {
    let (stream, _response) = tokio::time::timeout(timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| {
            ClientError::Connection(format!(
                "signal stream handshake timed out after {}s",
                timeout.as_secs_f64()
            ))
        })??;
    tracing::info!(url = %url, "Subscribed to threshold signals");
    Ok(stream)
}

/// Decode one text frame.
///
/// Returns `Ok(None)` for well-formed signals this client does not handle.
pub fn parse_frame(text: &str) -> Result<Option<ThresholdEvent>, ClientError> {
    let message: SignalMessage = serde_json::from_str(text)
        .map_err(|e| ClientError::MalformedEvent(format!("invalid signal frame: {e}")))?;
    if message.member != SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED {
        return Ok(None);
    }
    Ok(Some(ThresholdEvent::from_payload(&message.payload)?))
}

/// How a single stream session ended.
enum SessionEnd {
    Cancelled,
    Lost(ClientError),
}

/// Receives threshold signals and raises alerts for them.
#[derive(Clone)]
pub struct AlertListener {
    url: Url,
    connect_timeout: Duration,
    hooks: Vec<AlertHook>,
}

impl AlertListener {
    pub fn new(url: Url, connect_timeout: Duration) -> Self {
        Self {
            url,
            connect_timeout,
            hooks: Vec::new(),
        }
    }

    /// Register an additional callback for received events.
    pub fn with_hook(mut self, hook: AlertHook) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Open a stream to this listener's URL.
    pub async fn connect(&self) -> Result<SignalStream, ClientError> {
        connect(&self.url, self.connect_timeout).await
    }

    /// Handle one text frame. Returns the event if it was an alert.
    pub fn dispatch(&self, text: &str) -> Option<ThresholdEvent> {
        match parse_frame(text) {
            Ok(Some(event)) => {
                tracing::error!(
                    severity = "critical",
                    current_temp = event.current_temp,
                    "ALERT! Temperature threshold exceeded"
                );
                for hook in &self.hooks {
                    hook(&event);
                }
                Some(event)
            }
            Ok(None) => {
                tracing::debug!("Ignoring unrelated signal");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, raw = %text, "Dropping malformed threshold event");
                None
            }
        }
    }

    /// Listen until `cancel` fires or the stream is lost.
    ///
    /// `initial` is an already-open stream (from `subscribe`); without one
    /// the listener connects first. Under [`PollFailurePolicy::Reconnect`]
    /// a lost stream is re-opened with exponential backoff and this only
    /// returns on cancellation; otherwise the loss is returned as
    /// [`ClientError::Connection`].
    pub async fn run(
        self,
        initial: Option<SignalStream>,
        policy: PollFailurePolicy,
        max_delay: Duration,
        cancel: CancellationToken,
    ) -> Result<(), ClientError> {
        let mut backoff = Backoff::new(max_delay);
        let mut pending = initial;

        loop {
            let opened = match pending.take() {
                Some(stream) => Ok(stream),
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        result = self.connect() => result,
                    }
                }
            };

            let error = match opened {
                Ok(stream) => {
                    backoff.reset();
                    match self.run_session(stream, &cancel).await {
                        SessionEnd::Cancelled => {
                            tracing::info!("Alert listener stopping");
                            return Ok(());
                        }
                        SessionEnd::Lost(e) => e,
                    }
                }
                Err(e) => e,
            };

            tracing::error!(error = %error, "Signal subscription lost");
            if policy != PollFailurePolicy::Reconnect {
                return Err(error);
            }

            let delay = backoff.next_delay();
            tracing::info!(
                delay_ms = delay.as_millis() as u64,
                "Reconnecting signal subscription"
            );
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn run_session(&self, ws: SignalStream, cancel: &CancellationToken) -> SessionEnd {
        let (mut sink, mut stream) = ws.split();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Cancelled;
                }
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.dispatch(&text);
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                            // Handled automatically by tungstenite.
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Service closed the signal stream");
                            return SessionEnd::Lost(ClientError::Connection(
                                "service closed the signal stream".into(),
                            ));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return SessionEnd::Lost(e.into()),
                        None => {
                            return SessionEnd::Lost(ClientError::Connection(
                                "signal stream ended".into(),
                            ));
                        }
                    }
                }
            }
        }
    }
}
