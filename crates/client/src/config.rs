use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

/// Default property poll period.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default per-request timeout, kept below the poll period.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Default ceiling for the reconnect backoff.
const DEFAULT_RECONNECT_MAX_DELAY_SECS: u64 = 30;

/// Path of the service's signal stream, relative to its base URL.
const SIGNALS_PATH: &str = "/api/v1/signals";

/// What the client does when the service stops answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFailurePolicy {
    /// The failing loop stops; the other path keeps running.
    Stop,
    /// The first connection loss stops the whole client.
    Shutdown,
    /// Both paths retry with exponential backoff until cancelled.
    Reconnect,
}

impl FromStr for PollFailurePolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(Self::Stop),
            "shutdown" => Ok(Self::Shutdown),
            "reconnect" => Ok(Self::Reconnect),
            other => Err(ClientError::Config(format!(
                "POLL_FAILURE_POLICY must be stop, shutdown or reconnect, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PollFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stop => "stop",
            Self::Shutdown => "shutdown",
            Self::Reconnect => "reconnect",
        };
        f.write_str(name)
    }
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base HTTP URL of the service.
    pub service_url: Url,
    /// Period between property polls.
    pub poll_interval: Duration,
    /// Reaction to losing the service.
    pub failure_policy: PollFailurePolicy,
    /// Upper bound on the reconnect delay.
    pub reconnect_max_delay: Duration,
    /// Limit on each HTTP request and on opening the signal stream.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build a config for `service_url` with default timings.
    pub fn new(service_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            service_url: parse_service_url(service_url)?,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            failure_policy: PollFailurePolicy::Shutdown,
            reconnect_max_delay: Duration::from_secs(DEFAULT_RECONNECT_MAX_DELAY_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Variable                   | Default                 |
    /// |----------------------------|-------------------------|
    /// | `SERVICE_URL`              | `http://127.0.0.1:3000` |
    /// | `POLL_INTERVAL_SECS`       | `5`                     |
    /// | `POLL_FAILURE_POLICY`      | `shutdown`              |
    /// | `RECONNECT_MAX_DELAY_SECS` | `30`                    |
    /// | `REQUEST_TIMEOUT_SECS`     | `3`                     |
    pub fn from_env() -> Result<Self, ClientError> {
        let url =
            std::env::var("SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
        let mut config = Self::new(&url)?;

        if let Ok(raw) = std::env::var("POLL_INTERVAL_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("POLL_INTERVAL_SECS={raw:?}")))?;
            if secs == 0 {
                return Err(ClientError::Config("POLL_INTERVAL_SECS must be > 0".into()));
            }
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("POLL_FAILURE_POLICY") {
            config.failure_policy = raw.parse()?;
        }

        if let Ok(raw) = std::env::var("RECONNECT_MAX_DELAY_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("RECONNECT_MAX_DELAY_SECS={raw:?}")))?;
            config.reconnect_max_delay = Duration::from_secs(secs.max(1));
        }

        if let Ok(raw) = std::env::var("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("REQUEST_TIMEOUT_SECS={raw:?}")))?;
            if secs == 0 {
                return Err(ClientError::Config("REQUEST_TIMEOUT_SECS must be > 0".into()));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// WebSocket URL of the signal stream, derived from the service URL.
    pub fn signals_url(&self) -> Url {
        let mut url = self.service_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http <-> ws and https <-> wss are all special schemes, so this
        // cannot fail.
        let _ = url.set_scheme(scheme);
        url.set_path(SIGNALS_PATH);
        url
    }
}

fn parse_service_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw)
        .map_err(|e| ClientError::Config(format!("SERVICE_URL={raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::Config(format!(
            "SERVICE_URL must be http or https, got scheme {other:?}"
        ))),
    }
}
