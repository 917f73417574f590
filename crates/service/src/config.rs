use std::str::FromStr;
use std::time::Duration;

use healthmon_core::error::CoreError;
use healthmon_core::sensor::{
    SpikePolicy, DEFAULT_SPIKE_MAX, DEFAULT_SPIKE_MIN, DEFAULT_SPIKE_PROBABILITY,
};

/// Service configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development; override via
/// environment variables (or a `.env` file).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Period of the sensor simulation loop (default: 2 s).
    pub sensor_interval: Duration,
    /// Period of the threshold evaluation loop (default: 1 s).
    pub monitor_interval: Duration,
    /// Load-spike policy of the simulated sensor.
    pub spike: SpikePolicy,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum wait for background loops to stop on shutdown (default: `5`).
    pub shutdown_timeout_secs: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default    |
    /// |-------------------------|------------|
    /// | `HOST`                  | `0.0.0.0`  |
    /// | `PORT`                  | `3000`     |
    /// | `SENSOR_INTERVAL_MS`    | `2000`     |
    /// | `MONITOR_INTERVAL_MS`   | `1000`     |
    /// | `SPIKE_PROBABILITY`     | `1/21`     |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `5`        |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = env_parse("PORT", defaults.port)?;

        let sensor_interval_ms = env_parse("SENSOR_INTERVAL_MS", 2000u64)?;
        let monitor_interval_ms = env_parse("MONITOR_INTERVAL_MS", 1000u64)?;
        if sensor_interval_ms == 0 || monitor_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "loop intervals must be greater than zero".into(),
            ));
        }

        let spike_probability = env_parse("SPIKE_PROBABILITY", DEFAULT_SPIKE_PROBABILITY)?;
        let spike = SpikePolicy::new(spike_probability, DEFAULT_SPIKE_MIN, DEFAULT_SPIKE_MAX)?;

        let request_timeout_secs =
            env_parse("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;
        let shutdown_timeout_secs =
            env_parse("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout_secs)?;

        Ok(Self {
            host,
            port,
            sensor_interval: Duration::from_millis(sensor_interval_ms),
            monitor_interval: Duration::from_millis(monitor_interval_ms),
            spike,
            request_timeout_secs,
            shutdown_timeout_secs,
        })
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            sensor_interval: Duration::from_secs(2),
            monitor_interval: Duration::from_secs(1),
            spike: SpikePolicy::default(),
            request_timeout_secs: 30,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn env_parse<T>(key: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::InvalidConfig(format!("{key}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}
