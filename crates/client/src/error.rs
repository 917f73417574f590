use healthmon_core::error::CoreError;

/// Errors surfaced by the monitor client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The service is unreachable, or was lost mid-session.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A received event did not have the expected shape.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A supervised client task panicked or was aborted.
    #[error("Client task failed: {0}")]
    Task(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Connection(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ClientError::Connection(e.to_string())
    }
}

impl From<CoreError> for ClientError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MalformedEvent(msg) => ClientError::MalformedEvent(msg),
            CoreError::InvalidConfig(msg) => ClientError::Config(msg),
        }
    }
}
