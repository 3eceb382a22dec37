//! # Hub Error Types

use thiserror::Error;

/// Result type alias for hub operations.
pub type HubResult<T> = Result<T, HubError>;

/// Failures on a subscriber's transport. None of these ever reach the
/// request that published the event.
#[derive(Debug, Error)]
pub enum HubError {
    /// Event could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket send failed (peer gone or socket broken).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid hub configuration.
    #[error("Invalid hub configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}

impl From<axum::Error> for HubError {
    fn from(err: axum::Error) -> Self {
        HubError::Transport(err.to_string())
    }
}
