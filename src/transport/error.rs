//! Transport error type.

use thiserror::Error;

/// Errors that can occur while talking to the review server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered but did not report success.
    #[error("server rejected the call: {0}")]
    Rejected(String),

    /// The response body was not the expected JSON.
    #[error("failed to parse server response: {0}")]
    Parse(String),

    /// The outbound queue is full or its worker has stopped.
    #[error("outbound queue unavailable: {0}")]
    Queue(String),

    /// Server access is turned off in the configuration.
    #[error("server access is disabled")]
    Disabled,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }
}
