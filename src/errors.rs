//! Error types shared across the REST and live streaming clients.

use thiserror::Error;

/// Errors produced by the Auricle client.
#[derive(Debug, Error)]
pub enum AuricleError {
    /// The underlying connection failed to open or dropped abnormally.
    ///
    /// Recoverable through the reconnect policy when one is configured;
    /// otherwise surfaced as a terminal `Error` event on the connection.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An inbound message violated the wire protocol (malformed JSON,
    /// missing discriminator). Never fatal to the connection itself.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The caller invoked an operation on a connection that is closing or
    /// already closed. Fails synchronously at the call site.
    #[error("connection is closed")]
    ConnectionClosed,

    /// The reconnect controller hit its attempt cap. Terminal; the
    /// connection state is forced to `Closed`.
    #[error("reconnect attempts exhausted after {attempts} tries")]
    RetryExhausted {
        /// Number of reopen attempts that were made before giving up.
        attempts: u32,
    },

    /// Invalid client or connection configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// HTTP-level failure from the REST client.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status code.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the API.
        status: u16,
        /// Error detail extracted from the response body.
        message: String,
    },

    /// JSON (de)serialization failure for an outbound control frame or a
    /// REST payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, AuricleError>;

impl AuricleError {
    /// True for failures the live session may recover from by reopening
    /// the transport.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuricleError::Transport(_))
    }
}
