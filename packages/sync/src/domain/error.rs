//! Error types for the synchronizer ports.
//!
//! None of these reach the host: the subscription loop turns them into a
//! connectivity change or a `last_error` message.

use thiserror::Error;

/// Snapshot fetch errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be built or sent
    #[error("Snapshot request failed: {0}")]
    Request(String),

    /// The server answered with a non-2xx status
    #[error("Snapshot request returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not a JSON array of items
    #[error("Snapshot response could not be decoded: {0}")]
    Decode(String),
}

/// Streaming channel errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The stream URL could not be built
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// The connection handshake failed
    #[error("Connection error: {0}")]
    Connect(String),

    /// Writing a frame failed
    #[error("Send error: {0}")]
    Send(String),
}
