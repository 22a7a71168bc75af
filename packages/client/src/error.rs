//! Error types for the geolive CLI client.

use geolive_shared::session::SessionError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API base URL or token was rejected
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A prompt line could not be understood
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
