//! Network error types

use std::io;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Not connected")]
    NotConnected,
}

/// Transport failures are network failures as far as the client core cares
impl From<Error> for vibechat_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Protocol(reason) => vibechat_core::Error::Protocol(reason),
            other => vibechat_core::Error::Network(other.to_string()),
        }
    }
}
