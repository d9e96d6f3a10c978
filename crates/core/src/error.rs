//! Error types for Vibechat Core

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a failure, as the store and presenter see it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient; the user retries by re-invoking the command
    Network,
    /// Session is invalid; handed to the session collaborator
    Auth,
    /// The chat does not exist; terminal for this chat session
    NotFound,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) | Error::Io(_) => ErrorKind::Network,
            Error::Authentication(_) => ErrorKind::Auth,
            Error::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }

    /// Rebuild an error from its kind (used when errors cross the wire)
    pub fn from_kind(kind: ErrorKind, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match kind {
            ErrorKind::Network => Error::Network(reason),
            ErrorKind::Auth => Error::Authentication(reason),
            ErrorKind::NotFound => Error::NotFound(reason),
            ErrorKind::Other => Error::Protocol(reason),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::Network("down".into()).kind(), ErrorKind::Network);
        assert_eq!(Error::Authentication("expired".into()).kind(), ErrorKind::Auth);
        assert_eq!(Error::NotFound("chat".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Protocol("bad".into()).kind(), ErrorKind::Other);

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(Error::from(io).kind(), ErrorKind::Network);
    }

    #[test]
    fn test_from_kind_preserves_kind() {
        for kind in [ErrorKind::Network, ErrorKind::Auth, ErrorKind::NotFound] {
            assert_eq!(Error::from_kind(kind, "x").kind(), kind);
        }
    }
}
