//! Client error types.

use thiserror::Error;
use tuplebox_protocol::{EncodingError, ProtocolError, RemoteError};

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not connected")]
    NotConnected,

    #[error("request timeout")]
    Timeout,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl ClientError {
    /// Returns whether the socket failed (or was never usable). These are
    /// the errors after which the next call may reconnect.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_) | ClientError::NotConnected | ClientError::Timeout
        )
    }

    /// Status word of a remote failure.
    pub fn remote_status(&self) -> Option<u32> {
        match self {
            ClientError::Remote(err) => Some(err.status),
            _ => None,
        }
    }
}
