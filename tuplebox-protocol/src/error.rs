//! Protocol error types and the remote error reported by the store.

use std::fmt;
use thiserror::Error;

/// Errors raised while framing or decoding data received from the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("truncated input: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("invalid varint length prefix")]
    InvalidVarint,

    #[error("reply body too short for status word: {0} bytes")]
    BodyTooShort(usize),

    #[error("response/command mismatch: sent {sent:#x}, got {received:#x}")]
    CommandMismatch { sent: u32, received: u32 },

    #[error("stale or out-of-order reply: expected sync id {expected}, got {received}")]
    SyncIdMismatch { expected: u32, received: u32 },

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("unknown update opcode: {0:#04x}")]
    UnknownOpcode(u8),

    #[error("tuple size mismatch: {remaining} bytes left after {cardinality} fields")]
    TupleSizeMismatch { cardinality: u32, remaining: usize },
}

/// Errors raised while turning application values into wire bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("integer {0} does not fit in a 32-bit field")]
    IntegerOutOfRange(i64),

    #[error("field too large: {0} bytes")]
    FieldTooLarge(usize),

    #[error("unsupported update operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid update operation: {0}")]
    InvalidOperation(String),
}

/// A nonzero status word returned by the store.
///
/// The low byte of the status is the completion status, the upper bits carry
/// the error code. Whatever followed the status word is kept as a message and
/// is never decoded as tuples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub status: u32,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: u32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Error code carried in the upper 24 bits of the status.
    pub fn code(&self) -> u32 {
        self.status >> 8
    }

    /// Completion status carried in the low byte of the status.
    pub fn completion_status(&self) -> u8 {
        (self.status & 0xff) as u8
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "remote error {:#x}", self.status)
        } else {
            write!(f, "remote error {:#x}: {}", self.status, self.message)
        }
    }
}

impl std::error::Error for RemoteError {}
