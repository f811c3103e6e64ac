//! Request/reply transport seam.

use crate::error::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use tuplebox_protocol::CommandCode;

/// Sends one request body and returns the matching reply body.
///
/// Implementations handle framing and correlation; the body returned still
/// starts with the status word. [`Connection`](crate::Connection) is the
/// TCP implementation; tests substitute in-memory stores.
#[async_trait]
pub trait Transport: Send {
    async fn call(&mut self, command: CommandCode, payload: Bytes) -> Result<Bytes, ClientError>;
}
