//! Reply bodies.
//!
//! ```text
//! body   ::= <status:4> <payload>
//! payload::= <affected:4> <tuple>*      (status == 0)
//!          | <message bytes>           (status != 0)
//! ```

use crate::codec::{decode_tuple, encode_tuple, get_u32_checked};
use crate::error::{EncodingError, ProtocolError, RemoteError};
use crate::field::{Field, Tuple};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

/// Decoded result of a successful request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    /// Number of tuples the request touched or returned.
    pub affected: u32,
    /// Tuples sent back, empty unless the request asked for them.
    pub tuples: Vec<Tuple>,
}

impl Reply {
    /// The zero result returned for requests that need no round trip.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Outcome of checking a reply status word.
#[derive(Debug)]
pub enum Unwrapped {
    Ok(Bytes),
    Remote(RemoteError),
}

/// Splits the status word off a reply body.
///
/// A nonzero status turns into [`RemoteError`] carrying the rest of the body
/// as a message; the rest is never handed to the tuple decoder.
pub fn unwrap_status(mut body: Bytes) -> Result<Unwrapped, ProtocolError> {
    if body.len() < 4 {
        return Err(ProtocolError::BodyTooShort(body.len()));
    }
    let status = body.get_u32();
    if status == 0 {
        return Ok(Unwrapped::Ok(body));
    }

    let text = body
        .iter()
        .position(|&b| b == 0)
        .map_or(&body[..], |nul| &body[..nul]);
    let message = String::from_utf8_lossy(text).into_owned();
    Ok(Unwrapped::Remote(RemoteError::new(status, message)))
}

/// Decodes the payload that follows a zero status.
pub fn decode_reply(mut payload: Bytes, want_tuples: bool) -> Result<Reply, ProtocolError> {
    let affected = get_u32_checked(&mut payload)?;
    if !want_tuples {
        return Ok(Reply {
            affected,
            tuples: Vec::new(),
        });
    }

    let mut tuples = Vec::with_capacity(affected.min(1024) as usize);
    for _ in 0..affected {
        tuples.push(decode_tuple(&mut payload)?);
    }
    Ok(Reply { affected, tuples })
}

/// Builds a successful reply body (status word included).
pub fn encode_ok(affected: u32, tuples: &[Vec<Field>]) -> Result<Bytes, EncodingError> {
    let mut buf = BytesMut::with_capacity(64);
    buf.put_u32(0);
    buf.put_u32(affected);
    for tuple in tuples {
        encode_tuple(tuple, &mut buf)?;
    }
    Ok(buf.freeze())
}

/// Builds an error reply body (status word plus NUL-terminated message).
pub fn encode_error(status: u32, message: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(5 + message.len());
    buf.put_u32(status);
    buf.put_slice(message.as_bytes());
    buf.put_u8(0);
    buf.freeze()
}
