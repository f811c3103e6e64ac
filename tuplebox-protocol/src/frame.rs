//! Frame header.
//!
//! Every request and reply starts with the same 12-byte header, followed by
//! `body_len` bytes of body:
//!
//! ```text
//! +------------+------------+------------+
//! |  command   |  body_len  |  sync_id   |
//! |  4 bytes   |  4 bytes   |  4 bytes   |
//! +------------+------------+------------+
//! | body                                 |
//! | body_len bytes                       |
//! +--------------------------------------+
//! ```
//!
//! All three header fields are big-endian.

use crate::error::{EncodingError, ProtocolError};
use crate::MAX_BODY_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the frame header in bytes (3 x u32).
pub const HEADER_SIZE: usize = 12;

/// Request command codes understood by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CommandCode {
    Insert = 13,
    Select = 17,
    Update = 19,
    Delete = 20,
    Call = 22,
    Ping = 0xff00,
}

impl CommandCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            13 => Some(CommandCode::Insert),
            17 => Some(CommandCode::Select),
            19 => Some(CommandCode::Update),
            20 => Some(CommandCode::Delete),
            22 => Some(CommandCode::Call),
            0xff00 => Some(CommandCode::Ping),
            _ => None,
        }
    }
}

/// A parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub command: u32,
    pub body_len: u32,
    pub sync_id: u32,
}

impl Header {
    pub fn new(command: CommandCode, body_len: u32, sync_id: u32) -> Self {
        Self {
            command: command.as_u32(),
            body_len,
            sync_id,
        }
    }

    pub fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32(self.command);
        buf.put_u32(self.body_len);
        buf.put_u32(self.sync_id);
    }

    /// Parses a header from exactly the first 12 bytes of `raw`.
    pub fn parse(raw: &[u8]) -> Result<Self, ProtocolError> {
        if raw.len() < HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                needed: HEADER_SIZE,
                available: raw.len(),
            });
        }
        let mut buf = &raw[..HEADER_SIZE];
        Ok(Self {
            command: buf.get_u32(),
            body_len: buf.get_u32(),
            sync_id: buf.get_u32(),
        })
    }

    /// Checks a reply header against the request it answers.
    pub fn validate_reply(&self, command: CommandCode, sync_id: u32) -> Result<(), ProtocolError> {
        if self.command != command.as_u32() {
            return Err(ProtocolError::CommandMismatch {
                sent: command.as_u32(),
                received: self.command,
            });
        }
        if self.sync_id != sync_id {
            return Err(ProtocolError::SyncIdMismatch {
                expected: sync_id,
                received: self.sync_id,
            });
        }
        if self.body_len > MAX_BODY_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: self.body_len,
                max: MAX_BODY_SIZE,
            });
        }
        Ok(())
    }
}

/// Encodes a full request frame: header followed by `payload`.
///
/// Outgoing bodies are bounded only by the 32-bit length word; the
/// [`MAX_BODY_SIZE`] cap applies to replies.
pub fn encode_request(
    command: CommandCode,
    sync_id: u32,
    payload: &[u8],
) -> Result<Bytes, EncodingError> {
    let body_len =
        u32::try_from(payload.len()).map_err(|_| EncodingError::FieldTooLarge(payload.len()))?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    Header::new(command, body_len, sync_id).put(&mut buf);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_byte_order() {
        let mut buf = BytesMut::new();
        Header::new(CommandCode::Select, 20, 0x0102_0304).put(&mut buf);
        assert_eq!(
            buf.as_ref(),
            &[0, 0, 0, 17, 0, 0, 0, 20, 1, 2, 3, 4],
            "header must be big-endian"
        );
    }

    #[test]
    fn test_header_roundtrip() {
        let header = Header::new(CommandCode::Ping, 0, u32::MAX);
        let mut buf = BytesMut::new();
        header.put(&mut buf);
        assert_eq!(Header::parse(&buf).unwrap(), header);
    }

    #[test]
    fn test_parse_short_header() {
        let result = Header::parse(&[0, 0, 0, 13]);
        assert_eq!(
            result,
            Err(ProtocolError::Truncated {
                needed: HEADER_SIZE,
                available: 4
            })
        );
    }

    #[test]
    fn test_encode_request() {
        let frame = encode_request(CommandCode::Delete, 9, b"abc").unwrap();
        assert_eq!(frame.len(), HEADER_SIZE + 3);
        let header = Header::parse(&frame).unwrap();
        assert_eq!(header.command, 20);
        assert_eq!(header.body_len, 3);
        assert_eq!(header.sync_id, 9);
        assert_eq!(&frame[HEADER_SIZE..], b"abc");
    }

    #[test]
    fn test_encode_request_above_reply_cap() {
        let payload = vec![7u8; MAX_BODY_SIZE as usize + 1];
        let frame = encode_request(CommandCode::Insert, 1, &payload).unwrap();
        let header = Header::parse(&frame).unwrap();
        assert_eq!(header.body_len, MAX_BODY_SIZE + 1);
        assert_eq!(frame.len(), HEADER_SIZE + payload.len());
    }

    #[test]
    fn test_validate_reply() {
        let reply = Header::new(CommandCode::Insert, 8, 5);
        assert!(reply.validate_reply(CommandCode::Insert, 5).is_ok());

        assert_eq!(
            reply.validate_reply(CommandCode::Select, 5),
            Err(ProtocolError::CommandMismatch {
                sent: 17,
                received: 13
            })
        );
        assert_eq!(
            reply.validate_reply(CommandCode::Insert, 6),
            Err(ProtocolError::SyncIdMismatch {
                expected: 6,
                received: 5
            })
        );
    }

    #[test]
    fn test_validate_reply_too_large() {
        let reply = Header::new(CommandCode::Select, MAX_BODY_SIZE + 1, 1);
        assert!(matches!(
            reply.validate_reply(CommandCode::Select, 1),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_command_code_lookup() {
        assert_eq!(CommandCode::from_u32(0xff00), Some(CommandCode::Ping));
        assert_eq!(CommandCode::from_u32(19), Some(CommandCode::Update));
        assert_eq!(CommandCode::from_u32(22), Some(CommandCode::Call));
        assert_eq!(CommandCode::from_u32(21), None);
    }
}
