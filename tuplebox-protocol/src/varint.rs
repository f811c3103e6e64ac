//! Compact length prefix.
//!
//! Base-128 with the most significant group first. Every byte except the
//! last has the `0x80` continuation bit set:
//!
//! ```text
//! 0..=127          0xxxxxxx
//! 128..=16383      1xxxxxxx 0xxxxxxx
//! ...
//! u32::MAX         10001111 11111111 11111111 11111111 01111111
//! ```

use crate::error::ProtocolError;
use bytes::{Buf, BufMut};

/// Longest encoding of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

/// Number of bytes `value` occupies once encoded.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0x0fff_ffff => 4,
        _ => 5,
    }
}

/// Appends the encoding of `value` to `buf`.
pub fn put_varint<B: BufMut>(buf: &mut B, value: u32) {
    let len = encoded_len(value);
    for i in (1..len).rev() {
        buf.put_u8(((value >> (7 * i)) as u8 & 0x7f) | 0x80);
    }
    buf.put_u8(value as u8 & 0x7f);
}

/// Reads one varint from the front of `buf`, advancing past it.
pub fn get_varint<B: Buf>(buf: &mut B) -> Result<u32, ProtocolError> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(ProtocolError::Truncated {
                needed: i + 1,
                available: i,
            });
        }
        let byte = buf.get_u8();
        value = (value << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return u32::try_from(value).map_err(|_| ProtocolError::InvalidVarint);
        }
    }
    Err(ProtocolError::InvalidVarint)
}
