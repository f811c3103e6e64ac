//! Tuple codec.
//!
//! ```text
//! field  ::= <varint len> <len bytes>
//! key    ::= <field_count:4> <field>+
//! tuple  ::= <byte_size:4> <cardinality:4> <field>*
//! ```
//!
//! `byte_size` covers the encoded fields only, not the cardinality word.

use crate::error::{EncodingError, ProtocolError};
use crate::field::{Field, Key, Tuple};
use crate::varint::{encoded_len, get_varint, put_varint};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Bytes `field` occupies once encoded, prefix included.
pub fn encoded_field_len(field: &Field) -> usize {
    let raw_len = field.raw_len();
    encoded_len(raw_len as u32) + raw_len
}

/// Appends `<len><raw>` for one field.
pub fn encode_field(field: &Field, buf: &mut BytesMut) -> Result<(), EncodingError> {
    match field {
        Field::Integer(n) => {
            put_varint(buf, 4);
            buf.put_u32(*n);
        }
        Field::Bytes(b) => {
            let len = u32::try_from(b.len()).map_err(|_| EncodingError::FieldTooLarge(b.len()))?;
            put_varint(buf, len);
            buf.put_slice(b);
        }
    }
    Ok(())
}

/// Appends `<field_count:4>` followed by each key field.
pub fn encode_key(key: &Key, buf: &mut BytesMut) -> Result<(), EncodingError> {
    buf.put_u32(key.fields().len() as u32);
    for field in key.fields() {
        encode_field(field, buf)?;
    }
    Ok(())
}

/// Appends `<byte_size:4><cardinality:4>` followed by each field.
pub fn encode_tuple(fields: &[Field], buf: &mut BytesMut) -> Result<(), EncodingError> {
    let byte_size: usize = fields.iter().map(encoded_field_len).sum();
    let byte_size_u32 =
        u32::try_from(byte_size).map_err(|_| EncodingError::FieldTooLarge(byte_size))?;

    buf.reserve(8 + byte_size);
    buf.put_u32(byte_size_u32);
    buf.put_u32(fields.len() as u32);
    for field in fields {
        encode_field(field, buf)?;
    }
    Ok(())
}

/// Reads a big-endian `u32`, failing instead of panicking on short input.
pub fn get_u32_checked(buf: &mut Bytes) -> Result<u32, ProtocolError> {
    ensure_remaining(buf, 4)?;
    Ok(buf.get_u32())
}

fn ensure_remaining(buf: &Bytes, needed: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < needed {
        return Err(ProtocolError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}

/// Reads one field and advances `buf` past it. The returned bytes share the
/// input allocation.
pub fn decode_field(buf: &mut Bytes) -> Result<Bytes, ProtocolError> {
    let len = get_varint(buf)? as usize;
    ensure_remaining(buf, len)?;
    Ok(buf.split_to(len))
}

/// Reads a key written by [`encode_key`].
pub fn decode_key(buf: &mut Bytes) -> Result<Vec<Bytes>, ProtocolError> {
    let count = get_u32_checked(buf)?;
    (0..count).map(|_| decode_field(buf)).collect()
}

/// Reads one tuple and advances `buf` past its `byte_size` region.
pub fn decode_tuple(buf: &mut Bytes) -> Result<Tuple, ProtocolError> {
    let byte_size = get_u32_checked(buf)? as usize;
    let cardinality = get_u32_checked(buf)?;
    ensure_remaining(buf, byte_size)?;

    let mut body = buf.split_to(byte_size);
    let mut fields = Vec::with_capacity(cardinality.min(1024) as usize);
    for _ in 0..cardinality {
        fields.push(decode_field(&mut body)?);
    }
    if !body.is_empty() {
        return Err(ProtocolError::TupleSizeMismatch {
            cardinality,
            remaining: body.len(),
        });
    }
    Ok(Tuple::new(fields))
}
