//! Update-operation compiler.
//!
//! Each operation is encoded as `<field_index:4><opcode:1><operand>`. `Set`
//! carries an arbitrary field; the arithmetic and bitwise kinds carry a
//! 4-byte integer written as a field of length 4.

use crate::codec::{decode_field, encode_field, get_u32_checked};
use crate::error::{EncodingError, ProtocolError};
use crate::field::Field;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use std::str::FromStr;

/// Kind of a field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Set,
    Add,
    And,
    Or,
    Xor,
}

impl UpdateKind {
    pub fn opcode(self) -> u8 {
        match self {
            UpdateKind::Set => 0x00,
            UpdateKind::Add => 0x01,
            UpdateKind::And => 0x02,
            UpdateKind::Or => 0x03,
            UpdateKind::Xor => 0x04,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            UpdateKind::Set => '=',
            UpdateKind::Add => '+',
            UpdateKind::And => '&',
            UpdateKind::Or => '|',
            UpdateKind::Xor => '^',
        }
    }

    pub fn from_symbol(symbol: char) -> Result<Self, EncodingError> {
        match symbol {
            '=' => Ok(UpdateKind::Set),
            '+' => Ok(UpdateKind::Add),
            '&' => Ok(UpdateKind::And),
            '|' => Ok(UpdateKind::Or),
            '^' => Ok(UpdateKind::Xor),
            other => Err(EncodingError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl TryFrom<u8> for UpdateKind {
    type Error = EncodingError;

    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        match opcode {
            0x00 => Ok(UpdateKind::Set),
            0x01 => Ok(UpdateKind::Add),
            0x02 => Ok(UpdateKind::And),
            0x03 => Ok(UpdateKind::Or),
            0x04 => Ok(UpdateKind::Xor),
            other => Err(EncodingError::UnsupportedOperation(format!(
                "opcode {other:#04x}"
            ))),
        }
    }
}

/// Operand of an update: `Set` takes any field, the rest take an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Field(Field),
    Integer(u32),
}

/// A single field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOp {
    pub field_index: u32,
    pub kind: UpdateKind,
    pub operand: Operand,
}

impl UpdateOp {
    pub fn set(field_index: u32, value: impl Into<Field>) -> Self {
        Self {
            field_index,
            kind: UpdateKind::Set,
            operand: Operand::Field(value.into()),
        }
    }

    pub fn add(field_index: u32, value: u32) -> Self {
        Self::arith(field_index, UpdateKind::Add, value)
    }

    pub fn and(field_index: u32, value: u32) -> Self {
        Self::arith(field_index, UpdateKind::And, value)
    }

    pub fn or(field_index: u32, value: u32) -> Self {
        Self::arith(field_index, UpdateKind::Or, value)
    }

    pub fn xor(field_index: u32, value: u32) -> Self {
        Self::arith(field_index, UpdateKind::Xor, value)
    }

    fn arith(field_index: u32, kind: UpdateKind, value: u32) -> Self {
        Self {
            field_index,
            kind,
            operand: Operand::Integer(value),
        }
    }

    /// Appends the wire form of this operation.
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), EncodingError> {
        let operand = match &self.operand {
            Operand::Integer(n) => Field::Integer(*n),
            Operand::Field(field) if self.kind == UpdateKind::Set => field.clone(),
            Operand::Field(Field::Integer(n)) => Field::Integer(*n),
            Operand::Field(Field::Bytes(_)) => {
                return Err(EncodingError::InvalidOperation(format!(
                    "'{}' needs a 32-bit integer operand",
                    self.kind.symbol()
                )))
            }
        };

        buf.put_u32(self.field_index);
        buf.put_u8(self.kind.opcode());
        encode_field(&operand, buf)
    }

    /// Reads one operation written by [`UpdateOp::encode`].
    pub fn decode(buf: &mut Bytes) -> Result<Self, ProtocolError> {
        let field_index = get_u32_checked(buf)?;
        if !buf.has_remaining() {
            return Err(ProtocolError::Truncated {
                needed: 1,
                available: 0,
            });
        }
        let opcode = buf.get_u8();
        let kind = UpdateKind::try_from(opcode).map_err(|_| ProtocolError::UnknownOpcode(opcode))?;
        let raw = decode_field(buf)?;

        let operand = match kind {
            UpdateKind::Set => Operand::Field(Field::Bytes(raw)),
            _ => {
                let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| {
                    ProtocolError::Truncated {
                        needed: 4,
                        available: raw.len(),
                    }
                })?;
                Operand::Integer(u32::from_be_bytes(bytes))
            }
        };

        Ok(Self {
            field_index,
            kind,
            operand,
        })
    }
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.field_index, self.kind.symbol())?;
        match &self.operand {
            Operand::Integer(n) | Operand::Field(Field::Integer(n)) => write!(f, "{}", n),
            Operand::Field(Field::Bytes(b)) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

/// Parses `<field><symbol><value>`, e.g. `2=y`, `1+5`, `3^255`.
impl FromStr for UpdateOp {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| EncodingError::InvalidOperation(s.to_string()))?;
        if split == 0 {
            return Err(EncodingError::InvalidOperation(s.to_string()));
        }

        let field_index: u32 = s[..split]
            .parse()
            .map_err(|_| EncodingError::InvalidOperation(s.to_string()))?;
        let mut rest = s[split..].chars();
        let symbol = rest
            .next()
            .ok_or_else(|| EncodingError::InvalidOperation(s.to_string()))?;
        let kind = UpdateKind::from_symbol(symbol)?;
        let value = rest.as_str();

        match kind {
            UpdateKind::Set => Ok(UpdateOp::set(field_index, Field::parse_arg(value))),
            _ => {
                let n: u32 = value.parse().map_err(|_| {
                    EncodingError::InvalidOperation(format!(
                        "'{}' needs a 32-bit integer operand: {}",
                        symbol, s
                    ))
                })?;
                Ok(Self::arith(field_index, kind, n))
            }
        }
    }
}

/// Appends `<op_count:4>` followed by every operation.
pub fn encode_ops(ops: &[UpdateOp], buf: &mut BytesMut) -> Result<(), EncodingError> {
    buf.put_u32(ops.len() as u32);
    for op in ops {
        op.encode(buf)?;
    }
    Ok(())
}
