//! Field, key and tuple value types.
//!
//! [`Field`] is what callers hand to the encoder: a 32-bit integer or a byte
//! string, decided at the API boundary. [`Tuple`] is what the decoder hands
//! back: raw field bytes in order, with accessors for the shapes the caller
//! expects.

use crate::error::EncodingError;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single scalar value inside a tuple or key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// Stored as 4 big-endian bytes.
    Integer(u32),
    /// Stored verbatim.
    Bytes(Bytes),
}

impl Field {
    /// Raw bytes of the field as they appear after the length prefix.
    pub fn to_raw(&self) -> Bytes {
        match self {
            Field::Integer(n) => Bytes::copy_from_slice(&n.to_be_bytes()),
            Field::Bytes(b) => b.clone(),
        }
    }

    /// Length of the raw bytes.
    pub fn raw_len(&self) -> usize {
        match self {
            Field::Integer(_) => 4,
            Field::Bytes(b) => b.len(),
        }
    }

    /// Parses a command-line style argument: decimal `u32` when it parses,
    /// otherwise the UTF-8 bytes of the string.
    pub fn parse_arg(arg: &str) -> Self {
        match arg.parse::<u32>() {
            Ok(n) => Field::Integer(n),
            Err(_) => Field::Bytes(Bytes::copy_from_slice(arg.as_bytes())),
        }
    }
}

impl From<u32> for Field {
    fn from(n: u32) -> Self {
        Field::Integer(n)
    }
}

impl TryFrom<i64> for Field {
    type Error = EncodingError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        u32::try_from(n)
            .map(Field::Integer)
            .map_err(|_| EncodingError::IntegerOutOfRange(n))
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Bytes(Bytes::from(s))
    }
}

impl From<&[u8]> for Field {
    fn from(b: &[u8]) -> Self {
        Field::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Vec<u8>> for Field {
    fn from(b: Vec<u8>) -> Self {
        Field::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for Field {
    fn from(b: Bytes) -> Self {
        Field::Bytes(b)
    }
}

/// Lookup key: one field for primary indexes, several for composite ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    fields: Vec<Field>,
}

impl Key {
    pub fn new(field: impl Into<Field>) -> Self {
        Self {
            fields: vec![field.into()],
        }
    }

    pub fn composite(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

macro_rules! key_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::new(value)
                }
            }
        )*
    };
}

key_from_scalar!(Field, u32, &str, String, &[u8], Vec<u8>, Bytes);

/// A decoded tuple: raw field bytes in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tuple {
    fields: Vec<Bytes>,
}

impl Tuple {
    pub fn new(fields: Vec<Bytes>) -> Self {
        Self { fields }
    }

    /// Builds a decoded-form tuple from encode-side fields.
    pub fn from_fields(fields: &[Field]) -> Self {
        Self {
            fields: fields.iter().map(Field::to_raw).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bytes> {
        self.fields.get(index)
    }

    /// Field `index` read as a 32-bit integer; `None` unless it is 4 bytes long.
    pub fn get_u32(&self, index: usize) -> Option<u32> {
        let raw: [u8; 4] = self.fields.get(index)?.as_ref().try_into().ok()?;
        Some(u32::from_be_bytes(raw))
    }

    /// Field `index` read as UTF-8 text.
    pub fn get_str(&self, index: usize) -> Option<&str> {
        std::str::from_utf8(self.fields.get(index)?).ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.fields.iter()
    }

    pub fn into_fields(self) -> Vec<Bytes> {
        self.fields
    }

    /// Replaces field `index`, growing the tuple with empty fields if needed.
    pub fn set(&mut self, index: usize, value: Bytes) {
        if index >= self.fields.len() {
            self.fields.resize(index + 1, Bytes::new());
        }
        self.fields[index] = value;
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if let Some(n) = self.get_u32(i) {
                write!(f, "{}", n)?;
            } else if let Ok(s) = std::str::from_utf8(field) {
                write!(f, "'{}'", s)?;
            } else {
                write!(f, "<{} bytes>", field.len())?;
            }
        }
        write!(f, "]")
    }
}

/// Serializes each field as an integer when it is 4 bytes long, as a string
/// when it is valid UTF-8, and as a byte array otherwise.
impl Serialize for Tuple {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.fields.len()))?;
        for (i, field) in self.fields.iter().enumerate() {
            if let Some(n) = self.get_u32(i) {
                seq.serialize_element(&n)?;
            } else if let Ok(s) = std::str::from_utf8(field) {
                seq.serialize_element(s)?;
            } else {
                seq.serialize_element(field.as_ref())?;
            }
        }
        seq.end()
    }
}
