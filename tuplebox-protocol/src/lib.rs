//! # tuplebox-protocol
//!
//! Binary wire protocol for the tuplebox tuple store.
//!
//! This crate provides:
//! - The fixed 12-byte frame header (command, body length, sync id)
//! - Field, key and tuple encoding with varint length prefixes
//! - The update-operation compiler (set/add/and/or/xor)
//! - Request payload builders for insert, delete, select, update and call
//! - Reply status unwrapping and tuple decoding
//!
//! All fixed-width integers on the wire are big-endian. Nothing in this
//! crate performs I/O.

pub mod codec;
pub mod error;
pub mod field;
pub mod frame;
pub mod reply;
pub mod request;
pub mod update;
pub mod varint;

pub use error::{EncodingError, ProtocolError, RemoteError};
pub use field::{Field, Key, Tuple};
pub use frame::{CommandCode, Header, HEADER_SIZE};
pub use reply::{Reply, Unwrapped};
pub use request::{
    DeleteOptions, InsertMode, InsertOptions, Request, SelectOptions, UpdateOptions,
};
pub use update::{Operand, UpdateKind, UpdateOp};

/// Default port of a tuplebox server.
pub const DEFAULT_PORT: u16 = 33013;

/// Maximum reply body accepted from the wire (16 MiB).
pub const MAX_BODY_SIZE: u32 = 16 * 1024 * 1024;
