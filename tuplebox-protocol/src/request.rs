//! Request payloads.
//!
//! | Request | Payload | Code |
//! |---|---|---|
//! | insert | `namespace:4 flags:4 tuple` | 13 |
//! | select | `namespace:4 index:4 offset:4 limit:4 key_count:4 key*` | 17 |
//! | update | `namespace:4 flags:4 key op_count:4 op*` | 19 |
//! | delete | `namespace:4 key` | 20 |
//! | call | `flags:4 name args` | 22 |
//!
//! `name` is one length-prefixed field; `args` uses the key layout
//! (`<count:4><field>*`).

use crate::codec::{encode_field, encode_key, encode_tuple};
use crate::error::EncodingError;
use crate::field::{Field, Key};
use crate::frame::CommandCode;
use crate::update::{encode_ops, UpdateOp};
use bytes::{BufMut, Bytes, BytesMut};

/// Flag bit asking the store to send the affected tuple back.
pub const FLAG_RETURN_TUPLE: u32 = 1 << 0;

/// Insert flag: fail if a tuple with the same primary key exists.
pub const FLAG_ADD: u32 = 1 << 1;

/// Insert flag: fail unless a tuple with the same primary key exists.
pub const FLAG_REPLACE: u32 = 1 << 2;

/// How an insert treats an existing tuple with the same primary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertMode {
    /// Insert or overwrite.
    #[default]
    Store,
    /// Insert only; a duplicate key is a remote error.
    Add,
    /// Overwrite only; a missing key is a remote error.
    Replace,
}

impl InsertMode {
    pub fn flag(self) -> u32 {
        match self {
            InsertMode::Store => 0,
            InsertMode::Add => FLAG_ADD,
            InsertMode::Replace => FLAG_REPLACE,
        }
    }

    /// Reads the mode back from insert flags. Both bits set is not a mode.
    pub fn from_flags(flags: u32) -> Option<Self> {
        match (flags & FLAG_ADD != 0, flags & FLAG_REPLACE != 0) {
            (false, false) => Some(InsertMode::Store),
            (true, false) => Some(InsertMode::Add),
            (false, true) => Some(InsertMode::Replace),
            (true, true) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Falls back to the client's default namespace when `None`.
    pub namespace: Option<u32>,
    pub return_tuple: bool,
    pub mode: InsertMode,
}

impl InsertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: u32) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn return_tuple(mut self) -> Self {
        self.return_tuple = true;
        self
    }

    pub fn mode(mut self, mode: InsertMode) -> Self {
        self.mode = mode;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub namespace: Option<u32>,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: u32) -> Self {
        self.namespace = Some(namespace);
        self
    }
}

/// Select options. Defaults: primary index, no offset, no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOptions {
    pub namespace: Option<u32>,
    pub index: u32,
    pub offset: u32,
    pub limit: u32,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            index: 0,
            offset: 0,
            limit: u32::MAX,
        }
    }
}

impl SelectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: u32) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub namespace: Option<u32>,
    pub return_tuple: bool,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: u32) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn return_tuple(mut self) -> Self {
        self.return_tuple = true;
        self
    }
}

/// A data request with its namespace already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Insert {
        namespace: u32,
        return_tuple: bool,
        mode: InsertMode,
        tuple: Vec<Field>,
    },
    Delete {
        namespace: u32,
        key: Key,
    },
    Select {
        namespace: u32,
        index: u32,
        offset: u32,
        limit: u32,
        keys: Vec<Key>,
    },
    Update {
        namespace: u32,
        return_tuple: bool,
        key: Key,
        ops: Vec<UpdateOp>,
    },
    /// Stored procedure call. Not bound to a namespace.
    Call {
        name: String,
        args: Vec<Field>,
    },
}

impl Request {
    pub fn command(&self) -> CommandCode {
        match self {
            Request::Insert { .. } => CommandCode::Insert,
            Request::Delete { .. } => CommandCode::Delete,
            Request::Select { .. } => CommandCode::Select,
            Request::Update { .. } => CommandCode::Update,
            Request::Call { .. } => CommandCode::Call,
        }
    }

    /// Whether the reply carries tuples after the affected count.
    pub fn wants_tuples(&self) -> bool {
        match self {
            Request::Insert { return_tuple, .. } | Request::Update { return_tuple, .. } => {
                *return_tuple
            }
            Request::Select { .. } | Request::Call { .. } => true,
            Request::Delete { .. } => false,
        }
    }

    /// Serializes the request body (everything after the frame header).
    pub fn encode_payload(&self) -> Result<Bytes, EncodingError> {
        let mut buf = BytesMut::with_capacity(64);
        match self {
            Request::Insert {
                namespace,
                return_tuple,
                mode,
                tuple,
            } => {
                buf.put_u32(*namespace);
                buf.put_u32(flags(*return_tuple) | mode.flag());
                encode_tuple(tuple, &mut buf)?;
            }
            Request::Delete { namespace, key } => {
                buf.put_u32(*namespace);
                encode_key(key, &mut buf)?;
            }
            Request::Select {
                namespace,
                index,
                offset,
                limit,
                keys,
            } => {
                buf.put_u32(*namespace);
                buf.put_u32(*index);
                buf.put_u32(*offset);
                buf.put_u32(*limit);
                buf.put_u32(keys.len() as u32);
                for key in keys {
                    encode_key(key, &mut buf)?;
                }
            }
            Request::Update {
                namespace,
                return_tuple,
                key,
                ops,
            } => {
                buf.put_u32(*namespace);
                buf.put_u32(flags(*return_tuple));
                encode_key(key, &mut buf)?;
                encode_ops(ops, &mut buf)?;
            }
            Request::Call { name, args } => {
                buf.put_u32(FLAG_RETURN_TUPLE);
                encode_field(&Field::from(name.as_str()), &mut buf)?;
                buf.put_u32(args.len() as u32);
                for arg in args {
                    encode_field(arg, &mut buf)?;
                }
            }
        }
        Ok(buf.freeze())
    }
}

fn flags(return_tuple: bool) -> u32 {
    if return_tuple {
        FLAG_RETURN_TUPLE
    } else {
        0
    }
}
