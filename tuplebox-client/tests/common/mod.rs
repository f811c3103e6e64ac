//! In-memory tuple store speaking the request/reply body format.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::collections::HashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tuplebox_client::{ClientError, Transport};
use tuplebox_protocol::codec::{decode_field, decode_key, decode_tuple, get_u32_checked};
use tuplebox_protocol::reply::{encode_error, encode_ok};
use tuplebox_protocol::request::FLAG_RETURN_TUPLE;
use tuplebox_protocol::{
    CommandCode, Field, Header, InsertMode, Operand, ProtocolError, Tuple, UpdateKind, UpdateOp,
    HEADER_SIZE,
};

/// Status returned for malformed requests.
pub const ERR_ILLEGAL_PARAMS: u32 = 0x0000_0202;

/// Status returned for integer ops on fields that are not 4 bytes long.
pub const ERR_FIELD_TYPE: u32 = 0x0000_1a02;

/// Status returned by a replace-only insert when the key is missing.
pub const ERR_TUPLE_NOT_FOUND: u32 = 0x0000_3102;

/// Status returned for calls to procedures that do not exist.
pub const ERR_NO_SUCH_PROC: u32 = 0x0000_3302;

/// Status returned by an add-only insert when the key already exists.
pub const ERR_TUPLE_FOUND: u32 = 0x0000_3702;

/// Tuples keyed by namespace and primary key (field 0).
#[derive(Default)]
pub struct FakeStore {
    tuples: HashMap<(u32, Bytes), Tuple>,
    pub calls: usize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    /// Handles one request body and returns the reply body.
    pub fn handle(&mut self, command: CommandCode, payload: Bytes) -> Bytes {
        self.calls += 1;
        let result = match command {
            CommandCode::Insert => self.insert(payload),
            CommandCode::Select => self.select(payload),
            CommandCode::Update => self.update(payload),
            CommandCode::Delete => self.delete(payload),
            CommandCode::Call => self.call(payload),
            CommandCode::Ping => return Bytes::new(),
        };
        result.unwrap_or_else(|e| encode_error(ERR_ILLEGAL_PARAMS, &e.to_string()))
    }

    fn insert(&mut self, mut payload: Bytes) -> Result<Bytes, ProtocolError> {
        let namespace = get_u32_checked(&mut payload)?;
        let flags = get_u32_checked(&mut payload)?;
        let tuple = decode_tuple(&mut payload)?;
        let Some(key) = tuple.get(0).cloned() else {
            return Ok(encode_error(ERR_ILLEGAL_PARAMS, "tuple has no fields"));
        };

        let exists = self.tuples.contains_key(&(namespace, key.clone()));
        match InsertMode::from_flags(flags) {
            Some(InsertMode::Add) if exists => {
                return Ok(encode_error(ERR_TUPLE_FOUND, "Duplicate key exists"));
            }
            Some(InsertMode::Replace) if !exists => {
                return Ok(encode_error(ERR_TUPLE_NOT_FOUND, "Tuple doesn't exist"));
            }
            None => return Ok(encode_error(ERR_ILLEGAL_PARAMS, "conflicting insert flags")),
            _ => {}
        }

        self.tuples.insert((namespace, key), tuple.clone());
        Ok(ok_reply(1, returned(flags, &tuple)))
    }

    fn select(&mut self, mut payload: Bytes) -> Result<Bytes, ProtocolError> {
        let namespace = get_u32_checked(&mut payload)?;
        let _index = get_u32_checked(&mut payload)?;
        let offset = get_u32_checked(&mut payload)? as usize;
        let limit = get_u32_checked(&mut payload)? as usize;
        let key_count = get_u32_checked(&mut payload)?;

        let mut found = Vec::new();
        for _ in 0..key_count {
            let key = decode_key(&mut payload)?;
            if let Some(tuple) = key
                .first()
                .and_then(|k| self.tuples.get(&(namespace, k.clone())))
            {
                found.push(tuple.clone());
            }
        }

        let found: Vec<Tuple> = found.into_iter().skip(offset).take(limit).collect();
        Ok(ok_reply(found.len() as u32, found))
    }

    fn update(&mut self, mut payload: Bytes) -> Result<Bytes, ProtocolError> {
        let namespace = get_u32_checked(&mut payload)?;
        let flags = get_u32_checked(&mut payload)?;
        let key = decode_key(&mut payload)?;
        let op_count = get_u32_checked(&mut payload)?;
        let ops = (0..op_count)
            .map(|_| UpdateOp::decode(&mut payload))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(first) = key.first() else {
            return Ok(encode_error(ERR_ILLEGAL_PARAMS, "empty key"));
        };
        let Some(stored) = self.tuples.get(&(namespace, first.clone())) else {
            return Ok(ok_reply(0, Vec::new()));
        };

        let mut updated = stored.clone();
        for op in &ops {
            let index = op.field_index as usize;
            match (op.kind, &op.operand) {
                (UpdateKind::Set, Operand::Field(field)) => updated.set(index, field.to_raw()),
                (kind, Operand::Integer(operand)) => {
                    let Some(current) = updated.get_u32(index) else {
                        return Ok(encode_error(
                            ERR_FIELD_TYPE,
                            "num op on field with length != 4",
                        ));
                    };
                    let value = apply_arith(kind, current, *operand);
                    updated.set(index, Bytes::copy_from_slice(&value.to_be_bytes()));
                }
                (_, Operand::Field(_)) => {
                    return Ok(encode_error(ERR_ILLEGAL_PARAMS, "bad operand"));
                }
            }
        }

        self.tuples.insert((namespace, first.clone()), updated.clone());
        Ok(ok_reply(1, returned(flags, &updated)))
    }

    fn delete(&mut self, mut payload: Bytes) -> Result<Bytes, ProtocolError> {
        let namespace = get_u32_checked(&mut payload)?;
        let key = decode_key(&mut payload)?;
        let removed = key
            .first()
            .and_then(|k| self.tuples.remove(&(namespace, k.clone())))
            .is_some();
        Ok(ok_reply(u32::from(removed), Vec::new()))
    }

    /// Built-in procedures: `echo` returns its arguments as one tuple and
    /// `count` returns the number of stored tuples.
    fn call(&mut self, mut payload: Bytes) -> Result<Bytes, ProtocolError> {
        let _flags = get_u32_checked(&mut payload)?;
        let name = decode_field(&mut payload)?;
        let args = decode_key(&mut payload)?;

        match &name[..] {
            b"echo" => Ok(ok_reply(1, vec![Tuple::new(args)])),
            b"count" => {
                let count = Field::from(self.tuples.len() as u32);
                Ok(ok_reply(1, vec![Tuple::from_fields(&[count])]))
            }
            other => {
                let message = format!(
                    "Procedure '{}' is not defined",
                    String::from_utf8_lossy(other)
                );
                Ok(encode_error(ERR_NO_SUCH_PROC, &message))
            }
        }
    }
}

/// Integer update semantics of the store. `Add` wraps.
fn apply_arith(kind: UpdateKind, current: u32, operand: u32) -> u32 {
    match kind {
        UpdateKind::Set => operand,
        UpdateKind::Add => current.wrapping_add(operand),
        UpdateKind::And => current & operand,
        UpdateKind::Or => current | operand,
        UpdateKind::Xor => current ^ operand,
    }
}

fn returned(flags: u32, tuple: &Tuple) -> Vec<Tuple> {
    if flags & FLAG_RETURN_TUPLE != 0 {
        vec![tuple.clone()]
    } else {
        Vec::new()
    }
}

fn ok_reply(affected: u32, tuples: Vec<Tuple>) -> Bytes {
    let fields: Vec<Vec<Field>> = tuples
        .into_iter()
        .map(|t| t.into_fields().into_iter().map(Field::Bytes).collect())
        .collect();
    encode_ok(affected, &fields).expect("fake store tuples always encode")
}

#[async_trait]
impl Transport for FakeStore {
    async fn call(&mut self, command: CommandCode, payload: Bytes) -> Result<Bytes, ClientError> {
        Ok(self.handle(command, payload))
    }
}

/// Serves `store` over every connection accepted on `listener`, one at a time.
pub async fn serve(listener: TcpListener, mut store: FakeStore) {
    loop {
        let Ok((mut sock, _)) = listener.accept().await else {
            return;
        };
        loop {
            let mut raw = [0u8; HEADER_SIZE];
            if sock.read_exact(&mut raw).await.is_err() {
                break;
            }
            let header = Header::parse(&raw).expect("12 bytes parse");
            let mut body = vec![0u8; header.body_len as usize];
            if sock.read_exact(&mut body).await.is_err() {
                break;
            }
            let Some(command) = CommandCode::from_u32(header.command) else {
                break;
            };

            let reply = store.handle(command, Bytes::from(body));
            let mut out = BytesMut::new();
            Header {
                command: header.command,
                body_len: reply.len() as u32,
                sync_id: header.sync_id,
            }
            .put(&mut out);
            out.extend_from_slice(&reply);
            if sock.write_all(&out).await.is_err() {
                break;
            }
        }
    }
}

