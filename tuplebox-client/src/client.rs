//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use crate::transport::Transport;
use std::time::Duration;
use tuplebox_protocol::reply::{decode_reply, unwrap_status, Unwrapped};
use tuplebox_protocol::{
    DeleteOptions, Field, InsertOptions, Key, Reply, Request, SelectOptions, UpdateOp,
    UpdateOptions,
};

/// High-level client for tuplebox.
///
/// Generic over the [`Transport`] so the same API drives a TCP
/// [`Connection`] or an in-memory double.
pub struct Client<T = Connection> {
    transport: T,
    namespace: u32,
}

impl Client<Connection> {
    /// Creates a new client with the given configuration (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_transport(Connection::new(config))
    }

    /// Connects to the server.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        self.transport.connect().await
    }

    /// Returns whether the client is connected.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Closes the connection.
    pub async fn close(&mut self) {
        self.transport.close().await
    }

    /// Pings the server and returns the round-trip time.
    pub async fn ping(&mut self) -> Result<Duration, ClientError> {
        self.transport.ping().await
    }

    pub fn connection(&self) -> &Connection {
        &self.transport
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            namespace: 0,
        }
    }

    /// Sets the namespace used when an operation's options leave it unset.
    pub fn with_namespace(mut self, namespace: u32) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn namespace(&self) -> u32 {
        self.namespace
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    async fn request(&mut self, request: Request) -> Result<Reply, ClientError> {
        let command = request.command();
        let want_tuples = request.wants_tuples();
        let payload = request.encode_payload()?;

        let body = self.transport.call(command, payload).await?;
        match unwrap_status(body)? {
            Unwrapped::Ok(payload) => Ok(decode_reply(payload, want_tuples)?),
            Unwrapped::Remote(err) => {
                tracing::debug!("Request code={:#x} failed: {}", command.as_u32(), err);
                Err(err.into())
            }
        }
    }

    // =========================================================================
    // Data operations
    // =========================================================================

    /// Inserts one tuple. By default an existing tuple with the same primary
    /// key is overwritten; [`InsertOptions::mode`] restricts that.
    ///
    /// The reply carries the affected count, plus the stored tuple when
    /// `return_tuple` is set.
    pub async fn insert(
        &mut self,
        tuple: Vec<Field>,
        opts: InsertOptions,
    ) -> Result<Reply, ClientError> {
        let request = Request::Insert {
            namespace: opts.namespace.unwrap_or(self.namespace),
            return_tuple: opts.return_tuple,
            mode: opts.mode,
            tuple,
        };
        self.request(request).await
    }

    /// Deletes the tuple stored under `key` in the primary index.
    pub async fn delete(
        &mut self,
        key: impl Into<Key>,
        opts: DeleteOptions,
    ) -> Result<Reply, ClientError> {
        let request = Request::Delete {
            namespace: opts.namespace.unwrap_or(self.namespace),
            key: key.into(),
        };
        self.request(request).await
    }

    /// Selects the tuples matching any of `keys`.
    ///
    /// No keys means no round trip: an empty reply comes back immediately.
    pub async fn select<K: Into<Key>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        opts: SelectOptions,
    ) -> Result<Reply, ClientError> {
        let keys: Vec<Key> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Ok(Reply::empty());
        }

        let request = Request::Select {
            namespace: opts.namespace.unwrap_or(self.namespace),
            index: opts.index,
            offset: opts.offset,
            limit: opts.limit,
            keys,
        };
        self.request(request).await
    }

    /// Applies `ops` to the tuple stored under `key`.
    ///
    /// No ops means no round trip: a zero reply comes back immediately.
    pub async fn update_fields(
        &mut self,
        key: impl Into<Key>,
        ops: Vec<UpdateOp>,
        opts: UpdateOptions,
    ) -> Result<Reply, ClientError> {
        if ops.is_empty() {
            return Ok(Reply::empty());
        }

        let request = Request::Update {
            namespace: opts.namespace.unwrap_or(self.namespace),
            return_tuple: opts.return_tuple,
            key: key.into(),
            ops,
        };
        self.request(request).await
    }

    /// Calls the stored procedure `name`. The reply carries every tuple the
    /// procedure returned.
    pub async fn call(
        &mut self,
        name: impl Into<String>,
        args: Vec<Field>,
    ) -> Result<Reply, ClientError> {
        let request = Request::Call {
            name: name.into(),
            args,
        };
        self.request(request).await
    }
}
