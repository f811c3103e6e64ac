//! Connection management.

use crate::error::ClientError;
use crate::transport::Transport;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tuplebox_protocol::frame::{encode_request, Header};
use tuplebox_protocol::{CommandCode, HEADER_SIZE};

/// Default connect timeout (10 s).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout (30 s).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address as `host:port`, resolved on every connect.
    pub addr: String,
    /// Bound on establishing the TCP connection. `None` waits forever.
    pub connect_timeout: Option<Duration>,
    /// Bound on one full request/reply exchange. `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Reopen the socket on the next call after it was closed.
    pub reconnect: bool,
}

impl ConnectionConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            reconnect: true,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Blocks indefinitely on a stalled peer.
    pub fn without_timeouts(mut self) -> Self {
        self.connect_timeout = None;
        self.request_timeout = None;
        self
    }

    pub fn with_reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }
}

/// Whether the connection currently owns a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Source of request correlation ids.
///
/// Pre-increments; the value after `u32::MAX` is 0.
#[derive(Debug, Clone, Default)]
pub struct SyncIdGenerator {
    last: u32,
}

impl SyncIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose next id is `last + 1` (or 0 after `u32::MAX`).
    pub fn starting_after(last: u32) -> Self {
        Self { last }
    }

    pub fn next_id(&mut self) -> u32 {
        self.last = self.last.checked_add(1).unwrap_or(0);
        self.last
    }
}

/// A connection to a tuplebox server.
///
/// One request is in flight at a time: every exchange takes `&mut self` and
/// completes (reply body read in full) before the next one can start. If a
/// pending future is dropped half-way the stream is left desynchronized and
/// the caller should [`close`](Connection::close) it.
pub struct Connection {
    config: ConnectionConfig,
    stream: Option<TcpStream>,
    sync_ids: SyncIdGenerator,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_sync_ids(config, SyncIdGenerator::new())
    }

    /// Creates a new connection drawing correlation ids from `sync_ids`.
    pub fn with_sync_ids(config: ConnectionConfig, sync_ids: SyncIdGenerator) -> Self {
        Self {
            config,
            stream: None,
            sync_ids,
        }
    }

    /// Creates a connection and connects it.
    pub async fn open(config: ConnectionConfig) -> Result<Self, ClientError> {
        let mut conn = Self::new(config);
        conn.connect().await?;
        Ok(conn)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Connects to the server, replacing any existing socket.
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        self.close().await;
        tracing::debug!("Connecting to {}...", self.config.addr);

        let connect = TcpStream::connect(self.config.addr.as_str());
        let stream = match self.config.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
                tracing::debug!("Connection timeout");
                ClientError::Timeout
            })?,
            None => connect.await,
        }
        .map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;

        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        tracing::debug!("Connected to {}", self.config.addr);
        Ok(())
    }

    /// Drops the current socket (if any) and connects again.
    pub async fn reconnect(&mut self) -> Result<(), ClientError> {
        tracing::info!("Reconnecting to {}", self.config.addr);
        self.connect().await
    }

    /// Closes the connection. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            tracing::debug!("Connection closed");
        }
    }

    /// Sends one request and returns the reply body, status word included.
    ///
    /// Any I/O failure, timeout or header mismatch closes the socket; the
    /// next call reconnects when [`ConnectionConfig::reconnect`] is set.
    /// The socket is held outside the connection while the request is in
    /// flight, so dropping this future leaves the connection closed.
    pub async fn send(
        &mut self,
        command: CommandCode,
        payload: &[u8],
    ) -> Result<Bytes, ClientError> {
        self.ensure_open().await?;

        let sync_id = self.sync_ids.next_id();
        let frame = encode_request(command, sync_id, payload)?;
        let request_timeout = self.config.request_timeout;
        let mut stream = self.stream.take().ok_or(ClientError::NotConnected)?;

        tracing::debug!(
            "Sending request code={:#x} sync_id={} ({} bytes)",
            command.as_u32(),
            sync_id,
            payload.len()
        );

        let pending = exchange(&mut stream, &frame, command, sync_id);
        let result = match request_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or(Err(ClientError::Timeout)),
            None => pending.await,
        };

        match result {
            Ok(body) => {
                tracing::debug!("Request sync_id={} got {} byte reply", sync_id, body.len());
                self.stream = Some(stream);
                Ok(body)
            }
            Err(err) => {
                if let ClientError::Protocol(ref protocol) = err {
                    tracing::warn!("Connection desynchronized: {}", protocol);
                } else {
                    tracing::debug!("Request sync_id={} failed: {}", sync_id, err);
                }
                let _ = stream.shutdown().await;
                tracing::debug!("Connection closed");
                Err(err)
            }
        }
    }

    /// Sends an empty ping and returns the round-trip time.
    ///
    /// The reply body carries no status word and is discarded.
    pub async fn ping(&mut self) -> Result<Duration, ClientError> {
        let started = Instant::now();
        self.send(CommandCode::Ping, &[]).await?;
        Ok(started.elapsed())
    }

    async fn ensure_open(&mut self) -> Result<(), ClientError> {
        if self.stream.is_some() {
            return Ok(());
        }
        if !self.config.reconnect {
            tracing::debug!("send() called but not connected");
            return Err(ClientError::NotConnected);
        }
        self.reconnect().await
    }
}

/// Writes one frame and reads the matching reply body.
async fn exchange<S>(
    stream: &mut S,
    frame: &[u8],
    command: CommandCode,
    sync_id: u32,
) -> Result<Bytes, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(frame).await?;

    let mut raw = [0u8; HEADER_SIZE];
    stream.read_exact(&mut raw).await?;
    let header = Header::parse(&raw)?;
    header.validate_reply(command, sync_id)?;

    let mut body = vec![0u8; header.body_len as usize];
    stream.read_exact(&mut body).await?;
    Ok(Bytes::from(body))
}

#[async_trait]
impl Transport for Connection {
    async fn call(&mut self, command: CommandCode, payload: Bytes) -> Result<Bytes, ClientError> {
        self.send(command, &payload).await
    }
}
