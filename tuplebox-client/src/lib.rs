//! # tuplebox-client
//!
//! Client library for tuplebox.
//!
//! This crate provides:
//! - Async TCP connection with strict request/reply correlation
//! - Lazy reconnection after socket failures
//! - High-level insert/delete/select/update API
//! - A [`Transport`] seam so the API can run against in-memory doubles

pub mod client;
pub mod connection;
pub mod error;
pub mod transport;

pub use client::Client;
pub use connection::{Connection, ConnectionConfig, ConnectionState, SyncIdGenerator};
pub use error::ClientError;
pub use transport::Transport;
