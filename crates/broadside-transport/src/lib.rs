//! Transport abstraction layer for Broadside.
//!
//! Provides the [`Transport`] and [`Connection`] traits and a
//! newline-delimited TCP implementation of both.
//!
//! # Connection lifecycle
//!
//! 1. A [`Transport`] accepts a socket and hands back a [`Connection`].
//! 2. The caller exchanges text lines through `send_line`/`recv_line`
//!    until either side goes away.
//! 3. `recv_line` returns `Ok(None)` once the peer closed cleanly; after
//!    [`Connection::close`] sends fail with
//!    [`TransportError::ConnectionClosed`].
//!
//! # Reading lines
//!
//! Every [`LineConnection`] owns a background reader task that splits the
//! inbound byte stream into lines and queues them on a channel. Reading a
//! line is therefore a channel receive, which is cancel-safe: a caller can
//! wrap [`Connection::recv_line`] in `tokio::time::timeout` without losing
//! half-read input when the timer fires.
//!
//! The reader never gives up on a connection because of one bad line.
//! Bytes that are not valid UTF-8 are replaced with `U+FFFD`, and a line
//! longer than [`MAX_LINE_BYTES`] is dropped whole. Checking the content is
//! left to the layer above.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{LineConnection, MAX_LINE_BYTES, TcpLineTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// ## Trait bounds explained
///
/// - `Send + Sync + 'static`: the server moves the transport into its
///   accept loop task, which Tokio may run on any worker thread.
/// - `type Connection: Connection`: each accepted connection is handed to its
///   own task, so it carries the same bounds.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single duplex connection that carries text lines.
///
/// Every method takes `&self`, so one connection can be shared behind an
/// `Arc` by a task that reads and another that writes. Implementations do
/// their own locking and must keep each line (or batch from
/// [`send_lines`](Connection::send_lines)) contiguous on the wire.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Writes one line (a trailing newline is appended).
    async fn send_line(&self, line: &str) -> Result<(), Self::Error>;

    /// Writes several lines back to back with a single flush.
    ///
    /// Nothing else can be interleaved between them on this connection.
    async fn send_lines(&self, lines: &[String]) -> Result<(), Self::Error>;

    /// Receives the next line from the peer, without its line terminator.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly.
    async fn recv_line(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }

    #[test]
    fn test_transport_error_connection_fault_classification() {
        let closed = TransportError::ConnectionClosed("eof".into());
        let accept = TransportError::AcceptFailed(std::io::Error::other("x"));
        assert!(closed.is_connection_fault());
        assert!(!accept.is_connection_fault());
    }
}
