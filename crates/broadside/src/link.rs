//! A framed, sequence-checked view of one line connection.
//!
//! Everything the server says goes out as a frame (`SEQ|TOKEN|CRC`) with
//! a per-connection counter, except board renders, which use the plain
//! `GRID` block. Everything a client says must arrive as a frame; lines
//! that fail the integrity check or repeat an old sequence number are
//! dropped without a reply.

use std::sync::Arc;

use broadside_match::{ConnectionFault, Endpoint};
use broadside_protocol::{AesCtrCipher, FrameCodec, GRID_SENTINEL, SequenceCounter, SequenceGuard};
use broadside_transport::{Connection, ConnectionId, LineConnection, TransportError};
use tokio::sync::Mutex;

/// The frame codec the server speaks.
pub type WireCodec = FrameCodec<AesCtrCipher>;

/// One client connection, speaking frames.
pub struct FramedLink {
    conn: LineConnection,
    codec: Arc<WireCodec>,
    /// Held while a frame is written, so sequence numbers hit the wire in order.
    outbound: Mutex<SequenceCounter>,
    inbound: Mutex<SequenceGuard>,
}

impl FramedLink {
    pub fn new(conn: LineConnection, codec: Arc<WireCodec>) -> Self {
        Self {
            conn,
            codec,
            outbound: Mutex::new(SequenceCounter::new()),
            inbound: Mutex::new(SequenceGuard::new()),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Sends one framed message.
    pub async fn send(&self, text: &str) -> Result<(), TransportError> {
        let mut counter = self.outbound.lock().await;
        let frame = self.codec.encode(counter.next_seq(), text);
        self.conn.send_line(&frame).await
    }

    /// Sends a board render as a `GRID` block terminated by a blank line.
    pub async fn send_grid(&self, rows: &[String]) -> Result<(), TransportError> {
        let mut block = Vec::with_capacity(rows.len() + 2);
        block.push(GRID_SENTINEL.to_string());
        block.extend(rows.iter().cloned());
        block.push(String::new());

        let _order = self.outbound.lock().await;
        self.conn.send_lines(&block).await
    }

    /// Next valid message from the client, or `None` once it hung up.
    ///
    /// Cancel-safe: a timeout around this call loses no input.
    pub async fn recv(&self) -> Result<Option<String>, TransportError> {
        loop {
            let Some(line) = self.conn.recv_line().await? else {
                return Ok(None);
            };

            let frame = match self.codec.decode(&line) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(id = %self.id(), error = %e, "discarding frame");
                    continue;
                }
            };

            if let Err(e) = self.inbound.lock().await.accept(frame.seq) {
                tracing::debug!(id = %self.id(), error = %e, "discarding frame");
                continue;
            }
            return Ok(Some(frame.plaintext));
        }
    }

    /// Whether the client's side of the stream has ended.
    pub fn is_peer_closed(&self) -> bool {
        self.conn.is_peer_closed()
    }

    /// Drops whatever the client typed before now.
    pub async fn discard_pending(&self) -> usize {
        self.conn.discard_pending().await
    }

    pub async fn close(&self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(id = %self.id(), error = %e, "close failed");
        }
    }
}

fn fault(e: TransportError) -> ConnectionFault {
    ConnectionFault(e.to_string())
}

impl Endpoint for FramedLink {
    async fn send(&self, text: &str) -> Result<(), ConnectionFault> {
        FramedLink::send(self, text).await.map_err(fault)
    }

    async fn send_grid(&self, rows: &[String]) -> Result<(), ConnectionFault> {
        FramedLink::send_grid(self, rows).await.map_err(fault)
    }

    async fn recv(&self) -> Result<String, ConnectionFault> {
        match FramedLink::recv(self).await {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(ConnectionFault("peer closed the connection".into())),
            Err(e) => Err(fault(e)),
        }
    }
}
