//! Newline-delimited TCP transport built on Tokio.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How many complete lines the reader task may queue ahead of the consumer.
const INBOUND_BUFFER: usize = 64;

/// Longest inbound line accepted, terminator excluded. Longer lines are
/// dropped whole and the stream resynchronizes at the next newline.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

type BoxedWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// A TCP [`Transport`] that yields line-oriented connections.
pub struct TcpLineTransport {
    listener: TcpListener,
}

impl TcpLineTransport {
    /// Binds a new listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP line transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpLineTransport {
    type Connection = LineConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Turn-based traffic is tiny; don't let Nagle hold prompts back.
        let _ = stream.set_nodelay(true);

        let (read_half, write_half) = stream.into_split();
        let conn = LineConnection::new(read_half, write_half, Some(addr));
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }
}

/// A single line-oriented connection.
///
/// Reads are served from a channel filled by a dedicated reader task, so
/// [`recv_line`](Connection::recv_line) can be cancelled (e.g. by a turn
/// timeout) without losing partially received input. Writes go through a
/// mutex-guarded buffered writer so concurrent senders never interleave
/// inside a line.
pub struct LineConnection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    writer: Mutex<Option<BoxedWriter>>,
    inbound: Mutex<mpsc::Receiver<io::Result<String>>>,
    reader_task: JoinHandle<()>,
}

impl LineConnection {
    /// Wraps any reader/writer pair (a TCP split, an in-memory duplex, ...).
    ///
    /// Spawns the reader task, so this must be called inside a Tokio runtime.
    pub fn new<R, W>(reader: R, writer: W, peer: Option<SocketAddr>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        let reader_task = tokio::spawn(pump_lines(id, reader, tx));
        let writer: Box<dyn AsyncWrite + Send + Unpin> = Box::new(writer);

        Self {
            id,
            peer,
            writer: Mutex::new(Some(BufWriter::new(writer))),
            inbound: Mutex::new(rx),
            reader_task,
        }
    }

    /// The remote address, when the connection came from a socket.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Whether the peer's side of the stream is gone (EOF, read error or
    /// [`close`](Connection::close)). Lines that arrived before that may
    /// still be queued.
    pub fn is_peer_closed(&self) -> bool {
        self.reader_task.is_finished()
    }

    /// Drops every line that has already arrived but not been read.
    ///
    /// Returns how many queued items were discarded. Used when a
    /// connection changes hands (lobby to match) so that whatever the peer
    /// typed while idle is not mistaken for an answer to the next prompt.
    pub async fn discard_pending(&self) -> usize {
        let mut rx = self.inbound.lock().await;
        let mut discarded = 0;
        while let Ok(item) = rx.try_recv() {
            if item.is_err() {
                break;
            }
            discarded += 1;
        }
        discarded
    }

    async fn write_all(&self, lines: &[&str]) -> Result<(), TransportError> {
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| TransportError::ConnectionClosed(format!("{} already closed", self.id)))?;

        for line in lines {
            writer
                .write_all(line.as_bytes())
                .await
                .map_err(TransportError::SendFailed)?;
            writer
                .write_all(b"\n")
                .await
                .map_err(TransportError::SendFailed)?;
        }
        writer.flush().await.map_err(TransportError::SendFailed)
    }
}

impl Connection for LineConnection {
    type Error = TransportError;

    async fn send_line(&self, line: &str) -> Result<(), Self::Error> {
        self.write_all(&[line]).await
    }

    async fn send_lines(&self, lines: &[String]) -> Result<(), Self::Error> {
        let borrowed: Vec<&str> = lines.iter().map(String::as_str).collect();
        self.write_all(&borrowed).await
    }

    async fn recv_line(&self) -> Result<Option<String>, Self::Error> {
        let mut rx = self.inbound.lock().await;
        match rx.recv().await {
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            None => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.reader_task.abort();
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            writer.shutdown().await.map_err(TransportError::SendFailed)?;
        }
        tracing::debug!(id = %self.id, "connection closed");
        Ok(())
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for LineConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Reader task body: forwards complete lines until EOF, error, or until
/// nobody is listening anymore.
///
/// Lines are read as raw bytes. Invalid UTF-8 is replaced rather than
/// treated as a read error, and lines over [`MAX_LINE_BYTES`] are skipped,
/// so one bad line never ends the connection.
async fn pump_lines<R>(id: ConnectionId, reader: R, tx: mpsc::Sender<io::Result<String>>)
where
    R: AsyncRead + Send + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut oversized = false;
    loop {
        buf.clear();
        let limit = MAX_LINE_BYTES as u64 + 2;
        let read = match (&mut reader).take(limit).read_until(b'\n', &mut buf).await {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(%id, error = %e, "read failed");
                let _ = tx.send(Err(e)).await;
                break;
            }
        };
        if read == 0 {
            tracing::debug!(%id, "peer closed the stream");
            break;
        }

        let terminated = buf.last() == Some(&b'\n');
        if !terminated && read as u64 == limit {
            if !oversized {
                tracing::debug!(%id, limit = MAX_LINE_BYTES, "dropping oversized line");
            }
            oversized = true;
            continue;
        }
        if oversized {
            // Tail of a line that was already dropped.
            oversized = false;
            continue;
        }

        if terminated {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        if buf.len() > MAX_LINE_BYTES {
            tracing::debug!(%id, limit = MAX_LINE_BYTES, "dropping oversized line");
            continue;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(text) => text.to_owned(),
            Err(_) => {
                tracing::debug!(%id, "line is not valid UTF-8");
                String::from_utf8_lossy(&buf).into_owned()
            }
        };
        if tx.send(Ok(line)).await.is_err() {
            break;
        }
    }
}
