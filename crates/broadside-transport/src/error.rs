/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed (by the peer or by us).
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a line failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a line failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` for errors that mean the peer is gone for good.
    ///
    /// Every variant except `AcceptFailed` describes a dead connection;
    /// the match layer treats all of them as a connection fault.
    pub fn is_connection_fault(&self) -> bool {
        !matches!(self, Self::AcceptFailed(_))
    }
}
