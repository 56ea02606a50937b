//! Error types for the match layer.

use broadside_protocol::ProtocolError;

use crate::ConnectionFault;

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A player's link failed. The driver itself reports this as an
    /// interrupted outcome; the variant exists for callers that talk to
    /// endpoints directly (prompts outside a match).
    #[error(transparent)]
    ConnectionFault(#[from] ConnectionFault),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] ProtocolError),

    /// An operation was attempted in the wrong phase.
    #[error("invalid match state for this operation: {0}")]
    InvalidState(String),
}
