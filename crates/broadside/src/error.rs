//! Unified error type for the Broadside server.

use broadside_match::MatchError;
use broadside_protocol::ProtocolError;
use broadside_session::SessionError;
use broadside_transport::TransportError;

/// Top-level error that wraps the errors of every layer.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum BroadsideError {
    /// Socket-level failure (bind, accept, send, receive).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Frame or coordinate problem.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Identity registry problem.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Match driver or snapshot problem.
    #[error(transparent)]
    Match(#[from] MatchError),
}

#[cfg(test)]
mod tests {
    use broadside_protocol::Identity;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: BroadsideError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, BroadsideError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_session_error() {
        let err: BroadsideError = SessionError::DuplicateIdentity(Identity::new("alice")).into();
        assert!(matches!(err, BroadsideError::Session(_)));
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn test_from_match_error() {
        let err: BroadsideError = MatchError::InvalidState("finished".into()).into();
        assert!(matches!(err, BroadsideError::Match(_)));
    }
}
