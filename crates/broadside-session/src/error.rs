use broadside_protocol::Identity;

/// Errors from the identity registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The identity is already in the lobby or in a live match.
    #[error("identity {0} is already in use")]
    DuplicateIdentity(Identity),

    /// The chosen name cannot be used as an identity.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// No session exists for the identity.
    #[error("no session for {0}")]
    NotFound(Identity),

    /// The identity was detached, but its grace window has elapsed.
    #[error("reconnection window for {0} has expired")]
    SessionExpired(Identity),
}
