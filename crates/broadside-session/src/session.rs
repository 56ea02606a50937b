//! Session types: where an identity currently lives.

use std::time::Duration;

use broadside_protocol::{Identity, MatchId};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the identity registry.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a player who dropped out of a match may take to come back
    /// before the opponent is awarded the win.
    ///
    /// Default: 60 seconds.
    pub reconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where an admitted identity is right now.
///
/// `Instant` is Tokio's clock, so paused-time tests can move it forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting in the lobby (as a player or a spectator).
    Lobby,

    /// Seated in a live match.
    Playing { match_id: MatchId },

    /// Dropped out of a match at `since`; may reattach until
    /// `since + reconnect_grace`.
    Detached { match_id: MatchId, since: Instant },
}

impl SessionState {
    /// The match this identity belongs to, if any.
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Self::Lobby => None,
            Self::Playing { match_id } | Self::Detached { match_id, .. } => Some(*match_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One admitted identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub state: SessionState,
}
