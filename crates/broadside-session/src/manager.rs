//! The session manager: who is admitted, and who is waiting to come back.
//!
//! Besides the identity registry, the manager owns the hand-off used for
//! reconnection. When a match loses one side it calls
//! [`on_detach`](SessionManager::on_detach) and receives a
//! [`ReconnectionRecord`]. The record holds the receiving half of a
//! oneshot channel; the manager keeps the sending half. A later
//! [`admit`](SessionManager::admit) of the same identity pushes the new
//! link through that channel, which wakes the waiting supervisor directly
//! instead of having it poll.
//!
//! # Races
//!
//! Expiry and reattachment can race: the grace deadline fires in the
//! supervisor at the same moment a new connection is admitted. Both sides
//! resolve under the manager's lock. [`settle_expiry`](SessionManager::settle_expiry)
//! first checks whether a link slipped through, and only otherwise
//! removes the identity, so a link is never handed to a supervisor that
//! has stopped listening.

use std::collections::HashMap;
use std::time::Duration;

use broadside_protocol::{Identity, MatchId};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Result of admitting an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new (or expired and forgotten) identity; now in the lobby.
    Fresh,
    /// The identity was inside its grace window; its link has been handed
    /// to the waiting match.
    Resumed { match_id: MatchId },
}

/// How a grace window ended.
#[derive(Debug)]
pub enum ResumeOutcome<L> {
    /// The identity came back on a new link.
    Reattached(L),
    /// The window elapsed. The identity has been forgotten.
    Expired,
}

/// Registry of every admitted identity.
///
/// `L` is the link type handed over on reconnection (the server uses a
/// shared framed connection).
pub struct SessionManager<L> {
    /// All admitted identities.
    sessions: HashMap<Identity, Session>,

    /// Sending halves for identities in their grace window. An entry
    /// exists exactly while the session is `Detached`.
    pending: HashMap<Identity, oneshot::Sender<L>>,

    config: SessionConfig,
}

impl<L> SessionManager<L> {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            pending: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Admits `identity`, arriving on `link`.
    ///
    /// - Unknown identity → registered in the lobby, [`Admission::Fresh`].
    /// - Detached and inside the grace window → `link` is passed to the
    ///   waiting match, [`Admission::Resumed`].
    /// - Detached but expired → forgotten and re-registered, `Fresh`.
    ///
    /// # Errors
    /// [`SessionError::DuplicateIdentity`] if the identity is in the lobby
    /// or in a live match. The caller should ask for another name.
    pub fn admit(&mut self, identity: &Identity, link: &L) -> Result<Admission, SessionError>
    where
        L: Clone,
    {
        match self.try_resume(identity, link.clone()) {
            Ok(match_id) => Ok(Admission::Resumed { match_id }),
            Err(SessionError::NotFound(_) | SessionError::SessionExpired(_)) => {
                self.sessions.insert(
                    identity.clone(),
                    Session {
                        identity: identity.clone(),
                        state: SessionState::Lobby,
                    },
                );
                tracing::info!(%identity, "identity admitted");
                Ok(Admission::Fresh)
            }
            Err(e) => Err(e),
        }
    }

    /// Hands `link` to the match waiting for `identity`.
    ///
    /// Returns `true` if a pending reconnection existed and was satisfied.
    pub fn on_attach(&mut self, identity: &Identity, link: L) -> bool {
        self.try_resume(identity, link).is_ok()
    }

    fn try_resume(&mut self, identity: &Identity, link: L) -> Result<MatchId, SessionError> {
        let session = self
            .sessions
            .get(identity)
            .ok_or_else(|| SessionError::NotFound(identity.clone()))?;

        let (match_id, since) = match session.state {
            SessionState::Detached { match_id, since } => (match_id, since),
            SessionState::Lobby | SessionState::Playing { .. } => {
                return Err(SessionError::DuplicateIdentity(identity.clone()));
            }
        };

        if since.elapsed() > self.config.reconnect_grace {
            // The supervisor may not have settled yet. Dropping the sender
            // makes its settle step see the window as expired.
            self.forget(identity);
            return Err(SessionError::SessionExpired(identity.clone()));
        }

        let delivered = self
            .pending
            .remove(identity)
            .is_some_and(|tx| tx.send(link).is_ok());
        if !delivered {
            // Nobody is listening anymore; treat as expired.
            self.forget(identity);
            return Err(SessionError::SessionExpired(identity.clone()));
        }

        self.set_state(identity, SessionState::Playing { match_id });
        tracing::info!(%identity, %match_id, "identity reattached within grace window");
        Ok(match_id)
    }

    /// Starts the grace window for an identity whose link failed mid-match.
    ///
    /// Replaces any earlier record for the same identity.
    pub fn on_detach(&mut self, identity: &Identity, match_id: MatchId) -> ReconnectionRecord<L> {
        let (tx, rx) = oneshot::channel();
        let since = Instant::now();

        self.pending.insert(identity.clone(), tx);
        self.sessions.insert(
            identity.clone(),
            Session {
                identity: identity.clone(),
                state: SessionState::Detached { match_id, since },
            },
        );

        tracing::info!(
            %identity,
            %match_id,
            grace_secs = self.config.reconnect_grace.as_secs(),
            "identity detached, grace window started"
        );

        ReconnectionRecord {
            identity: identity.clone(),
            match_id,
            since,
            grace: self.config.reconnect_grace,
            receiver: rx,
        }
    }

    /// Closes a grace window whose deadline has passed.
    ///
    /// If a link arrived at the last moment it is returned. Otherwise the
    /// identity is removed, provided it still belongs to this record.
    pub fn settle_expiry(&mut self, record: ReconnectionRecord<L>) -> ResumeOutcome<L> {
        let ReconnectionRecord {
            identity,
            match_id,
            since,
            mut receiver,
            ..
        } = record;

        if let Ok(link) = receiver.try_recv() {
            return ResumeOutcome::Reattached(link);
        }

        let ours = matches!(
            self.sessions.get(&identity).map(|s| &s.state),
            Some(SessionState::Detached { match_id: m, since: s }) if *m == match_id && *s == since
        );
        if ours {
            self.forget(&identity);
            tracing::info!(%identity, %match_id, "grace window expired, identity forgotten");
        }
        ResumeOutcome::Expired
    }

    /// Records that `identity` has been seated in `match_id`.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the identity is not admitted.
    pub fn mark_playing(&mut self, identity: &Identity, match_id: MatchId) -> Result<(), SessionError> {
        self.transition(identity, SessionState::Playing { match_id })
    }

    /// Records that `identity` is back in the lobby.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the identity is not admitted.
    pub fn return_to_lobby(&mut self, identity: &Identity) -> Result<(), SessionError> {
        self.transition(identity, SessionState::Lobby)
    }

    /// Forgets an identity entirely (it left, or its link died in the lobby).
    pub fn remove(&mut self, identity: &Identity) -> Option<Session> {
        self.pending.remove(identity);
        let removed = self.sessions.remove(identity);
        if removed.is_some() {
            tracing::debug!(%identity, "identity removed");
        }
        removed
    }

    pub fn get(&self, identity: &Identity) -> Option<&Session> {
        self.sessions.get(identity)
    }

    /// Current state of an identity, if admitted.
    pub fn state(&self, identity: &Identity) -> Option<&SessionState> {
        self.sessions.get(identity).map(|s| &s.state)
    }

    /// Number of admitted identities (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn transition(&mut self, identity: &Identity, state: SessionState) -> Result<(), SessionError> {
        if !self.sessions.contains_key(identity) {
            return Err(SessionError::NotFound(identity.clone()));
        }
        self.pending.remove(identity);
        self.set_state(identity, state);
        Ok(())
    }

    fn set_state(&mut self, identity: &Identity, state: SessionState) {
        if let Some(session) = self.sessions.get_mut(identity) {
            session.state = state;
        }
    }

    fn forget(&mut self, identity: &Identity) {
        self.pending.remove(identity);
        self.sessions.remove(identity);
    }
}

// ---------------------------------------------------------------------------
// ReconnectionRecord
// ---------------------------------------------------------------------------

/// An open grace window, owned by the match waiting on it.
///
/// Dropping the record without settling it leaves the identity `Detached`
/// until its next admission, which then treats it as expired.
#[derive(Debug)]
pub struct ReconnectionRecord<L> {
    identity: Identity,
    match_id: MatchId,
    since: Instant,
    grace: Duration,
    receiver: oneshot::Receiver<L>,
}

impl<L> ReconnectionRecord<L> {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// The instant after which reattachment is refused.
    pub fn deadline(&self) -> Instant {
        self.since + self.grace
    }

    /// Waits for the identity to reattach, up to the deadline.
    ///
    /// Returns the new link, or `None` when the deadline passes. On `None`,
    /// call [`SessionManager::settle_expiry`] to close the window.
    pub async fn await_resume(&mut self) -> Option<L> {
        match tokio::time::timeout_at(self.deadline(), &mut self.receiver).await {
            Ok(Ok(link)) => Some(link),
            Ok(Err(_)) | Err(_) => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
