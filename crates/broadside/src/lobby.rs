//! The lobby and the matchmaker.
//!
//! One FIFO queue holds every admitted identity that is not in a match.
//! An entry's [`Role`] only decides how it is greeted; when a match slot
//! frees, the two oldest entries are seated whatever their role.

use std::collections::VecDeque;
use std::sync::Arc;

use broadside_protocol::Identity;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// How an entry was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Expected to be seated in the next match.
    Player,
    /// Arrived while the seats were taken; watches until one frees.
    Spectator,
}

/// One identity waiting in the lobby.
#[derive(Debug, Clone)]
pub struct LobbyEntry<L> {
    pub identity: Identity,
    pub link: L,
    pub role: Role,
}

/// The waiting queue. Not synchronized; see [`Matchmaker`].
#[derive(Debug)]
pub struct Lobby<L> {
    entries: VecDeque<LobbyEntry<L>>,
}

impl<L> Default for Lobby<L> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<L> Lobby<L> {
    pub fn enqueue(&mut self, entry: LobbyEntry<L>) {
        self.entries.push_back(entry);
    }

    /// Removes the two oldest entries, if there are two.
    pub fn take_pair(&mut self) -> Option<[LobbyEntry<L>; 2]> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        Some([first, second])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Everyone who receives spectator broadcasts.
    pub fn watchers(&self) -> Vec<(Identity, L)>
    where
        L: Clone,
    {
        self.entries
            .iter()
            .map(|e| (e.identity.clone(), e.link.clone()))
            .collect()
    }

    /// Drops the given identities and returns the ones that were queued.
    pub fn prune(&mut self, dead: &[Identity]) -> Vec<Identity> {
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            let gone = dead.contains(&e.identity);
            if gone {
                removed.push(e.identity.clone());
            }
            !gone
        });
        removed
    }
}

/// Two seated players and the match slot they occupy.
///
/// The slot is released when the pairing's permit is dropped.
#[derive(Debug)]
pub struct Pairing<L> {
    pub players: [LobbyEntry<L>; 2],
    pub permit: OwnedSemaphorePermit,
}

/// The lobby plus the pool of match slots.
///
/// Role assignment and pairing both happen under the lobby lock, so two
/// admissions racing for the last seat see a consistent queue length and
/// an identity is never handed out twice.
pub struct Matchmaker<L> {
    lobby: Mutex<Lobby<L>>,
    slots: Arc<Semaphore>,
}

impl<L> Matchmaker<L> {
    /// A matchmaker that runs at most `max_matches` matches at once.
    pub fn new(max_matches: usize) -> Self {
        Self {
            lobby: Mutex::new(Lobby::default()),
            slots: Arc::new(Semaphore::new(max_matches.max(1))),
        }
    }

    /// Puts `identity` at the back of the lobby and says how to greet it.
    pub async fn enqueue(&self, identity: Identity, link: L) -> Role {
        let mut lobby = self.lobby.lock().await;
        let role = if lobby.len() < 2 && self.slots.available_permits() > 0 {
            Role::Player
        } else {
            Role::Spectator
        };
        tracing::debug!(%identity, ?role, queued = lobby.len() + 1, "lobby entry added");
        lobby.enqueue(LobbyEntry {
            identity,
            link,
            role,
        });
        role
    }

    /// Seats the two oldest entries if a match slot is free.
    pub async fn next_pair(&self) -> Option<Pairing<L>> {
        let mut lobby = self.lobby.lock().await;
        if lobby.len() < 2 {
            return None;
        }
        let permit = self.slots.clone().try_acquire_owned().ok()?;
        let players = lobby.take_pair()?;
        Some(Pairing { players, permit })
    }

    pub async fn watchers(&self) -> Vec<(Identity, L)>
    where
        L: Clone,
    {
        self.lobby.lock().await.watchers()
    }

    /// Drops the given identities and returns the ones that were still
    /// waiting. Identities seated in the meantime are not returned.
    pub async fn prune(&self, dead: &[Identity]) -> Vec<Identity> {
        if dead.is_empty() {
            return Vec::new();
        }
        self.lobby.lock().await.prune(dead)
    }

    pub async fn len(&self) -> usize {
        self.lobby.lock().await.len()
    }
}
