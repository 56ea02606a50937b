//! `BroadsideServer` builder, shared state, and the accept loop.
//!
//! The server ties the layers together: transport → framed link →
//! session registry → lobby → match supervisor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use broadside_match::{MatchConfig, RulesEngine, SnapshotStore};
use broadside_protocol::{AesCtrCipher, DEV_KEY, Identity, MatchId};
use broadside_session::{SessionConfig, SessionManager};
use broadside_transport::{TcpLineTransport, Transport};
use tokio::sync::{Mutex, Notify};

use crate::BroadsideError;
use crate::handler::handle_connection;
use crate::link::{FramedLink, WireCodec};
use crate::lobby::{Matchmaker, Role};
use crate::supervisor::supervise;

const LOBBY_GREETING: &str = "[INFO] You are in the lobby";
const SPECTATOR_NOTICE: &str = "[INFO] Game is full. You are now a spectator.";
const SPECTATOR_GREETING: &str =
    "[SPECTATOR] You are in the lobby. Waiting for your turn...";
const SPECTATOR_UPDATE: &str = "[SPECTATOR] Game state update:";

/// A client link as the server shares it between tasks.
pub(crate) type Link = Arc<FramedLink>;

/// Shared server state passed to every handler and supervisor task.
///
/// Lock order: the lobby lock (inside [`Matchmaker`]) and the sessions
/// lock are never held at the same time.
pub(crate) struct ServerState<R: RulesEngine> {
    pub(crate) sessions: Mutex<SessionManager<Link>>,
    pub(crate) matchmaker: Matchmaker<Link>,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) codec: Arc<WireCodec>,
    pub(crate) rules: R,
    pub(crate) match_config: MatchConfig,
    /// Wakes the launcher whenever a pair might be ready.
    pub(crate) launch: Notify,
    next_match_id: AtomicU64,
}

impl<R: RulesEngine> ServerState<R> {
    pub(crate) fn allocate_match_id(&self) -> MatchId {
        MatchId(self.next_match_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Queues an admitted identity, greets it by role, and pokes the
    /// launcher.
    pub(crate) async fn enter_lobby(&self, identity: Identity, link: Link) {
        let role = self.matchmaker.enqueue(identity.clone(), link.clone()).await;
        tracing::info!(%identity, ?role, "entered lobby");

        let greeting: &[&str] = match role {
            Role::Player => &[LOBBY_GREETING],
            Role::Spectator => &[SPECTATOR_NOTICE, SPECTATOR_GREETING],
        };
        for line in greeting {
            if let Err(e) = link.send(line).await {
                tracing::debug!(%identity, error = %e, "lobby greeting failed");
                self.forget(std::slice::from_ref(&identity)).await;
                link.close().await;
                return;
            }
        }
        self.launch.notify_one();
    }

    /// Sends a read-only update to every lobby entry and prunes the ones
    /// whose link is gone. Never fails.
    pub(crate) async fn broadcast(&self, text: &str) {
        let message = format!("{SPECTATOR_UPDATE}\n{text}");
        let mut dead = Vec::new();

        for (identity, link) in self.matchmaker.watchers().await {
            // A write to a half-closed socket can still succeed, so check
            // the read side too.
            let gone = if link.is_peer_closed() {
                tracing::debug!(%identity, "spectator hung up");
                true
            } else if let Err(e) = link.send(&message).await {
                tracing::debug!(%identity, error = %e, "spectator send failed");
                true
            } else {
                false
            };
            if gone {
                link.close().await;
                dead.push(identity);
            }
        }

        if !dead.is_empty() {
            tracing::info!(pruned = dead.len(), "dropped unreachable lobby entries");
            self.forget(&dead).await;
        }
    }

    /// Forgets lobby entries. Identities that were seated in the meantime
    /// are left alone.
    async fn forget(&self, dead: &[Identity]) {
        let removed = self.matchmaker.prune(dead).await;
        let mut sessions = self.sessions.lock().await;
        for identity in &removed {
            sessions.remove(identity);
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Broadside server.
///
/// # Example
///
/// ```rust,ignore
/// use broadside::prelude::*;
///
/// let server = BroadsideServer::builder()
///     .bind("0.0.0.0:5000")
///     .max_concurrent_matches(4)
///     .build(ClassicFleet::random())
///     .await?;
/// server.run().await
/// ```
pub struct BroadsideServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    match_config: MatchConfig,
    max_concurrent_matches: usize,
    cipher_key: [u8; 32],
}

impl BroadsideServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            session_config: SessionConfig::default(),
            match_config: MatchConfig::default(),
            max_concurrent_matches: 1,
            cipher_key: DEV_KEY,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the reconnection settings.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets turn timeouts and the timeout policy.
    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.match_config = config;
        self
    }

    /// How many matches may run at once. Values below 1 are raised to 1.
    pub fn max_concurrent_matches(mut self, n: usize) -> Self {
        self.max_concurrent_matches = n.max(1);
        self
    }

    /// Sets the AES-256 key shared with clients.
    pub fn cipher_key(mut self, key: [u8; 32]) -> Self {
        self.cipher_key = key;
        self
    }

    /// Binds the listener and builds the server around `rules`.
    pub async fn build<R: RulesEngine>(self, rules: R) -> Result<BroadsideServer<R>, BroadsideError> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            matchmaker: Matchmaker::new(self.max_concurrent_matches),
            snapshots: SnapshotStore::new(),
            codec: Arc::new(WireCodec::new(AesCtrCipher::new(self.cipher_key))),
            rules,
            match_config: self.match_config,
            launch: Notify::new(),
            next_match_id: AtomicU64::new(1),
        });

        tracing::info!(
            addr = %self.bind_addr,
            max_matches = self.max_concurrent_matches,
            "server built"
        );
        Ok(BroadsideServer { transport, state })
    }
}

impl Default for BroadsideServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Broadside server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BroadsideServer<R: RulesEngine> {
    transport: TcpLineTransport,
    state: Arc<ServerState<R>>,
}

impl<R: RulesEngine> BroadsideServer<R> {
    /// Creates a new builder.
    pub fn builder() -> BroadsideServerBuilder {
        BroadsideServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process ends.
    ///
    /// Each connection gets its own admission task. A single launcher
    /// task turns lobby pairs into supervised matches.
    pub async fn run(mut self) -> Result<(), BroadsideError> {
        tracing::info!("Broadside server running");
        tokio::spawn(launch_matches(Arc::clone(&self.state)));

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Seats every ready pair each time it is woken.
async fn launch_matches<R: RulesEngine>(state: Arc<ServerState<R>>) {
    loop {
        state.launch.notified().await;
        while let Some(pairing) = state.matchmaker.next_pair().await {
            let match_id = state.allocate_match_id();
            tracing::info!(
                %match_id,
                a = %pairing.players[0].identity,
                b = %pairing.players[1].identity,
                "pair seated"
            );
            tokio::spawn(supervise(Arc::clone(&state), pairing, match_id));
        }
        let waiting = state.matchmaker.len().await;
        tracing::debug!(waiting, "lobby settled");
    }
}
