//! The session supervisor: one task per seated pair.
//!
//! It holds the pair's match slot for the whole life of the match,
//! including any grace window it waits through, and drives this loop:
//!
//! ```text
//!   seat ──→ run_match ──→ Won / Forfeited ──→ play again? ──both yes──┐
//!               ↑  │                                │                  │
//!               │  │ Interrupted                    └─ otherwise → part│
//!               │  ▼                                                   │
//!               │ wait for reconnect ──expired──→ part                 │
//!               │  │                                                   │
//!               └──┴─ resumed (from the saved snapshot) ←──────────────┘
//! ```
//!
//! Resumption re-enters the loop rather than recursing, so any number of
//! reconnections runs in constant stack depth. Every exit path releases
//! the slot, clears the pair's snapshots, and settles both identities.

use std::sync::Arc;
use std::time::Duration;

use broadside_match::{
    MatchError, MatchHooks, MatchOutcome, MatchSnapshot, MatchStart, RulesEngine, run_match,
};
use broadside_protocol::{Identity, MatchId};
use broadside_session::ResumeOutcome;

use crate::lobby::Pairing;
use crate::server::{Link, ServerState};

const REPLAY_PROMPT: &str = "[INFO] Game over. Do you want to play again? (yes/no)";
const RETURN_TO_LOBBY: &str = "[INFO] Game ended. Returning to lobby.";
const GOODBYE: &str = "[INFO] Goodbye!";
const RECONNECTED: &str = "[INFO] Reconnected! Waiting for game to resume...";

/// What happens to one side once the supervisor lets go of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Farewell {
    /// Back into the lobby queue.
    Lobby,
    /// Said no to a rematch: say goodbye and close.
    Leave,
    /// Link lost with no grace window: forget and close.
    Dropped,
    /// Grace window expired; the session layer already forgot it.
    Expired,
}

/// How a suspended match continues.
enum Recovery<G> {
    Resume(MatchSnapshot<G>),
    Ended([Farewell; 2]),
}

/// Runs one seated pair until both identities have left the match.
pub(crate) async fn supervise<R: RulesEngine>(
    state: Arc<ServerState<R>>,
    pairing: Pairing<Link>,
    match_id: MatchId,
) {
    let Pairing { players, permit } = pairing;
    let [first, second] = players;
    let names = [first.identity, second.identity];
    let mut links = [first.link, second.link];

    seat(&state, &names, &links, match_id).await;
    let farewells = play(&state, &names, &mut links, match_id).await;

    drop(permit);
    state.snapshots.clear(&names[0], &names[1]).await;
    tracing::info!(%match_id, ?farewells, "match released");

    let [first_link, second_link] = links;
    let [first_name, second_name] = names;
    part(&state, first_name, first_link, farewells[0]).await;
    part(&state, second_name, second_link, farewells[1]).await;

    state.launch.notify_one();
}

async fn seat<R: RulesEngine>(
    state: &ServerState<R>,
    names: &[Identity; 2],
    links: &[Link; 2],
    match_id: MatchId,
) {
    {
        let mut sessions = state.sessions.lock().await;
        for name in names {
            if let Err(e) = sessions.mark_playing(name, match_id) {
                tracing::warn!(identity = %name, error = %e, "seated identity has no session");
            }
        }
    }

    for (name, link) in names.iter().zip(links) {
        let stale = link.discard_pending().await;
        if stale > 0 {
            tracing::debug!(identity = %name, stale, "dropped lobby input");
        }
    }

    let announcement = format!(
        "[INFO] {} and {} will be playing the next game!",
        names[0], names[1]
    );
    for link in links {
        notify(link, &announcement).await;
    }
}

/// Plays matches (and rematches) until the pair splits up.
async fn play<R: RulesEngine>(
    state: &ServerState<R>,
    names: &[Identity; 2],
    links: &mut [Link; 2],
    match_id: MatchId,
) -> [Farewell; 2] {
    let hooks = ServerHooks { state, names };
    let mut start = MatchStart::Fresh([state.rules.new_grid(), state.rules.new_grid()]);

    loop {
        let report = match run_match(&state.match_config, names, &*links, &hooks, start).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(%match_id, error = %e, "match failed");
                return [Farewell::Lobby; 2];
            }
        };

        match report.outcome {
            MatchOutcome::Won { .. } | MatchOutcome::Forfeited { .. } => {
                state.snapshots.clear(&names[0], &names[1]).await;
                let answers = ask_replay(state.match_config.replay_prompt_timeout, links).await;
                if answers == [true, true] {
                    tracing::info!(%match_id, "rematch");
                    start = MatchStart::Fresh([state.rules.new_grid(), state.rules.new_grid()]);
                    continue;
                }
                return answers.map(|yes| if yes { Farewell::Lobby } else { Farewell::Leave });
            }
            MatchOutcome::Interrupted { side } => {
                match recover(state, names, links, side, match_id, report.snapshot).await {
                    Recovery::Resume(snapshot) => start = MatchStart::Resume(snapshot),
                    Recovery::Ended(farewells) => return farewells,
                }
            }
        }
    }
}

/// Waits out the grace window for `side` and decides how to go on.
async fn recover<R: RulesEngine>(
    state: &ServerState<R>,
    names: &[Identity; 2],
    links: &mut [Link; 2],
    side: usize,
    match_id: MatchId,
    last: MatchSnapshot<R::Grid>,
) -> Recovery<R::Grid> {
    let other = 1 - side;
    let name = &names[side];
    let grace = state.sessions.lock().await.config().reconnect_grace;

    let mut record = state.sessions.lock().await.on_detach(name, match_id);
    links[side].close().await;

    let notice = format!(
        "[INFO] {name} disconnected. Waiting up to {}s for them to reconnect...",
        grace.as_secs()
    );
    let unreachable = if links[other].is_peer_closed() {
        Some("peer closed".to_string())
    } else {
        links[other].send(&notice).await.err().map(|e| e.to_string())
    };
    if let Some(error) = unreachable {
        tracing::warn!(%match_id, %error, "both sides unreachable, dissolving match");
        return Recovery::Ended([Farewell::Dropped; 2]);
    }
    tracing::info!(
        match_id = %record.match_id(),
        identity = %record.identity(),
        grace_secs = grace.as_secs(),
        "waiting for reconnect"
    );

    let resumed = match record.await_resume().await {
        Some(link) => Some(link),
        None => match state.sessions.lock().await.settle_expiry(record) {
            ResumeOutcome::Reattached(link) => Some(link),
            ResumeOutcome::Expired => None,
        },
    };

    let Some(link) = resumed else {
        tracing::info!(%match_id, identity = %name, "did not reconnect in time");
        let verdict = format!("[INFO] {name} failed to reconnect in time. You win!");
        let winner = if links[other].is_peer_closed() {
            Farewell::Dropped
        } else {
            match links[other].send(&verdict).await {
                Ok(()) => Farewell::Lobby,
                Err(_) => Farewell::Dropped,
            }
        };
        state
            .broadcast(&format!(
                "{name} failed to reconnect in time. {} wins by default.",
                names[other]
            ))
            .await;

        let mut farewells = [Farewell::Expired; 2];
        farewells[other] = winner;
        return Recovery::Ended(farewells);
    };

    links[side] = link;
    links[other].discard_pending().await;

    let snapshot = match state.snapshots.load(name).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => last,
        Err(e) => {
            tracing::warn!(%match_id, error = %e, "saved snapshot unreadable, using last known state");
            last
        }
    };

    notify(&links[side], RECONNECTED).await;
    let resumed = format!("[INFO] {name} reconnected. Resuming game.");
    for link in links.iter() {
        notify(link, &resumed).await;
    }
    tracing::info!(%match_id, identity = %name, "resuming match");
    Recovery::Resume(snapshot)
}

/// Asks both players about a rematch at once. Silence counts as no.
async fn ask_replay(wait: Duration, links: &[Link; 2]) -> [bool; 2] {
    let (first, second) = tokio::join!(ask(&links[0], wait), ask(&links[1], wait));
    [first, second]
}

async fn ask(link: &Link, wait: Duration) -> bool {
    if link.send(REPLAY_PROMPT).await.is_err() {
        return false;
    }
    match tokio::time::timeout(wait, link.recv()).await {
        Ok(Ok(Some(answer))) => answer.trim().eq_ignore_ascii_case("yes"),
        _ => false,
    }
}

/// Lets go of one side.
async fn part<R: RulesEngine>(
    state: &ServerState<R>,
    identity: Identity,
    link: Link,
    farewell: Farewell,
) {
    match farewell {
        Farewell::Lobby => {
            if state.sessions.lock().await.return_to_lobby(&identity).is_err() {
                link.close().await;
                return;
            }
            notify(&link, RETURN_TO_LOBBY).await;
            state.enter_lobby(identity, link).await;
        }
        Farewell::Leave => {
            notify(&link, GOODBYE).await;
            state.sessions.lock().await.remove(&identity);
            link.close().await;
        }
        Farewell::Dropped => {
            state.sessions.lock().await.remove(&identity);
            link.close().await;
        }
        Farewell::Expired => link.close().await,
    }
}

/// Best-effort send; the match notices dead links on its own.
async fn notify(link: &Link, text: &str) {
    if let Err(e) = link.send(text).await {
        tracing::debug!(id = %link.id(), error = %e, "notice not delivered");
    }
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Connects a running match to the snapshot store and the lobby.
struct ServerHooks<'a, R: RulesEngine> {
    state: &'a ServerState<R>,
    names: &'a [Identity; 2],
}

impl<R: RulesEngine> MatchHooks<R::Grid> for ServerHooks<'_, R> {
    async fn save_snapshot(&self, snapshot: &MatchSnapshot<R::Grid>) -> Result<(), MatchError> {
        self.state
            .snapshots
            .save(&self.names[0], &self.names[1], snapshot)
            .await
    }

    async fn broadcast(&self, text: String) {
        self.state.broadcast(&text).await;
    }
}
