//! The async match driver.
//!
//! [`run_match`] plays one match over two [`Endpoint`]s until it ends in
//! a win, a forfeit, or a broken link. Each turn:
//!
//! 1. tell the acting side it's their turn and the other side to wait,
//! 2. show the acting side the opponent's grid (hits and misses only),
//! 3. wait, bounded by the turn timeout, for one input line,
//! 4. apply it, save the snapshot, then tell everyone what happened.
//!
//! The snapshot is always saved right after the state changes and before
//! the next turn is announced, so a resumed match never replays or skips
//! a shot.

use broadside_protocol::{Coordinate, Identity};

use crate::{
    ConnectionFault, Endpoint, FleetGrid, MatchConfig, MatchError, MatchHooks, MatchSnapshot,
    MatchState, ShotOutcome, TimeoutPolicy,
};

/// The word that forfeits the match.
const QUIT_COMMAND: &str = "quit";

/// How to begin a run.
#[derive(Debug, Clone)]
pub enum MatchStart<G> {
    /// A new match on freshly placed grids. Both players are greeted.
    Fresh([G; 2]),
    /// Continue from a saved snapshot, without greeting.
    Resume(MatchSnapshot<G>),
}

/// How a run ended. Sides are indices into the `names`/`endpoints` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// `winner` sank every ship.
    Won { winner: usize },
    /// `loser` quit or timed out under [`TimeoutPolicy::ForfeitMatch`].
    Forfeited { loser: usize },
    /// `side`'s link failed. The match is suspended, not decided.
    Interrupted { side: usize },
}

/// The outcome plus the final state of the match.
#[derive(Debug, Clone)]
pub struct MatchReport<G> {
    pub outcome: MatchOutcome,
    pub snapshot: MatchSnapshot<G>,
}

/// Runs one match until it reaches a terminal state or a link fails.
///
/// # Errors
/// Only if a snapshot cannot be saved or the state machine is misused.
/// Connection problems are reported as [`MatchOutcome::Interrupted`].
pub async fn run_match<G, E, H>(
    config: &MatchConfig,
    names: &[Identity; 2],
    endpoints: &[E; 2],
    hooks: &H,
    start: MatchStart<G>,
) -> Result<MatchReport<G>, MatchError>
where
    G: FleetGrid,
    E: Endpoint,
    H: MatchHooks<G>,
{
    let (state, fresh) = match start {
        MatchStart::Fresh(grids) => (MatchState::new(grids), true),
        MatchStart::Resume(snapshot) => (MatchState::from_snapshot(snapshot), false),
    };

    let mut driver = Driver {
        config,
        names,
        endpoints,
        hooks,
        state,
    };

    tracing::info!(a = %names[0], b = %names[1], fresh, turn = driver.state.turn(), "match running");

    let outcome = match driver.run(fresh).await {
        Ok(outcome) => outcome,
        Err(Halt::Interrupted(side)) => {
            tracing::warn!(identity = %names[side], "link failed mid-match, suspending");
            driver.persist().await?;
            MatchOutcome::Interrupted { side }
        }
        Err(Halt::Failed(e)) => return Err(e),
    };

    tracing::info!(a = %names[0], b = %names[1], ?outcome, moves = ?driver.state.moves(), "match run ended");
    Ok(MatchReport {
        outcome,
        snapshot: driver.state.snapshot(),
    })
}

/// Why the driver loop stopped early.
enum Halt {
    Interrupted(usize),
    Failed(MatchError),
}

impl From<MatchError> for Halt {
    fn from(e: MatchError) -> Self {
        Self::Failed(e)
    }
}

/// What the acting player did with their prompt.
enum TurnInput {
    Line(String),
    TimedOut,
}

struct Driver<'a, G, E, H> {
    config: &'a MatchConfig,
    names: &'a [Identity; 2],
    endpoints: &'a [E; 2],
    hooks: &'a H,
    state: MatchState<G>,
}

impl<G, E, H> Driver<'_, G, E, H>
where
    G: FleetGrid,
    E: Endpoint,
    H: MatchHooks<G>,
{
    async fn run(&mut self, fresh: bool) -> Result<MatchOutcome, Halt> {
        if fresh {
            self.persist().await?;
            for side in 0..2 {
                let welcome = format!(
                    "Welcome {}! Game is starting now. Type '{QUIT_COMMAND}' to exit.",
                    self.names[side]
                );
                self.tell(side, &welcome).await?;
            }
            let event = format!("Game started: {} vs {}.", self.names[0], self.names[1]);
            self.broadcast_event(&event).await;
        }

        loop {
            let actor = self.state.begin_turn()?;
            let other = 1 - actor;

            self.tell(actor, "It's your turn! Enter a coordinate to fire at (e.g., B5):")
                .await?;
            let waiting = format!("Waiting for {} to take their turn...", self.names[actor]);
            self.tell(other, &waiting).await?;
            let view = self.state.grid(other).render(false);
            self.show(actor, &view).await?;

            if let Some(outcome) = self.play_turn(actor).await? {
                return Ok(outcome);
            }
        }
    }

    /// The inner exchange of one turn. Returns `Some` when the match ended.
    async fn play_turn(&mut self, actor: usize) -> Result<Option<MatchOutcome>, Halt> {
        let other = 1 - actor;
        let size = self.state.grid(other).size();

        loop {
            let line = match self.read_input(actor).await? {
                TurnInput::Line(line) => line,
                TurnInput::TimedOut => return self.on_timeout(actor).await,
            };
            let input = line.trim();

            if input.eq_ignore_ascii_case(QUIT_COMMAND) {
                return self.on_quit(actor).await.map(Some);
            }

            let target = match Coordinate::parse(input, size) {
                Ok(target) => target,
                Err(e) => {
                    tracing::debug!(identity = %self.names[actor], input, error = %e, "unparseable shot");
                    self.tell(actor, &format!("Invalid input: {e}")).await?;
                    continue;
                }
            };

            let outcome = self.state.fire(target.row, target.col)?;
            tracing::debug!(identity = %self.names[actor], %target, ?outcome, "shot resolved");

            match outcome {
                ShotOutcome::AlreadyShot => {
                    self.tell(actor, "You've already fired at that location. Try again.")
                        .await?;
                }
                ShotOutcome::Miss => {
                    self.persist().await?;
                    self.tell(actor, "MISS!").await?;
                    self.tell(other, &format!("{} missed.", self.names[actor]))
                        .await?;
                    self.broadcast_event(&format!("{} fired at {target}: MISS!", self.names[actor]))
                        .await;
                    return Ok(None);
                }
                ShotOutcome::Hit { sunk } => {
                    self.persist().await?;
                    let announcement = self.announce_hit(actor, sunk.as_deref()).await?;
                    self.broadcast_event(&announcement).await;
                    return Ok(None);
                }
                ShotOutcome::Won { sunk } => {
                    self.finish_won(actor, sunk.as_deref()).await;
                    return Ok(Some(MatchOutcome::Won { winner: actor }));
                }
            }
        }
    }

    async fn read_input(&self, actor: usize) -> Result<TurnInput, Halt> {
        let read = tokio::time::timeout(self.config.turn_timeout, self.endpoints[actor].recv());
        match read.await {
            Ok(Ok(line)) => Ok(TurnInput::Line(line)),
            Ok(Err(fault)) => Err(self.fault(actor, fault)),
            Err(_elapsed) => Ok(TurnInput::TimedOut),
        }
    }

    async fn on_timeout(&mut self, actor: usize) -> Result<Option<MatchOutcome>, Halt> {
        let other = 1 - actor;
        tracing::info!(identity = %self.names[actor], policy = ?self.config.timeout_policy, "turn timed out");

        match self.config.timeout_policy {
            TimeoutPolicy::ForfeitTurn => {
                self.state.forfeit_turn()?;
                self.persist().await?;
                let notice = format!("{} took too long. Turn forfeited.", self.names[actor]);
                self.tell(actor, "Time's up! You took too long to respond.").await?;
                self.tell(other, &notice).await?;
                self.broadcast_event(&notice).await;
                Ok(None)
            }
            TimeoutPolicy::ForfeitMatch => {
                self.notify_quietly(actor, "Time's up! You took too long to respond.").await;
                let outcome = self.on_quit(actor).await?;
                Ok(Some(outcome))
            }
        }
    }

    async fn on_quit(&mut self, actor: usize) -> Result<MatchOutcome, Halt> {
        let other = 1 - actor;
        let loser = self.state.forfeit_match()?;

        self.notify_quietly(actor, "You forfeited the game.").await;
        self.notify_quietly(other, "Opponent forfeited. You win!").await;
        self.show_final_boards().await;
        self.broadcast_event(&format!("Game over. {} forfeited.", self.names[actor]))
            .await;
        Ok(MatchOutcome::Forfeited { loser })
    }

    /// Tells both sides about a non-winning hit; returns the shooter's text.
    async fn announce_hit(&self, actor: usize, sunk: Option<&str>) -> Result<String, Halt> {
        let other = 1 - actor;
        let shooter = &self.names[actor];
        let (to_actor, to_other) = match sunk {
            Some(ship) => (
                format!("HIT! {shooter} sank the {ship}!"),
                format!("{shooter} sank your {ship}!"),
            ),
            None => ("HIT!".to_string(), format!("{shooter} hit one of your ships!")),
        };
        self.tell(actor, &to_actor).await?;
        self.tell(other, &to_other).await?;
        Ok(to_actor)
    }

    async fn finish_won(&self, actor: usize, sunk: Option<&str>) {
        let other = 1 - actor;
        let shooter = &self.names[actor];
        let moves = self.state.moves()[actor];

        if let Some(ship) = sunk {
            self.notify_quietly(actor, &format!("HIT! {shooter} sank the {ship}!"))
                .await;
            self.notify_quietly(other, &format!("{shooter} sank your {ship}!"))
                .await;
        }
        self.notify_quietly(actor, &format!("Congratulations! You sank all ships in {moves} moves."))
            .await;
        self.notify_quietly(other, "All your ships are sunk. You lose.")
            .await;
        self.show_final_boards().await;
        self.broadcast_event(&format!("Game over. {shooter} sank all ships!"))
            .await;
    }

    // -- I/O helpers ---------------------------------------------------------

    async fn tell(&self, side: usize, text: &str) -> Result<(), Halt> {
        self.endpoints[side]
            .send(text)
            .await
            .map_err(|fault| self.fault(side, fault))
    }

    async fn show(&self, side: usize, rows: &[String]) -> Result<(), Halt> {
        self.endpoints[side]
            .send_grid(rows)
            .await
            .map_err(|fault| self.fault(side, fault))
    }

    /// Once the match is decided a dead link changes nothing; the caller
    /// finds out at the play-again prompt.
    async fn notify_quietly(&self, side: usize, text: &str) {
        if let Err(fault) = self.endpoints[side].send(text).await {
            tracing::debug!(identity = %self.names[side], %fault, "final notice not delivered");
        }
    }

    async fn show_final_boards(&self) {
        for side in 0..2 {
            let rows = self.state.grid(1 - side).render(true);
            if let Err(fault) = self.endpoints[side].send_grid(&rows).await {
                tracing::debug!(identity = %self.names[side], %fault, "final board not delivered");
            }
        }
    }

    async fn broadcast_event(&self, event: &str) {
        let boards: Vec<String> = (0..2)
            .map(|side| {
                format!(
                    "{}'s fleet:\n{}",
                    self.names[side],
                    self.state.grid(side).render(false).join("\n")
                )
            })
            .collect();
        self.hooks
            .broadcast(format!("{event}\n\n{}", boards.join("\n\n")))
            .await;
    }

    async fn persist(&self) -> Result<(), MatchError> {
        self.hooks.save_snapshot(&self.state.snapshot()).await
    }

    fn fault(&self, side: usize, fault: ConnectionFault) -> Halt {
        tracing::debug!(identity = %self.names[side], %fault, "endpoint fault");
        Halt::Interrupted(side)
    }
}
