//! Driver tests over scripted in-memory endpoints.
//!
//! Both players use the standard layout: Carrier A1-A5, Battleship C1-C4,
//! Cruiser E1-E3, Submarine G1-G3, Destroyer I1-I2. Rows B, D, F, H and J
//! are open water.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use broadside_match::{
    ConnectionFault, Endpoint, MatchConfig, MatchError, MatchHooks, MatchOutcome, MatchSnapshot,
    MatchStart, RulesEngine, TimeoutPolicy, run_match,
};
use broadside_protocol::Identity;
use broadside_rules::{Board, ClassicFleet, standard_layout};

// -- Test doubles -------------------------------------------------------------

enum Input {
    Line(String),
    Fault,
}

/// Replays a fixed list of inputs, then goes silent forever.
#[derive(Default)]
struct ScriptedEndpoint {
    inputs: Mutex<VecDeque<Input>>,
    sent: Mutex<Vec<String>>,
    grids: Mutex<Vec<Vec<String>>>,
    broken: AtomicBool,
}

impl ScriptedEndpoint {
    fn new(lines: &[&str]) -> Self {
        let endpoint = Self::default();
        endpoint
            .inputs
            .lock()
            .unwrap()
            .extend(lines.iter().map(|l| Input::Line(l.to_string())));
        endpoint
    }

    fn then_fault(self) -> Self {
        self.inputs.lock().unwrap().push_back(Input::Fault);
        self
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn grids(&self) -> Vec<Vec<String>> {
        self.grids.lock().unwrap().clone()
    }

    fn received(&self, text: &str) -> bool {
        self.sent().iter().any(|m| m == text)
    }

    fn count(&self, prefix: &str) -> usize {
        self.sent().iter().filter(|m| m.starts_with(prefix)).count()
    }
}

impl Endpoint for ScriptedEndpoint {
    async fn send(&self, text: &str) -> Result<(), ConnectionFault> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ConnectionFault("closed".into()));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_grid(&self, rows: &[String]) -> Result<(), ConnectionFault> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(ConnectionFault("closed".into()));
        }
        self.grids.lock().unwrap().push(rows.to_vec());
        Ok(())
    }

    async fn recv(&self) -> Result<String, ConnectionFault> {
        let next = self.inputs.lock().unwrap().pop_front();
        match next {
            Some(Input::Line(line)) => Ok(line),
            Some(Input::Fault) => {
                self.broken.store(true, Ordering::SeqCst);
                Err(ConnectionFault("reset by peer".into()))
            }
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
struct RecordingHooks {
    snapshots: Mutex<Vec<MatchSnapshot<Board>>>,
    broadcasts: Mutex<Vec<String>>,
}

impl RecordingHooks {
    fn last_snapshot(&self) -> MatchSnapshot<Board> {
        self.snapshots.lock().unwrap().last().cloned().unwrap()
    }
}

impl MatchHooks<Board> for RecordingHooks {
    async fn save_snapshot(&self, snapshot: &MatchSnapshot<Board>) -> Result<(), MatchError> {
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }

    async fn broadcast(&self, text: String) {
        self.broadcasts.lock().unwrap().push(text);
    }
}

// -- Helpers ------------------------------------------------------------------

fn names() -> [Identity; 2] {
    [Identity::new("alice"), Identity::new("bob")]
}

fn fresh_start() -> MatchStart<Board> {
    let rules = ClassicFleet::fixed(&standard_layout()).unwrap();
    MatchStart::Fresh([rules.new_grid(), rules.new_grid()])
}

const FLEET_CELLS: [&str; 17] = [
    "A1", "A2", "A3", "A4", "A5", "C1", "C2", "C3", "C4", "E1", "E2", "E3", "G1", "G2", "G3",
    "I1", "I2",
];

const WATER_CELLS: [&str; 17] = [
    "B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B9", "B10", "D1", "D2", "D3", "D4", "D5",
    "D6", "D7",
];

// -- Tests --------------------------------------------------------------------

#[tokio::test]
async fn test_run_match_full_game_ends_won_for_first_player() {
    let alice = ScriptedEndpoint::new(&FLEET_CELLS);
    let bob = ScriptedEndpoint::new(&WATER_CELLS);
    let hooks = RecordingHooks::default();
    let endpoints = [alice, bob];

    let report = run_match(&MatchConfig::default(), &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    let [alice, bob] = &endpoints;
    assert_eq!(report.outcome, MatchOutcome::Won { winner: 0 });
    assert_eq!(report.snapshot.moves, [17, 16]);

    assert!(alice.received("Welcome alice! Game is starting now. Type 'quit' to exit."));
    assert!(bob.received("Welcome bob! Game is starting now. Type 'quit' to exit."));
    assert!(alice.received("HIT!"));
    assert!(alice.received("HIT! alice sank the Carrier!"));
    assert!(bob.received("alice sank your Carrier!"));
    assert!(bob.received("alice hit one of your ships!"));
    assert!(alice.received("bob missed."));
    assert!(bob.received("MISS!"));
    assert!(alice.received("HIT! alice sank the Destroyer!"));
    assert!(alice.received("Congratulations! You sank all ships in 17 moves."));
    assert!(bob.received("All your ships are sunk. You lose."));

    // One initial save plus one per non-winning shot (16 + 16).
    assert_eq!(hooks.snapshots.lock().unwrap().len(), 33);

    let broadcasts = hooks.broadcasts.lock().unwrap().clone();
    assert!(broadcasts[0].starts_with("Game started: alice vs bob."));
    assert!(broadcasts[0].contains("alice's fleet:"));
    assert!(broadcasts[0].contains("bob's fleet:"));
    assert!(broadcasts.last().unwrap().starts_with("Game over. alice sank all ships!"));
}

#[tokio::test]
async fn test_run_match_turn_view_hides_unsunk_ships() {
    let alice = ScriptedEndpoint::new(&["quit"]);
    let bob = ScriptedEndpoint::new(&[]);
    let hooks = RecordingHooks::default();
    let endpoints = [alice, bob];

    run_match(&MatchConfig::default(), &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    let first_view = &endpoints[0].grids()[0];
    assert!(first_view.iter().skip(1).all(|row| !row.contains('S')));
    // Final boards reveal the opponent's fleet.
    let final_view = endpoints[0].grids().last().cloned().unwrap();
    assert!(final_view.iter().any(|row| row.contains('S')));
}

#[tokio::test]
async fn test_run_match_invalid_and_repeat_shots_keep_turn() {
    let alice = ScriptedEndpoint::new(&["A1", "a1", "Z9", "hello", "", "B1"]);
    let bob = ScriptedEndpoint::new(&["B1", "quit"]);
    let hooks = RecordingHooks::default();
    let endpoints = [alice, bob];

    let report = run_match(&MatchConfig::default(), &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    let [alice, bob] = &endpoints;
    assert_eq!(report.outcome, MatchOutcome::Forfeited { loser: 1 });
    assert_eq!(report.snapshot.moves, [2, 1]);

    assert!(alice.received("You've already fired at that location. Try again."));
    assert_eq!(alice.count("Invalid input: "), 3);
    assert_eq!(alice.count("It's your turn!"), 2);
    assert_eq!(bob.count("It's your turn!"), 2);
    assert_eq!(bob.count("Invalid input: "), 0);

    assert!(bob.received("You forfeited the game."));
    assert!(alice.received("Opponent forfeited. You win!"));
}

#[tokio::test(start_paused = true)]
async fn test_run_match_timeout_forfeits_only_the_turn() {
    let alice = ScriptedEndpoint::new(&[]);
    let bob = ScriptedEndpoint::new(&["quit"]);
    let hooks = RecordingHooks::default();
    let endpoints = [alice, bob];

    let report = run_match(&MatchConfig::default(), &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    let [alice, bob] = &endpoints;
    assert_eq!(report.outcome, MatchOutcome::Forfeited { loser: 1 });
    assert_eq!(report.snapshot.moves, [0, 0]);
    assert!(alice.received("Time's up! You took too long to respond."));
    assert!(bob.received("alice took too long. Turn forfeited."));

    // The forfeited turn was persisted with the turn already flipped.
    let snapshots = hooks.snapshots.lock().unwrap().clone();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[1].turn, 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_match_timeout_can_forfeit_the_match() {
    let config = MatchConfig {
        timeout_policy: TimeoutPolicy::ForfeitMatch,
        ..MatchConfig::default()
    };
    let endpoints = [ScriptedEndpoint::new(&[]), ScriptedEndpoint::new(&[])];
    let hooks = RecordingHooks::default();

    let report = run_match(&config, &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    let [alice, bob] = &endpoints;
    assert_eq!(report.outcome, MatchOutcome::Forfeited { loser: 0 });
    assert!(alice.received("Time's up! You took too long to respond."));
    assert!(alice.received("You forfeited the game."));
    assert!(bob.received("Opponent forfeited. You win!"));
}

#[tokio::test]
async fn test_run_match_fault_interrupts_and_resume_matches_snapshot() {
    let alice = ScriptedEndpoint::new(&["A1"]).then_fault();
    let bob = ScriptedEndpoint::new(&["B1"]);
    let hooks = RecordingHooks::default();
    let endpoints = [alice, bob];

    let report = run_match(&MatchConfig::default(), &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    assert_eq!(report.outcome, MatchOutcome::Interrupted { side: 0 });
    let saved = hooks.last_snapshot();
    assert_eq!(report.snapshot, saved);
    assert_eq!(saved.turn, 0);
    assert_eq!(saved.moves, [1, 1]);

    // Alice comes back on a new endpoint and picks up exactly where she was.
    let resumed = [ScriptedEndpoint::new(&["quit"]), ScriptedEndpoint::new(&[])];
    let report = run_match(
        &MatchConfig::default(),
        &names(),
        &resumed,
        &hooks,
        MatchStart::Resume(saved.clone()),
    )
    .await
    .unwrap();

    let [alice2, bob2] = &resumed;
    assert_eq!(alice2.count("Welcome"), 0);
    assert_eq!(alice2.sent()[0], "It's your turn! Enter a coordinate to fire at (e.g., B5):");
    assert!(bob2.received("Waiting for alice to take their turn..."));
    // Her earlier hit on A1 is still on bob's grid.
    assert!(alice2.grids()[0][1].starts_with("A  X"));

    assert_eq!(report.outcome, MatchOutcome::Forfeited { loser: 0 });
    assert_eq!(report.snapshot.grids, saved.grids);
    assert_eq!(report.snapshot.moves, saved.moves);
}

#[tokio::test]
async fn test_run_match_opponent_fault_names_the_right_side() {
    let alice = ScriptedEndpoint::new(&["B1"]);
    let bob = ScriptedEndpoint::new(&[]).then_fault();
    let hooks = RecordingHooks::default();
    let endpoints = [alice, bob];

    let report = run_match(&MatchConfig::default(), &names(), &endpoints, &hooks, fresh_start())
        .await
        .unwrap();

    assert_eq!(report.outcome, MatchOutcome::Interrupted { side: 1 });
    assert_eq!(report.snapshot.turn, 1);
}
