//! The pure turn state machine.
//!
//! ```text
//!                      fire: already shot
//!                      ┌──────────────┐
//!                      ▼              │
//!   begin_turn ──→ AwaitingShot(t) ───┴─→ Resolving ──→ TurnComplete ──→ begin_turn ...
//!                      │  │                   │        (turn flipped,
//!                      │  │ timeout           │         snapshot due)
//!                      │  └───────────────────┼──────→ TurnComplete
//!                      │ quit                 │ last ship sunk
//!                      ▼                      ▼
//!                Forfeited(t)              Won(t)
//! ```
//!
//! No I/O happens here, so the turn rules can be tested without any
//! endpoints. The driver calls into this type and does the talking.

use crate::{FireResult, FleetGrid, MatchError, MatchSnapshot};

/// Where a match is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Waiting for a shot from this side.
    AwaitingShot(usize),
    /// A shot is being applied to the target grid.
    Resolving,
    /// The turn has ended and the turn index has flipped. The snapshot
    /// must be written before [`MatchState::begin_turn`] is called.
    TurnComplete,
    /// This side sank the opponent's whole fleet.
    Won(usize),
    /// This side gave up (quit, or timed out under the match policy).
    Forfeited(usize),
}

impl MatchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won(_) | Self::Forfeited(_))
    }
}

/// What a resolved shot means for the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Same player shoots again; nothing changed.
    AlreadyShot,
    /// Turn passed to the opponent.
    Miss,
    /// Turn passed to the opponent. `sunk` names a ship this shot finished.
    Hit { sunk: Option<String> },
    /// The opponent's last ship went down. The match is over.
    Won { sunk: Option<String> },
}

/// Grids, turn index, and move counters for one match.
///
/// `grids[i]` is side `i`'s own fleet; side `i` fires at `grids[1 - i]`.
#[derive(Debug, Clone)]
pub struct MatchState<G> {
    grids: [G; 2],
    turn: usize,
    moves: [u32; 2],
    phase: MatchPhase,
}

impl<G: FleetGrid> MatchState<G> {
    /// A new match; side 0 shoots first.
    pub fn new(grids: [G; 2]) -> Self {
        Self {
            grids,
            turn: 0,
            moves: [0, 0],
            phase: MatchPhase::AwaitingShot(0),
        }
    }

    /// Rebuilds a match exactly as it was when `snapshot` was taken.
    pub fn from_snapshot(snapshot: MatchSnapshot<G>) -> Self {
        let turn = snapshot.turn.min(1);
        Self {
            grids: snapshot.grids,
            turn,
            moves: snapshot.moves,
            phase: MatchPhase::AwaitingShot(turn),
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot<G> {
        MatchSnapshot {
            grids: self.grids.clone(),
            turn: self.turn,
            moves: self.moves,
        }
    }

    /// The side whose turn it is (or was, in a terminal phase).
    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn moves(&self) -> [u32; 2] {
        self.moves
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Side `side`'s own grid.
    pub fn grid(&self, side: usize) -> &G {
        &self.grids[side]
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Moves from `TurnComplete` into the next `AwaitingShot`.
    ///
    /// Returns the acting side. A no-op if already awaiting a shot.
    pub fn begin_turn(&mut self) -> Result<usize, MatchError> {
        match self.phase {
            MatchPhase::TurnComplete | MatchPhase::AwaitingShot(_) => {
                self.phase = MatchPhase::AwaitingShot(self.turn);
                Ok(self.turn)
            }
            other => Err(invalid("begin a turn", other)),
        }
    }

    /// Applies the acting side's shot at the opponent's grid.
    ///
    /// Hits and misses count as moves and end the turn. An already-shot
    /// cell changes nothing. A winning hit ends the match without flipping
    /// the turn.
    pub fn fire(&mut self, row: usize, col: usize) -> Result<ShotOutcome, MatchError> {
        let shooter = self.awaiting("fire")?;
        let target = 1 - shooter;
        self.phase = MatchPhase::Resolving;

        let outcome = match self.grids[target].fire(row, col) {
            FireResult::AlreadyShot => {
                self.phase = MatchPhase::AwaitingShot(shooter);
                return Ok(ShotOutcome::AlreadyShot);
            }
            FireResult::Miss => ShotOutcome::Miss,
            FireResult::Hit { sunk } if self.grids[target].all_sunk() => {
                self.moves[shooter] += 1;
                self.phase = MatchPhase::Won(shooter);
                return Ok(ShotOutcome::Won { sunk });
            }
            FireResult::Hit { sunk } => ShotOutcome::Hit { sunk },
        };

        self.moves[shooter] += 1;
        self.complete_turn();
        Ok(outcome)
    }

    /// The acting side ran out of time: the turn passes, no move counted.
    pub fn forfeit_turn(&mut self) -> Result<(), MatchError> {
        self.awaiting("forfeit a turn")?;
        self.complete_turn();
        Ok(())
    }

    /// The acting side gives up the match.
    pub fn forfeit_match(&mut self) -> Result<usize, MatchError> {
        let loser = self.awaiting("forfeit the match")?;
        self.phase = MatchPhase::Forfeited(loser);
        Ok(loser)
    }

    fn awaiting(&self, action: &str) -> Result<usize, MatchError> {
        match self.phase {
            MatchPhase::AwaitingShot(side) => Ok(side),
            other => Err(invalid(action, other)),
        }
    }

    fn complete_turn(&mut self) {
        self.turn = 1 - self.turn;
        self.phase = MatchPhase::TurnComplete;
    }
}

fn invalid(action: &str, phase: MatchPhase) -> MatchError {
    MatchError::InvalidState(format!("cannot {action} while {phase:?}"))
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    /// A one-row grid: `true` cells hold a one-cell ship named after its column.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct StripGrid {
        ships: Vec<bool>,
        shot: Vec<bool>,
    }

    impl StripGrid {
        fn new(ships: &[bool]) -> Self {
            Self {
                ships: ships.to_vec(),
                shot: vec![false; ships.len()],
            }
        }
    }

    impl FleetGrid for StripGrid {
        fn size(&self) -> usize {
            self.ships.len()
        }

        fn fire(&mut self, _row: usize, col: usize) -> FireResult {
            if self.shot[col] {
                return FireResult::AlreadyShot;
            }
            self.shot[col] = true;
            if self.ships[col] {
                FireResult::Hit {
                    sunk: Some(format!("boat{col}")),
                }
            } else {
                FireResult::Miss
            }
        }

        fn all_sunk(&self) -> bool {
            self.ships.iter().zip(&self.shot).all(|(ship, shot)| !ship || *shot)
        }

        fn render(&self, _reveal_ships: bool) -> Vec<String> {
            vec![String::new()]
        }
    }

    fn state() -> MatchState<StripGrid> {
        MatchState::new([
            StripGrid::new(&[true, true, false, false]),
            StripGrid::new(&[true, true, false, false]),
        ])
    }

    #[test]
    fn test_new_starts_with_side_zero() {
        let state = state();
        assert_eq!(state.turn(), 0);
        assert_eq!(state.phase(), MatchPhase::AwaitingShot(0));
        assert_eq!(state.moves(), [0, 0]);
    }

    #[test]
    fn test_fire_miss_flips_turn_and_counts_move() {
        let mut state = state();

        assert_eq!(state.fire(0, 3).unwrap(), ShotOutcome::Miss);
        assert_eq!(state.turn(), 1);
        assert_eq!(state.moves(), [1, 0]);
        assert_eq!(state.phase(), MatchPhase::TurnComplete);
    }

    #[test]
    fn test_fire_hit_flips_turn() {
        let mut state = state();

        let outcome = state.fire(0, 0).unwrap();
        assert_eq!(
            outcome,
            ShotOutcome::Hit {
                sunk: Some("boat0".into())
            }
        );
        assert_eq!(state.turn(), 1);
    }

    #[test]
    fn test_fire_targets_opponent_grid() {
        let mut state = state();
        state.fire(0, 2).unwrap();

        assert_eq!(state.grid(1).shot, vec![false, false, true, false]);
        assert_eq!(state.grid(0).shot, vec![false; 4]);
    }

    #[test]
    fn test_fire_already_shot_keeps_turn_and_moves() {
        let mut state = state();
        state.fire(0, 2).unwrap(); // side 0 misses
        state.begin_turn().unwrap();
        state.fire(0, 2).unwrap(); // side 1 misses
        state.begin_turn().unwrap();

        assert_eq!(state.fire(0, 2).unwrap(), ShotOutcome::AlreadyShot);
        assert_eq!(state.turn(), 0);
        assert_eq!(state.moves(), [1, 1]);
        assert_eq!(state.phase(), MatchPhase::AwaitingShot(0));
    }

    #[test]
    fn test_turn_alternates_strictly() {
        let mut state = state();
        let mut seen = Vec::new();
        for col in [2, 2, 3, 3] {
            seen.push(state.begin_turn().unwrap());
            state.fire(0, col).unwrap();
        }
        assert_eq!(seen, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_fire_last_ship_wins_without_flipping() {
        let mut state = state();
        state.fire(0, 0).unwrap();
        state.begin_turn().unwrap();
        state.fire(0, 3).unwrap();
        state.begin_turn().unwrap();

        let outcome = state.fire(0, 1).unwrap();
        assert_eq!(
            outcome,
            ShotOutcome::Won {
                sunk: Some("boat1".into())
            }
        );
        assert_eq!(state.phase(), MatchPhase::Won(0));
        assert_eq!(state.turn(), 0);
        assert_eq!(state.moves(), [2, 1]);
        assert!(state.is_over());
    }

    #[test]
    fn test_fire_before_begin_turn_is_invalid() {
        let mut state = state();
        state.fire(0, 3).unwrap();

        assert!(matches!(
            state.fire(0, 2),
            Err(MatchError::InvalidState(_))
        ));
    }

    #[test]
    fn test_forfeit_turn_flips_without_move() {
        let mut state = state();
        state.forfeit_turn().unwrap();

        assert_eq!(state.turn(), 1);
        assert_eq!(state.moves(), [0, 0]);
        assert_eq!(state.begin_turn().unwrap(), 1);
    }

    #[test]
    fn test_forfeit_match_is_terminal() {
        let mut state = state();
        state.forfeit_turn().unwrap();
        state.begin_turn().unwrap();

        assert_eq!(state.forfeit_match().unwrap(), 1);
        assert_eq!(state.phase(), MatchPhase::Forfeited(1));
        assert!(state.begin_turn().is_err());
    }

    #[test]
    fn test_snapshot_roundtrip_restores_state() {
        let mut state = state();
        state.fire(0, 0).unwrap();
        state.begin_turn().unwrap();
        state.fire(0, 3).unwrap();

        let restored = MatchState::from_snapshot(state.snapshot());
        assert_eq!(restored.snapshot(), state.snapshot());
        assert_eq!(restored.phase(), MatchPhase::AwaitingShot(0));
    }
}
