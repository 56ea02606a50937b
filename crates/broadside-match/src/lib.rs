//! Turn-based match protocol for Broadside.
//!
//! A match is two identities, their two grids, whose turn it is, and how
//! many shots each side has taken. This crate drives one match from the
//! first prompt to a terminal state, over two abstract [`Endpoint`]s.
//!
//! # Key types
//!
//! - [`FleetGrid`] / [`RulesEngine`] — the narrow interface to the grid rules
//! - [`Endpoint`] — where a player's lines come from and go to
//! - [`MatchHooks`] — snapshot persistence and spectator broadcast
//! - [`MatchState`] / [`MatchPhase`] — the pure turn state machine
//! - [`run_match`] — the async driver
//! - [`MatchSnapshot`] / [`SnapshotStore`] — resumable projections of a match
//! - [`MatchConfig`] / [`TimeoutPolicy`] — timeouts and what they cost
//!
//! The driver never crashes on I/O: a failed read or write on one side
//! ends the run with [`MatchOutcome::Interrupted`] and a fresh snapshot,
//! and the caller decides whether to wait for that side to come back.

mod config;
mod driver;
mod endpoint;
mod error;
mod logic;
mod snapshot;
mod state;

pub use config::{MatchConfig, TimeoutPolicy};
pub use driver::{MatchOutcome, MatchReport, MatchStart, run_match};
pub use endpoint::{ConnectionFault, Endpoint, MatchHooks};
pub use error::MatchError;
pub use logic::{FireResult, FleetGrid, RulesEngine};
pub use snapshot::{MatchSnapshot, SnapshotStore};
pub use state::{MatchPhase, MatchState, ShotOutcome};
