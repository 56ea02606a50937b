//! Classic Battleship rules for Broadside.
//!
//! A 10x10 [`Board`] carrying the five-ship fleet (Carrier 5, Battleship 4,
//! Cruiser 3, Submarine 3, Destroyer 2), placed at random or from a fixed
//! layout. [`ClassicFleet`] is the [`RulesEngine`](broadside_match::RulesEngine)
//! the server uses to deal new grids.

mod board;
mod fleet;

pub use board::{BOARD_SIZE, Board, Orientation, PlacementError};
pub use fleet::{CLASSIC_FLEET, ClassicFleet, Placement, ShipClass, standard_layout};
