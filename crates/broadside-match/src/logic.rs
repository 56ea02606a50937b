//! The rules-engine seam.
//!
//! The match protocol does not know what a ship is. It only needs to fire
//! at a grid, ask whether everything on it is sunk, and draw it.

use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};

/// Result of one shot at one grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireResult {
    /// Something was hit. `sunk` names the ship if this shot finished it.
    Hit { sunk: Option<String> },
    /// Open water.
    Miss,
    /// The cell was already fired at. Nothing changed.
    AlreadyShot,
}

/// One player's grid: ship placement plus fired-cell history.
///
/// Grids are serialized into match snapshots, so a resumed match sees
/// exactly the same hits, misses and ships.
pub trait FleetGrid:
    Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Width and height of the square grid.
    fn size(&self) -> usize;

    /// Fires at `(row, col)`, zero-based.
    fn fire(&mut self, row: usize, col: usize) -> FireResult;

    /// `true` once every ship on the grid is sunk.
    fn all_sunk(&self) -> bool;

    /// Text rows for display: a header row, then one row per grid row.
    ///
    /// With `reveal_ships == false` only hits and misses are shown, which
    /// is what an opponent or spectator may see.
    fn render(&self, reveal_ships: bool) -> Vec<String>;
}

/// Produces starting grids for new matches.
pub trait RulesEngine: Send + Sync + 'static {
    type Grid: FleetGrid;

    /// A freshly placed grid for one player.
    fn new_grid(&self) -> Self::Grid;
}
