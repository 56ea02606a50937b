//! The classic fleet and the rules engine that deals it.

use broadside_match::RulesEngine;

use crate::{BOARD_SIZE, Board, Orientation, PlacementError};

/// A kind of ship: its name and how many cells it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipClass {
    pub name: &'static str,
    pub length: usize,
}

/// Carrier 5, Battleship 4, Cruiser 3, Submarine 3, Destroyer 2.
pub const CLASSIC_FLEET: [ShipClass; 5] = [
    ShipClass { name: "Carrier", length: 5 },
    ShipClass { name: "Battleship", length: 4 },
    ShipClass { name: "Cruiser", length: 3 },
    ShipClass { name: "Submarine", length: 3 },
    ShipClass { name: "Destroyer", length: 2 },
];

/// Where one ship goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub class: ShipClass,
    pub row: usize,
    pub col: usize,
    pub orientation: Orientation,
}

/// The classic fleet laid out horizontally on rows A, C, E, G and I,
/// each ship starting in column 1.
pub fn standard_layout() -> Vec<Placement> {
    CLASSIC_FLEET
        .iter()
        .enumerate()
        .map(|(i, class)| Placement {
            class: *class,
            row: i * 2,
            col: 0,
            orientation: Orientation::Horizontal,
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Deployment {
    Random,
    Fixed(Board),
}

/// Deals classic 10x10 grids, randomly placed or all from one layout.
#[derive(Debug, Clone)]
pub struct ClassicFleet {
    deployment: Deployment,
}

impl ClassicFleet {
    /// A fresh random placement for every grid.
    pub fn random() -> Self {
        Self {
            deployment: Deployment::Random,
        }
    }

    /// Every grid uses the same layout. Handy for scripted games.
    pub fn fixed(layout: &[Placement]) -> Result<Self, PlacementError> {
        let board = Board::from_layout(BOARD_SIZE, layout)?;
        Ok(Self {
            deployment: Deployment::Fixed(board),
        })
    }
}

impl Default for ClassicFleet {
    fn default() -> Self {
        Self::random()
    }
}

impl RulesEngine for ClassicFleet {
    type Grid = Board;

    fn new_grid(&self) -> Board {
        match &self.deployment {
            Deployment::Fixed(board) => board.clone(),
            Deployment::Random => {
                let mut rng = rand::rng();
                // Five ships on a 10x10 grid practically always fit on the
                // first try; the standard layout is the last resort.
                (0..10)
                    .find_map(|_| Board::random(BOARD_SIZE, &CLASSIC_FLEET, &mut rng).ok())
                    .or_else(|| Board::from_layout(BOARD_SIZE, &standard_layout()).ok())
                    .unwrap_or_else(|| Board::new(BOARD_SIZE))
            }
        }
    }
}
