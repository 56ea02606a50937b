//! The grid: ship placement, shots taken, and how it is drawn.

use broadside_match::{FireResult, FleetGrid};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Placement, ShipClass};

/// Rows and columns of the classic grid.
pub const BOARD_SIZE: usize = 10;

/// Attempts per ship before random placement gives up.
const PLACEMENT_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("{0} does not fit on the grid there")]
    OutOfBounds(String),

    #[error("{0} overlaps another ship")]
    Overlap(String),

    #[error("no room left to place {0}")]
    NoRoom(String),
}

/// What one cell holds. Ship cells carry the index of their ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Cell {
    Water,
    Ship(usize),
    Hit(usize),
    Miss,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Ship {
    name: String,
    length: usize,
    hits: usize,
}

impl Ship {
    fn is_sunk(&self) -> bool {
        self.hits >= self.length
    }
}

/// One player's grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    /// Row-major, `size * size` cells.
    cells: Vec<Cell>,
    ships: Vec<Ship>,
}

impl Board {
    /// An empty grid with no ships.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::Water; size * size],
            ships: Vec::new(),
        }
    }

    /// Builds a grid from explicit placements.
    pub fn from_layout(size: usize, layout: &[Placement]) -> Result<Self, PlacementError> {
        let mut board = Self::new(size);
        for p in layout {
            board.place(p.class, p.row, p.col, p.orientation)?;
        }
        Ok(board)
    }

    /// Places every ship of `fleet` at random, without overlap.
    pub fn random<R: Rng>(size: usize, fleet: &[ShipClass], rng: &mut R) -> Result<Self, PlacementError> {
        let mut board = Self::new(size);
        for class in fleet {
            let (row, col, orientation) = board.random_spot(*class, rng)?;
            board.place(*class, row, col, orientation)?;
        }
        Ok(board)
    }

    /// Places one ship with its bow at `(row, col)`.
    pub fn place(
        &mut self,
        class: ShipClass,
        row: usize,
        col: usize,
        orientation: Orientation,
    ) -> Result<(), PlacementError> {
        let cells = self
            .footprint(class.length, row, col, orientation)
            .ok_or_else(|| PlacementError::OutOfBounds(class.name.to_string()))?;

        if cells.iter().any(|&i| self.cells[i] != Cell::Water) {
            return Err(PlacementError::Overlap(class.name.to_string()));
        }

        let index = self.ships.len();
        for i in cells {
            self.cells[i] = Cell::Ship(index);
        }
        self.ships.push(Ship {
            name: class.name.to_string(),
            length: class.length,
            hits: 0,
        });
        Ok(())
    }

    /// Every cell that holds part of a ship, hit or not.
    pub fn ship_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| matches!(cell, Cell::Ship(_) | Cell::Hit(_)))
            .map(|(i, _)| (i / self.size, i % self.size))
            .collect()
    }

    /// Names of the ships still afloat, in placement order.
    pub fn ships_afloat(&self) -> Vec<&str> {
        self.ships
            .iter()
            .filter(|s| !s.is_sunk())
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Cell indices covered by a ship, or `None` if it would leave the grid.
    fn footprint(&self, length: usize, row: usize, col: usize, orientation: Orientation) -> Option<Vec<usize>> {
        if length == 0 {
            return None;
        }
        let (end_row, end_col) = match orientation {
            Orientation::Horizontal => (row, col + length - 1),
            Orientation::Vertical => (row + length - 1, col),
        };
        if end_row >= self.size || end_col >= self.size {
            return None;
        }
        let cells = (0..length)
            .map(|k| match orientation {
                Orientation::Horizontal => row * self.size + col + k,
                Orientation::Vertical => (row + k) * self.size + col,
            })
            .collect();
        Some(cells)
    }

    fn random_spot<R: Rng>(
        &self,
        class: ShipClass,
        rng: &mut R,
    ) -> Result<(usize, usize, Orientation), PlacementError> {
        if class.length == 0 || class.length > self.size {
            return Err(PlacementError::OutOfBounds(class.name.to_string()));
        }
        for _ in 0..PLACEMENT_ATTEMPTS {
            let orientation = if rng.random() {
                Orientation::Horizontal
            } else {
                Orientation::Vertical
            };
            let (max_row, max_col) = match orientation {
                Orientation::Horizontal => (self.size - 1, self.size - class.length),
                Orientation::Vertical => (self.size - class.length, self.size - 1),
            };
            let row = rng.random_range(0..=max_row);
            let col = rng.random_range(0..=max_col);

            let free = self
                .footprint(class.length, row, col, orientation)
                .is_some_and(|cells| cells.iter().all(|&i| self.cells[i] == Cell::Water));
            if free {
                return Ok((row, col, orientation));
            }
        }
        Err(PlacementError::NoRoom(class.name.to_string()))
    }

    fn symbol(cell: Cell, reveal_ships: bool) -> char {
        match cell {
            Cell::Water => '.',
            Cell::Ship(_) if reveal_ships => 'S',
            Cell::Ship(_) => '.',
            Cell::Hit(_) => 'X',
            Cell::Miss => 'o',
        }
    }
}

impl FleetGrid for Board {
    fn size(&self) -> usize {
        self.size
    }

    /// Cells outside the grid are reported as `AlreadyShot` and change nothing.
    fn fire(&mut self, row: usize, col: usize) -> FireResult {
        if row >= self.size || col >= self.size {
            return FireResult::AlreadyShot;
        }
        let i = row * self.size + col;
        match self.cells[i] {
            Cell::Water => {
                self.cells[i] = Cell::Miss;
                FireResult::Miss
            }
            Cell::Ship(index) => {
                self.cells[i] = Cell::Hit(index);
                let ship = &mut self.ships[index];
                ship.hits += 1;
                let sunk = ship.is_sunk().then(|| ship.name.clone());
                FireResult::Hit { sunk }
            }
            Cell::Hit(_) | Cell::Miss => FireResult::AlreadyShot,
        }
    }

    fn all_sunk(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }

    /// `.` unknown, `X` hit, `o` miss, `S` ship (only when revealed).
    fn render(&self, reveal_ships: bool) -> Vec<String> {
        let header: Vec<String> = (1..=self.size).map(|c| format!("{c:>2}")).collect();
        let mut rows = Vec::with_capacity(self.size + 1);
        rows.push(format!("  {}", header.join(" ")));

        for (r, line) in self.cells.chunks(self.size).enumerate() {
            let label = (b'A' + r as u8) as char;
            let cells: Vec<String> = line
                .iter()
                .map(|&cell| format!("{:>2}", Self::symbol(cell, reveal_ships)))
                .collect();
            rows.push(format!("{label} {}", cells.join(" ")));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CLASSIC_FLEET, standard_layout};

    const DESTROYER: ShipClass = ShipClass {
        name: "Destroyer",
        length: 2,
    };

    fn destroyer_board() -> Board {
        let mut board = Board::new(BOARD_SIZE);
        board.place(DESTROYER, 0, 0, Orientation::Horizontal).unwrap();
        board
    }

    #[test]
    fn test_place_out_of_bounds_is_rejected() {
        let mut board = Board::new(BOARD_SIZE);
        assert_eq!(
            board.place(DESTROYER, 0, 9, Orientation::Horizontal),
            Err(PlacementError::OutOfBounds("Destroyer".into()))
        );
        assert_eq!(
            board.place(DESTROYER, 9, 0, Orientation::Vertical),
            Err(PlacementError::OutOfBounds("Destroyer".into()))
        );
        assert!(board.place(DESTROYER, 8, 9, Orientation::Vertical).is_ok());
    }

    #[test]
    fn test_place_overlap_is_rejected() {
        let mut board = destroyer_board();
        assert_eq!(
            board.place(DESTROYER, 0, 1, Orientation::Vertical),
            Err(PlacementError::Overlap("Destroyer".into()))
        );
    }

    #[test]
    fn test_fire_miss_then_already_shot() {
        let mut board = destroyer_board();
        assert_eq!(board.fire(5, 5), FireResult::Miss);
        assert_eq!(board.fire(5, 5), FireResult::AlreadyShot);
    }

    #[test]
    fn test_fire_hit_then_sink() {
        let mut board = destroyer_board();

        assert_eq!(board.fire(0, 0), FireResult::Hit { sunk: None });
        assert!(!board.all_sunk());
        assert_eq!(
            board.fire(0, 1),
            FireResult::Hit {
                sunk: Some("Destroyer".into())
            }
        );
        assert!(board.all_sunk());
        assert_eq!(board.fire(0, 1), FireResult::AlreadyShot);
    }

    #[test]
    fn test_fire_outside_grid_changes_nothing() {
        let mut board = destroyer_board();
        let before = board.clone();
        assert_eq!(board.fire(10, 0), FireResult::AlreadyShot);
        assert_eq!(board, before);
    }

    #[test]
    fn test_render_hides_ships_unless_revealed() {
        let mut board = destroyer_board();
        board.fire(0, 0);
        board.fire(1, 0);

        let hidden = board.render(false);
        assert_eq!(hidden.len(), BOARD_SIZE + 1);
        assert_eq!(hidden[0], "   1  2  3  4  5  6  7  8  9 10");
        assert_eq!(hidden[1], "A  X  .  .  .  .  .  .  .  .  .");
        assert_eq!(hidden[2], "B  o  .  .  .  .  .  .  .  .  .");

        let revealed = board.render(true);
        assert_eq!(revealed[1], "A  X  S  .  .  .  .  .  .  .  .");
    }

    #[test]
    fn test_random_fleet_has_seventeen_cells() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let board = Board::random(BOARD_SIZE, &CLASSIC_FLEET, &mut rng).unwrap();
            assert_eq!(board.ship_cells().len(), 17);
            assert_eq!(board.ships_afloat().len(), 5);
        }
    }

    #[test]
    fn test_random_fleet_too_big_for_grid_fails() {
        let mut rng = rand::rng();
        let result = Board::random(3, &CLASSIC_FLEET, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_layout_standard() {
        let board = Board::from_layout(BOARD_SIZE, &standard_layout()).unwrap();
        assert_eq!(board.ship_cells().len(), 17);
        assert_eq!(
            board.ships_afloat(),
            vec!["Carrier", "Battleship", "Cruiser", "Submarine", "Destroyer"]
        );
    }

    #[test]
    fn test_board_survives_serde_roundtrip_mid_game() {
        let mut board = destroyer_board();
        board.fire(0, 0);
        board.fire(4, 4);

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, board);
    }
}
