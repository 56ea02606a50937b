//! The classic fleet played through the match state machine.

use broadside_match::{FleetGrid, MatchPhase, MatchState, RulesEngine, ShotOutcome};
use broadside_rules::{BOARD_SIZE, ClassicFleet, standard_layout};

/// Cells of `grid` that hold no ship, in row-major order.
fn water_cells(grid: &impl FleetGrid, ships: &[(usize, usize)]) -> Vec<(usize, usize)> {
    (0..grid.size())
        .flat_map(|r| (0..grid.size()).map(move |c| (r, c)))
        .filter(|cell| !ships.contains(cell))
        .collect()
}

#[test]
fn test_seventeen_hits_sink_fleet_and_win_for_shooter() {
    let rules = ClassicFleet::random();
    let fleet_a = rules.new_grid();
    let fleet_b = rules.new_grid();

    let targets = fleet_a.ship_cells();
    assert_eq!(targets.len(), 17);
    let a_misses = water_cells(&fleet_b, &fleet_b.ship_cells());

    // Side 0 is A and always misses; side 1 is B and works through A's fleet.
    let mut state = MatchState::new([fleet_a, fleet_b]);
    let mut hits = 0;

    for (i, &(row, col)) in targets.iter().enumerate() {
        assert_eq!(state.begin_turn().unwrap(), 0);
        let (mr, mc) = a_misses[i];
        assert_eq!(state.fire(mr, mc).unwrap(), ShotOutcome::Miss);

        assert_eq!(state.begin_turn().unwrap(), 1);
        let outcome = state.fire(row, col).unwrap();
        hits += 1;

        if i < targets.len() - 1 {
            assert!(matches!(outcome, ShotOutcome::Hit { .. }), "shot {i}: {outcome:?}");
            assert!(!state.grid(0).all_sunk());
        } else {
            assert!(matches!(outcome, ShotOutcome::Won { sunk: Some(_) }));
        }
    }

    assert_eq!(hits, 17);
    assert!(state.grid(0).all_sunk());
    assert_eq!(state.phase(), MatchPhase::Won(1));
    assert_eq!(state.moves(), [17, 17]);
}

#[test]
fn test_every_ship_reports_its_own_sinking() {
    let rules = ClassicFleet::fixed(&standard_layout()).unwrap();
    let mut grid = rules.new_grid();

    let mut sunk = Vec::new();
    for (row, col) in grid.ship_cells() {
        if let broadside_match::FireResult::Hit { sunk: Some(name) } = grid.fire(row, col) {
            sunk.push(name);
        }
    }
    assert_eq!(
        sunk,
        vec!["Carrier", "Battleship", "Cruiser", "Submarine", "Destroyer"]
    );
}

#[test]
fn test_fixed_fleet_deals_identical_grids() {
    let rules = ClassicFleet::fixed(&standard_layout()).unwrap();
    assert_eq!(rules.new_grid(), rules.new_grid());
    assert_eq!(rules.new_grid().size(), BOARD_SIZE);
}

#[test]
fn test_random_fleet_deals_varied_grids() {
    let rules = ClassicFleet::random();
    let first = rules.new_grid();
    let varied = (0..5).any(|_| rules.new_grid() != first);
    assert!(varied);
}

#[test]
fn test_fixed_fleet_rejects_overlapping_layout() {
    let mut layout = standard_layout();
    layout[1].row = 0;
    assert!(ClassicFleet::fixed(&layout).is_err());
}
