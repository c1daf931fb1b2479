use gridsiege_core::{CellCoord, CommandError, Event, Faction, PlacementError};
use gridsiege_simulation::{Simulation, SimulationConfig};
use std::time::Duration;

fn empty_field() -> Simulation {
    let mut config = SimulationConfig::default();
    config.bootstrap.defenders = 0;
    config.bootstrap.obstacles = 0;
    Simulation::new(config).expect("valid config")
}

#[test]
fn successful_placements_debit_the_balance() {
    let mut simulation = empty_field();
    let defender = simulation
        .place_defender(CellCoord::new(4, 6))
        .expect("free cell");
    let obstacle = simulation
        .place_obstacle(CellCoord::new(5, 6))
        .expect("free cell");

    assert_ne!(defender, obstacle);
    let status = simulation.status();
    assert_eq!(status.gold, 150 - 50 - 15);
    assert_eq!(status.stats.gold_spent, 65);
    assert_eq!(status.defenders, 1);

    let events = simulation.tick(Duration::from_millis(16));
    assert!(events.contains(&Event::ObstaclePlaced {
        entity: obstacle,
        cell: CellCoord::new(5, 6),
    }));
}

#[test]
fn rejected_placements_leave_everything_untouched() {
    let mut simulation = empty_field();
    let _ = simulation
        .place_defender(CellCoord::new(4, 6))
        .expect("free cell");
    let before = simulation.roster().into_vec();

    assert_eq!(
        simulation.place_obstacle(CellCoord::new(4, 6)),
        Err(CommandError::Placement(PlacementError::Occupied))
    );
    assert_eq!(
        simulation.place_defender(CellCoord::new(4, 0)),
        Err(CommandError::Placement(PlacementError::OutOfBounds))
    );
    assert_eq!(
        simulation.place_defender(CellCoord::new(40, 6)),
        Err(CommandError::Placement(PlacementError::OutOfBounds))
    );
    assert_eq!(
        simulation.cast_area_effect(CellCoord::new(40, 6)),
        Err(CommandError::Placement(PlacementError::OutOfBounds))
    );

    assert_eq!(simulation.roster().into_vec(), before);
    assert_eq!(simulation.gold(), 100);
    let events = simulation.tick(Duration::from_millis(16));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::PlacementRejected { .. })));
}

#[test]
fn commands_are_refused_without_funds() {
    let mut config = SimulationConfig::default();
    config.bootstrap.defenders = 0;
    config.bootstrap.obstacles = 0;
    config.economy.starting_gold = 40;
    let mut simulation = Simulation::new(config).expect("valid config");

    assert_eq!(
        simulation.place_defender(CellCoord::new(4, 6)),
        Err(CommandError::InsufficientFunds {
            required: 50,
            available: 40,
        })
    );
    assert_eq!(simulation.roster().count(Faction::Defender), 0);
    assert_eq!(simulation.cast_area_effect(CellCoord::new(4, 6)), Ok(0));
    assert_eq!(simulation.gold(), 0);
}

#[test]
fn placement_margin_limits_player_placements() {
    let mut config = SimulationConfig::default();
    config.bootstrap.defenders = 0;
    config.bootstrap.obstacles = 0;
    config.grid.placement_margin = 1;
    let mut simulation = Simulation::new(config).expect("valid config");

    assert_eq!(
        simulation.place_defender(CellCoord::new(0, 6)),
        Err(CommandError::Placement(PlacementError::OutOfBounds))
    );
    assert!(simulation.place_defender(CellCoord::new(1, 3)).is_ok());
}
