use std::time::Duration;

use gridsiege_core::{
    AnimationState, Archetype, CellCoord, Command, EntityId, EntityKind, Event, Faction,
    GridConfig, ScriptedRandom, StrikeOutcome,
};
use gridsiege_simulation::{BootstrapConfig, Outcome, Simulation, SimulationConfig, WavePhase};
use gridsiege_system_waves::WaveConfig;
use gridsiege_world::query;

const TICK: Duration = Duration::from_millis(50);

fn arena(columns: u32, rows: u32) -> SimulationConfig {
    SimulationConfig {
        grid: GridConfig {
            columns,
            rows,
            reserved_top_rows: 0,
            placement_margin: 0,
        },
        bootstrap: BootstrapConfig {
            defenders: 0,
            obstacles: 0,
            ..BootstrapConfig::default()
        },
        waves: WaveConfig {
            first_wave_delay_ms: 0,
            base_enemies: 0,
            enemies_per_level: 0,
            enemies_per_wave: 0,
            max_levels: None,
            ..WaveConfig::default()
        },
        ..SimulationConfig::default()
    }
}

fn always_hit(config: SimulationConfig) -> Simulation<ScriptedRandom> {
    Simulation::with_random(config, ScriptedRandom::new(vec![0.0])).expect("valid config")
}

fn first_invader(simulation: &Simulation<ScriptedRandom>) -> EntityId {
    simulation
        .roster()
        .faction(Faction::Invader)
        .map(|snapshot| snapshot.id)
        .next()
        .expect("invader on the field")
}

#[test]
fn invader_closes_in_and_strikes_on_its_impact_frame() {
    let mut simulation = always_hit(arena(10, 10));
    let knight = simulation
        .place_defender(CellCoord::new(0, 0))
        .expect("free cell");
    simulation.submit(Command::SpawnInvader {
        archetype: Archetype::FlyingEye,
        level: 1,
        cell: CellCoord::new(9, 9),
    });
    let eye = first_invader(&simulation);

    let distance = |simulation: &Simulation<ScriptedRandom>| {
        let world = simulation.world();
        let knight = query::entity(world, knight).expect("knight present");
        let eye = query::entity(world, eye).expect("eye present");
        knight.cell.chebyshev_distance(eye.cell)
    };

    let mut previous = distance(&simulation);
    let mut strikes = 0;
    for _ in 0..800 {
        let events = simulation.tick(TICK);
        assert!(query::occupancy_is_consistent(simulation.world()));
        if events
            .iter()
            .any(|event| matches!(event, Event::EntityDied { entity, .. } if *entity == eye))
        {
            break;
        }

        let current = distance(&simulation);
        assert!(current <= previous, "distance grew from {previous} to {current}");
        let moved = events
            .iter()
            .any(|event| matches!(event, Event::CharacterMoved { .. }));
        if moved && previous > 1 {
            assert!(current < previous, "a move did not close the gap");
        }
        previous = current;

        for event in &events {
            let Event::DamageDealt {
                source: Some(source),
                target,
                ..
            } = *event
            else {
                continue;
            };
            assert_ne!(source, target, "no strike should botch with a zero roll");
            let attacker = query::entity(simulation.world(), source).expect("attacker present");
            let archetype = attacker.archetype.expect("attacker is a character");
            assert_eq!(attacker.state, AnimationState::Attack);
            assert_eq!(attacker.frame, archetype.stats().impact_frame);
            strikes += 1;
        }
    }

    assert!(strikes > 0, "the fight never produced damage");
    let eye = query::entity(simulation.world(), eye).expect("dying eye still present");
    assert_eq!(eye.state, AnimationState::Death);
}

#[test]
fn sealed_corridor_turns_pursuit_into_an_obstacle_attack() {
    let mut simulation = always_hit(arena(5, 1));
    let knight = simulation
        .place_defender(CellCoord::new(0, 0))
        .expect("free cell");
    let wall = simulation
        .place_obstacle(CellCoord::new(2, 0))
        .expect("free cell");
    simulation.submit(Command::SpawnInvader {
        archetype: Archetype::Skeleton,
        level: 1,
        cell: CellCoord::new(4, 0),
    });
    let skeleton = first_invader(&simulation);

    let mut wall_attacked = false;
    let mut wall_removed = false;
    let mut duel = false;
    let fighters = |source: EntityId, target: EntityId| {
        (source, target) == (skeleton, knight) || (source, target) == (knight, skeleton)
    };
    for _ in 0..800 {
        for event in simulation.tick(TICK) {
            match event {
                Event::AttackStarted { target, .. } if target == wall => wall_attacked = true,
                Event::EntityRemoved { entity } if entity == wall => wall_removed = true,
                Event::DamageDealt {
                    source: Some(source),
                    target,
                    ..
                } if fighters(source, target) => duel = true,
                _ => {}
            }
        }
        if duel {
            break;
        }
    }

    assert!(wall_attacked, "nobody attacked the wall");
    assert!(wall_removed, "the wall was never destroyed");
    assert!(duel, "the characters never met after the wall fell");
}

#[test]
fn wave_clears_on_the_tick_the_last_invader_is_purged() {
    let mut config = arena(3, 3);
    config.economy.area_effect_damage = 100;
    config.waves = WaveConfig {
        base_enemies: 1,
        waves_per_level: 2,
        ..config.waves
    };
    let mut simulation = always_hit(config);
    let _ = simulation
        .place_defender(CellCoord::new(1, 1))
        .expect("free cell");

    let started = simulation.tick(TICK);
    assert!(started
        .iter()
        .any(|event| matches!(event, Event::WaveStarted { level: 1, wave: 1, enemies: 1 })));
    let spawned = simulation.tick(TICK);
    assert!(spawned.iter().any(|event| matches!(
        event,
        Event::CharacterSpawned {
            faction: Faction::Invader,
            ..
        }
    )));

    assert_eq!(simulation.cast_area_effect(CellCoord::new(1, 1)), Ok(1));
    let invader = first_invader(&simulation);

    let mut cleared_on_removal = false;
    for _ in 0..40 {
        let events = simulation.tick(TICK);
        let removed = events
            .iter()
            .position(|event| *event == Event::EntityRemoved { entity: invader });
        let cleared = events
            .iter()
            .position(|event| matches!(event, Event::WaveCleared { level: 1, wave: 1 }));
        match (removed, cleared) {
            (None, None) => continue,
            (Some(removed), Some(cleared)) => {
                assert!(removed < cleared);
                cleared_on_removal = true;
                break;
            }
            other => panic!("wave clear and removal diverged: {other:?}"),
        }
    }

    assert!(cleared_on_removal);
    let status = simulation.status();
    assert_eq!(status.stats.kills, 1);
    assert_eq!(status.gold, 150 - 50 - 40 + 5 + 20);
    assert_eq!(status.wave, 2);
}

#[test]
fn clearing_the_last_level_wins_and_locks_commands() {
    let mut config = arena(3, 3);
    config.economy.area_effect_damage = 100;
    config.waves = WaveConfig {
        base_enemies: 1,
        waves_per_level: 1,
        max_levels: Some(2),
        level_delay_ms: 100,
        ..config.waves
    };
    let mut simulation = always_hit(config);
    let _ = simulation
        .place_defender(CellCoord::new(1, 1))
        .expect("free cell");

    let mut log = Vec::new();
    for _ in 0..200 {
        if simulation.status().invaders > 0 {
            let _ = simulation
                .cast_area_effect(CellCoord::new(1, 1))
                .expect("affordable effect");
        }
        log.extend(simulation.tick(TICK));
        if simulation.outcome().is_some() {
            break;
        }
    }

    assert_eq!(simulation.outcome(), Some(Outcome::Victory));
    assert!(log.contains(&Event::LevelAdvanced { level: 2 }));
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::DefendersHealed { .. })));
    assert_eq!(log.last(), Some(&Event::Victory { level: 2 }));
    assert!(simulation.status().stats.peak_threat > 1.1);
    assert_eq!(
        simulation.place_obstacle(CellCoord::new(0, 0)),
        Err(gridsiege_core::CommandError::SimulationOver)
    );
    assert!(simulation.tick(TICK).is_empty());
}

#[test]
fn losing_every_defender_is_a_defeat() {
    let mut simulation = always_hit(arena(6, 6));
    simulation.submit(Command::SpawnInvader {
        archetype: Archetype::Goblin,
        level: 1,
        cell: CellCoord::new(5, 5),
    });

    let _ = simulation.tick(TICK);
    let events = simulation.tick(TICK);
    assert!(events.contains(&Event::Defeat { level: 1, wave: 1 }));
    assert_eq!(simulation.outcome(), Some(Outcome::Defeat));
    assert!(simulation
        .roster()
        .iter()
        .all(|snapshot| snapshot.kind == EntityKind::Character));
}

#[test]
fn dying_last_defender_holds_the_wave_until_defeat() {
    let mut config = arena(3, 3);
    config.economy.area_effect_damage = 10_000;
    config.waves.waves_per_level = 1;
    let mut simulation = always_hit(config);
    let knight = simulation
        .place_defender(CellCoord::new(1, 1))
        .expect("free cell");
    simulation.submit(Command::SpawnInvader {
        archetype: Archetype::Mushroom,
        level: 100,
        cell: CellCoord::new(0, 0),
    });
    let mushroom = first_invader(&simulation);

    let mut log = simulation.tick(TICK);
    simulation.submit(Command::ResolveStrike {
        attacker: mushroom,
        target: knight,
        outcome: StrikeOutcome::Hit,
    });
    assert_eq!(simulation.status().defenders, 0);
    assert_eq!(simulation.cast_area_effect(CellCoord::new(1, 1)), Ok(1));

    for _ in 0..200 {
        log.extend(simulation.tick(TICK));
        if simulation.outcome().is_some() {
            break;
        }
    }

    assert_eq!(simulation.outcome(), Some(Outcome::Defeat));
    assert_eq!(log.last(), Some(&Event::Defeat { level: 1, wave: 1 }));
    let removed = log
        .iter()
        .position(|event| *event == Event::EntityRemoved { entity: knight })
        .expect("knight purged");
    assert!(removed < log.len() - 1);
    assert!(!log.iter().any(|event| matches!(
        event,
        Event::WaveCleared { .. } | Event::LevelAdvanced { .. } | Event::DefendersHealed { .. }
    )));
    assert_eq!(simulation.status().level, 1);
}

#[test]
fn impacts_during_the_countdown_still_land() {
    let mut config = arena(4, 4);
    config.waves.first_wave_delay_ms = 10_000;
    let mut simulation = always_hit(config);
    let knight = simulation
        .place_defender(CellCoord::new(1, 1))
        .expect("free cell");
    let rock = simulation
        .place_obstacle(CellCoord::new(2, 1))
        .expect("free cell");
    simulation.submit(Command::BeginAttack {
        attacker: knight,
        target: rock,
    });

    let mut log = Vec::new();
    for _ in 0..10 {
        log.extend(simulation.tick(TICK));
    }

    assert_eq!(simulation.status().phase, WavePhase::BetweenWaves);
    assert!(log.contains(&Event::ImpactFrameReached {
        attacker: knight,
        target: rock,
    }));
    assert!(log.contains(&Event::StrikeResolved {
        attacker: knight,
        target: rock,
        outcome: StrikeOutcome::Hit,
    }));
    let rock = query::entity(simulation.world(), rock).expect("rock still standing");
    assert_eq!(rock.health, 30 - Archetype::Knight.stats().damage);
}
