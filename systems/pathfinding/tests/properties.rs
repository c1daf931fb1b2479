use std::collections::VecDeque;

use gridsiege_core::{
    CellCoord, EntityId, EntityKind, GridConfig, GridView, Occupant, ScriptedRandom,
};
use gridsiege_system_pathfinding::{is_legal_step, NextStep, Pathfinder, DIRECTIONS};
use proptest::prelude::*;

fn open_config(columns: u32, rows: u32) -> GridConfig {
    GridConfig {
        columns,
        rows,
        reserved_top_rows: 0,
        placement_margin: 0,
    }
}

fn breadth_first_distance(config: GridConfig, from: CellCoord, goal: CellCoord) -> Option<u32> {
    let mut distances = vec![u32::MAX; config.cell_count()];
    let mut queue = VecDeque::new();
    distances[config.index(from)?] = 0;
    queue.push_back(from);

    while let Some(cell) = queue.pop_front() {
        let distance = distances[config.index(cell)?];
        if cell == goal {
            return Some(distance);
        }
        for (columns, rows) in DIRECTIONS {
            let Some(next) = cell.offset(columns, rows) else {
                continue;
            };
            let Some(index) = config.index(next) else {
                continue;
            };
            if distances[index] == u32::MAX {
                distances[index] = distance + 1;
                queue.push_back(next);
            }
        }
    }
    None
}

fn open_request() -> impl Strategy<Value = (GridConfig, CellCoord, CellCoord)> {
    (2_u32..14, 2_u32..14)
        .prop_flat_map(|(columns, rows)| {
            (
                Just(open_config(columns, rows)),
                (0..columns, 0..rows),
                (0..columns, 0..rows),
            )
        })
        .prop_filter("distinct endpoints", |(_, from, goal)| from != goal)
        .prop_map(|(config, (fc, fr), (gc, gr))| {
            (config, CellCoord::new(fc, fr), CellCoord::new(gc, gr))
        })
}

fn cluttered_request(
) -> impl Strategy<Value = (GridConfig, Vec<bool>, CellCoord, CellCoord, Vec<f64>)> {
    (3_u32..10, 3_u32..10).prop_flat_map(|(columns, rows)| {
        let config = open_config(columns, rows);
        (
            Just(config),
            proptest::collection::vec(proptest::bool::weighted(0.3), config.cell_count()),
            (0..columns, 0..rows).prop_map(|(c, r)| CellCoord::new(c, r)),
            (0..columns, 0..rows).prop_map(|(c, r)| CellCoord::new(c, r)),
            proptest::collection::vec(0.0_f64..1.0, 1..8),
        )
    })
}

proptest! {
    #[test]
    fn first_step_lies_on_a_shortest_path((config, from, goal) in open_request()) {
        let cells = vec![None; config.cell_count()];
        let grid = GridView::new(&cells, config);
        let mut pathfinder = Pathfinder::new();
        let mut rng = ScriptedRandom::new(vec![0.0]);

        let step = pathfinder.next_step(grid, from, goal, &mut rng);
        let NextStep::Move(cell) = step else {
            panic!("open grid must yield a move, got {step:?}");
        };

        let total = breadth_first_distance(config, from, goal).expect("reachable");
        let remaining = breadth_first_distance(config, cell, goal).expect("reachable");
        prop_assert_eq!(from.chebyshev_distance(cell), 1);
        prop_assert_eq!(remaining + 1, total);
    }

    #[test]
    fn steps_never_cut_corners_or_enter_occupied_cells(
        (config, blocked, from, goal, script) in cluttered_request()
    ) {
        prop_assume!(from != goal);
        let cells: Vec<Option<Occupant>> = blocked
            .iter()
            .enumerate()
            .map(|(index, blocked)| {
                blocked.then(|| Occupant {
                    id: EntityId::new(index as u32 + 100),
                    kind: EntityKind::Obstacle,
                })
            })
            .collect();
        let mut cells = cells;
        let from_index = config.index(from).expect("inside");
        cells[from_index] = Some(Occupant {
            id: EntityId::new(0),
            kind: EntityKind::Character,
        });
        let goal_index = config.index(goal).expect("inside");
        cells[goal_index] = Some(Occupant {
            id: EntityId::new(1),
            kind: EntityKind::Character,
        });
        let grid = GridView::new(&cells, config);
        let mut pathfinder = Pathfinder::new();
        let mut rng = ScriptedRandom::new(script);

        match pathfinder.next_step(grid, from, goal, &mut rng) {
            NextStep::Move(cell) => {
                prop_assert!(grid.is_empty_for_move(cell));
                let columns = cell.column() as i32 - from.column() as i32;
                let rows = cell.row() as i32 - from.row() as i32;
                prop_assert!(is_legal_step(grid, from, columns, rows));
            }
            NextStep::Blocked(cell) => {
                prop_assert_eq!(from.chebyshev_distance(cell), 1);
                prop_assert_eq!(
                    grid.occupant(cell).map(|occupant| occupant.kind),
                    Some(EntityKind::Character)
                );
            }
            NextStep::Obstructed { cell, obstacle } => {
                prop_assert_eq!(from.chebyshev_distance(cell), 1);
                prop_assert_eq!(grid.obstacle_at(cell), Some(obstacle));
                prop_assert!(cell.manhattan_distance(goal) < from.manhattan_distance(goal));
            }
            NextStep::Stuck => {}
        }
    }
}
