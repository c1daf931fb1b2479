#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-step route search over the battlefield grid.
//!
//! Every request runs a fresh A* search over the 8-connected grid and returns
//! only the first cell of the route. When the search cannot reach the goal
//! within its iteration budget, a greedy neighbour pick keeps the agent
//! moving instead.

use std::{cmp::Ordering, collections::BinaryHeap};

use gridsiege_core::{shuffle, CellCoord, EntityId, EntityKind, GridView, RandomSource};

const ORTHOGONAL_COST: f32 = 1.0;
const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

/// Neighbour offsets, orthogonal first.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (-1, 1),
    (1, -1),
    (-1, -1),
];

/// Outcome of a next-step request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextStep {
    /// The cell is free and may be entered right away.
    Move(CellCoord),
    /// The route continues through a cell another character holds right now.
    Blocked(CellCoord),
    /// The best neighbour is an obstacle standing between the agent and the goal.
    Obstructed {
        /// Cell holding the obstacle.
        cell: CellCoord,
        /// Handle of the obstacle.
        obstacle: EntityId,
    },
    /// No neighbour brings the agent closer or lets it sidestep.
    Stuck,
}

/// Reusable A* workspace.
///
/// Buffers are sized to the grid on first use and recycled across requests.
#[derive(Debug, Default)]
pub struct Pathfinder {
    costs: Vec<f32>,
    parents: Vec<Option<usize>>,
    closed: Vec<bool>,
    frontier: BinaryHeap<FrontierEntry>,
}

impl Pathfinder {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the next cell an agent at `from` should step into to reach `goal`.
    ///
    /// Characters never block the search itself; only obstacles and reserved
    /// rows do. Diagonal steps require both adjacent orthogonal cells to be
    /// walkable.
    pub fn next_step<R>(
        &mut self,
        grid: GridView<'_>,
        from: CellCoord,
        goal: CellCoord,
        rng: &mut R,
    ) -> NextStep
    where
        R: RandomSource + ?Sized,
    {
        if from == goal {
            return NextStep::Stuck;
        }

        match self.search(grid, from, goal) {
            Some(cell) if grid.is_empty_for_move(cell) => NextStep::Move(cell),
            Some(cell) => NextStep::Blocked(cell),
            None => greedy_step(grid, from, goal, rng),
        }
    }

    fn search(
        &mut self,
        grid: GridView<'_>,
        from: CellCoord,
        goal: CellCoord,
    ) -> Option<CellCoord> {
        let config = grid.config();
        let start = config.index(from)?;
        let target = config.index(goal)?;
        if !grid.is_walkable(goal) {
            return None;
        }

        self.reset(config.cell_count());
        self.costs[start] = 0.0;
        let mut sequence = 0_u64;
        self.frontier.push(FrontierEntry {
            estimate: heuristic(from, goal),
            sequence,
            index: start,
            cell: from,
        });

        let budget = config.cell_count();
        let mut iterations = 0_usize;
        while let Some(entry) = self.frontier.pop() {
            iterations += 1;
            if iterations > budget {
                return None;
            }
            if self.closed[entry.index] {
                continue;
            }
            self.closed[entry.index] = true;

            if entry.index == target {
                return self.first_step(start, target, grid);
            }

            let current_cost = self.costs[entry.index];
            for (columns, rows) in DIRECTIONS {
                let Some(next) = step(grid, entry.cell, columns, rows) else {
                    continue;
                };
                let Some(next_index) = config.index(next) else {
                    continue;
                };
                if self.closed[next_index] {
                    continue;
                }

                let cost = if columns != 0 && rows != 0 {
                    DIAGONAL_COST
                } else {
                    ORTHOGONAL_COST
                };
                let tentative = current_cost + cost;
                if tentative < self.costs[next_index] {
                    self.costs[next_index] = tentative;
                    self.parents[next_index] = Some(entry.index);
                    sequence += 1;
                    self.frontier.push(FrontierEntry {
                        estimate: tentative + heuristic(next, goal),
                        sequence,
                        index: next_index,
                        cell: next,
                    });
                }
            }
        }

        None
    }

    fn reset(&mut self, cell_count: usize) {
        self.costs.clear();
        self.costs.resize(cell_count, f32::INFINITY);
        self.parents.clear();
        self.parents.resize(cell_count, None);
        self.closed.clear();
        self.closed.resize(cell_count, false);
        self.frontier.clear();
    }

    fn first_step(&self, start: usize, target: usize, grid: GridView<'_>) -> Option<CellCoord> {
        let mut node = target;
        while let Some(parent) = self.parents[node] {
            if parent == start {
                return cell_at(grid, node);
            }
            node = parent;
        }
        None
    }
}

/// Reports whether a single step from `from` by the offset stays walkable
/// without cutting an obstacle corner.
#[must_use]
pub fn is_legal_step(grid: GridView<'_>, from: CellCoord, columns: i32, rows: i32) -> bool {
    step(grid, from, columns, rows).is_some()
}

fn step(grid: GridView<'_>, from: CellCoord, columns: i32, rows: i32) -> Option<CellCoord> {
    let next = from.offset(columns, rows)?;
    if !grid.is_walkable(next) {
        return None;
    }
    if columns != 0 && rows != 0 {
        let beside = from.offset(columns, 0)?;
        let below = from.offset(0, rows)?;
        if !grid.is_walkable(beside) || !grid.is_walkable(below) {
            return None;
        }
    }
    Some(next)
}

fn greedy_step<R>(grid: GridView<'_>, from: CellCoord, goal: CellCoord, rng: &mut R) -> NextStep
where
    R: RandomSource + ?Sized,
{
    let mut directions = DIRECTIONS;
    shuffle(rng, &mut directions);

    let current = from.manhattan_distance(goal);
    let mut best_free: Option<(u32, CellCoord)> = None;
    let mut best_obstacle: Option<(u32, CellCoord, EntityId)> = None;

    for (columns, rows) in directions {
        if let Some(next) = step(grid, from, columns, rows) {
            if !grid.is_empty_for_move(next) {
                continue;
            }
            let distance = next.manhattan_distance(goal);
            let beats_best = best_free.map_or(true, |(best, _)| distance <= best);
            if beats_best && distance <= current + 1 {
                best_free = Some((distance, next));
            }
            continue;
        }

        let Some(next) = from.offset(columns, rows) else {
            continue;
        };
        let Some(occupant) = grid.occupant(next) else {
            continue;
        };
        if occupant.kind != EntityKind::Obstacle {
            continue;
        }
        let distance = next.manhattan_distance(goal);
        let beats_best = best_obstacle.map_or(true, |(best, _, _)| distance < best);
        if beats_best && distance < current {
            best_obstacle = Some((distance, next, occupant.id));
        }
    }

    match (best_free, best_obstacle) {
        (Some((distance, cell)), _) if distance < current => NextStep::Move(cell),
        (_, Some((_, cell, obstacle))) => NextStep::Obstructed { cell, obstacle },
        (Some((_, cell)), None) => NextStep::Move(cell),
        (None, None) => NextStep::Stuck,
    }
}

fn heuristic(from: CellCoord, goal: CellCoord) -> f32 {
    from.manhattan_distance(goal) as f32
}

fn cell_at(grid: GridView<'_>, index: usize) -> Option<CellCoord> {
    let (columns, _) = grid.dimensions();
    let columns = usize::try_from(columns).ok()?;
    if columns == 0 {
        return None;
    }
    let column = u32::try_from(index % columns).ok()?;
    let row = u32::try_from(index / columns).ok()?;
    Some(CellCoord::new(column, row))
}

#[derive(Clone, Copy, Debug)]
struct FrontierEntry {
    estimate: f32,
    sequence: u64,
    index: usize,
    cell: CellCoord,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}
