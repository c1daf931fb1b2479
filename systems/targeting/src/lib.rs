#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! AI decision layer choosing a target and the next action for each character.

use gridsiege_core::{
    AnimationState, CellCoord, Command, EntityId, EntitySnapshot, Faction, GridView, RandomSource,
    RosterView,
};
use gridsiege_system_pathfinding::{NextStep, Pathfinder, DIRECTIONS};
use serde::{Deserialize, Serialize};

/// Weights of the target score
/// `distance_weight × (horizon − chebyshev) + health_weight × (1 − health) + adjacency`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Constant the Chebyshev distance is subtracted from.
    pub horizon: f32,
    /// Weight applied to closeness.
    pub distance_weight: f32,
    /// Weight applied to missing health.
    pub health_weight: f32,
    /// Bonus for opponents within striking range.
    pub adjacency_bonus: f32,
    /// Defenders ignore invaders at or beyond this Manhattan distance.
    pub detection_radius: u32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self {
            horizon: 64.0,
            distance_weight: 1.0,
            health_weight: 0.5,
            adjacency_bonus: 8.0,
            detection_radius: 10,
        }
    }
}

/// Pure system that turns roster snapshots into per-character commands.
#[derive(Debug, Default)]
pub struct Targeting {
    config: TargetingConfig,
    pathfinder: Pathfinder,
}

impl Targeting {
    /// Creates the system with the provided weights.
    #[must_use]
    pub fn new(config: TargetingConfig) -> Self {
        Self {
            config,
            pathfinder: Pathfinder::new(),
        }
    }

    /// Weights currently in use.
    #[must_use]
    pub const fn config(&self) -> &TargetingConfig {
        &self.config
    }

    /// Reports whether the character takes part in this tick's decisions.
    #[must_use]
    pub fn is_eligible(agent: &EntitySnapshot) -> bool {
        agent.faction.is_some()
            && agent.is_alive()
            && !agent.state.is_engaged()
            && agent.has_arrived()
    }

    /// Decides what the agent does this tick.
    ///
    /// Returns `None` when the agent is not eligible to act.
    pub fn decide<R>(
        &mut self,
        agent: &EntitySnapshot,
        roster: &RosterView,
        grid: GridView<'_>,
        rng: &mut R,
    ) -> Option<Command>
    where
        R: RandomSource + ?Sized,
    {
        if !Self::is_eligible(agent) {
            return None;
        }
        let entity = agent.id;

        if let Some(attacker) = engaging_attacker(agent, roster) {
            return Some(Command::FaceToward {
                entity,
                cell: attacker.cell,
            });
        }

        let Some(target) = self.select_target(agent, roster) else {
            return Some(Command::StandIdle { entity });
        };
        if agent.cell.chebyshev_distance(target.cell) <= 1 {
            return Some(Command::FaceToward {
                entity,
                cell: target.cell,
            });
        }

        let command = match self.pathfinder.next_step(grid, agent.cell, target.cell, rng) {
            NextStep::Move(to) => Command::MoveCharacter { entity, to },
            NextStep::Obstructed { obstacle, .. } => Command::BeginAttack {
                attacker: entity,
                target: obstacle,
            },
            NextStep::Blocked(_) | NextStep::Stuck => match adjacent_obstacle(grid, agent.cell) {
                Some(obstacle) => Command::BeginAttack {
                    attacker: entity,
                    target: obstacle,
                },
                None => Command::StandIdle { entity },
            },
        };
        Some(command)
    }

    /// Highest-scoring living opponent the agent is willing to pursue.
    ///
    /// Ties keep the opponent with the lowest handle.
    #[must_use]
    pub fn select_target<'a>(
        &self,
        agent: &EntitySnapshot,
        roster: &'a RosterView,
    ) -> Option<&'a EntitySnapshot> {
        let faction = agent.faction?;
        let mut best: Option<(f32, &EntitySnapshot)> = None;

        for candidate in roster.faction(faction.opponent()) {
            if !candidate.is_alive() {
                continue;
            }
            if faction == Faction::Defender
                && agent.cell.manhattan_distance(candidate.cell) >= self.config.detection_radius
            {
                continue;
            }

            let score = self.score(agent, candidate);
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }

        best.map(|(_, candidate)| candidate)
    }

    /// Score the agent assigns to the candidate.
    #[must_use]
    pub fn score(&self, agent: &EntitySnapshot, candidate: &EntitySnapshot) -> f32 {
        let distance = agent.cell.chebyshev_distance(candidate.cell);
        let closeness = self.config.horizon - distance as f32;
        let missing = 1.0 - candidate.health_fraction();
        let adjacency = if distance <= 1 {
            self.config.adjacency_bonus
        } else {
            0.0
        };
        self.config.distance_weight * closeness + self.config.health_weight * missing + adjacency
    }
}

fn engaging_attacker<'a>(
    agent: &EntitySnapshot,
    roster: &'a RosterView,
) -> Option<&'a EntitySnapshot> {
    let faction = agent.faction?;
    roster.faction(faction.opponent()).find(|opponent| {
        opponent.is_alive()
            && opponent.state == AnimationState::Attack
            && opponent.target == Some(agent.id)
    })
}

fn adjacent_obstacle(grid: GridView<'_>, cell: CellCoord) -> Option<EntityId> {
    DIRECTIONS[..4]
        .iter()
        .filter_map(|&(columns, rows)| cell.offset(columns, rows))
        .find_map(|neighbour| grid.obstacle_at(neighbour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsiege_core::{Archetype, DisplayPoint, EntityKind, Facing};
    use std::time::Duration;

    fn character(id: u32, faction: Faction, cell: CellCoord, health: u32) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(id),
            kind: EntityKind::Character,
            faction: Some(faction),
            archetype: Some(match faction {
                Faction::Defender => Archetype::Knight,
                Faction::Invader => Archetype::Skeleton,
            }),
            level: 1,
            cell,
            display: DisplayPoint::at_cell(cell),
            state: AnimationState::Idle,
            frame: 0,
            facing: Facing::Right,
            health,
            max_health: 50,
            target: None,
            attack_cooldown: Duration::ZERO,
        }
    }

    #[test]
    fn score_rewards_closeness_wounds_and_adjacency() {
        let targeting = Targeting::default();
        let agent = character(0, Faction::Invader, CellCoord::new(5, 5), 50);
        let adjacent = character(1, Faction::Defender, CellCoord::new(6, 6), 50);
        let wounded = character(2, Faction::Defender, CellCoord::new(8, 5), 25);

        assert_eq!(targeting.score(&agent, &adjacent), 63.0 + 8.0);
        assert_eq!(targeting.score(&agent, &wounded), 61.0 + 0.25);
    }

    #[test]
    fn ties_prefer_the_lowest_handle() {
        let targeting = Targeting::default();
        let agent = character(0, Faction::Invader, CellCoord::new(5, 5), 50);
        let roster = RosterView::from_snapshots(vec![
            character(7, Faction::Defender, CellCoord::new(2, 5), 50),
            character(3, Faction::Defender, CellCoord::new(8, 5), 50),
            agent.clone(),
        ]);
        let selected = targeting.select_target(&agent, &roster).map(|s| s.id);
        assert_eq!(selected, Some(EntityId::new(3)));
    }

    #[test]
    fn defenders_ignore_distant_invaders() {
        let targeting = Targeting::default();
        let agent = character(0, Faction::Defender, CellCoord::new(0, 0), 50);
        let roster = RosterView::from_snapshots(vec![
            agent.clone(),
            character(1, Faction::Invader, CellCoord::new(5, 5), 50),
        ]);
        assert!(targeting.select_target(&agent, &roster).is_none());

        let near = RosterView::from_snapshots(vec![
            agent.clone(),
            character(1, Faction::Invader, CellCoord::new(5, 4), 50),
        ]);
        assert!(targeting.select_target(&agent, &near).is_some());
    }

    #[test]
    fn dying_opponents_are_never_selected() {
        let targeting = Targeting::default();
        let agent = character(0, Faction::Invader, CellCoord::new(5, 5), 50);
        let mut dying = character(1, Faction::Defender, CellCoord::new(5, 6), 0);
        dying.state = AnimationState::Death;
        let roster = RosterView::from_snapshots(vec![agent.clone(), dying]);
        assert!(targeting.select_target(&agent, &roster).is_none());
    }

    #[test]
    fn engaged_or_travelling_agents_do_not_decide() {
        let mut targeting = Targeting::default();
        let config = gridsiege_core::GridConfig::default();
        let cells = vec![None; config.cell_count()];
        let grid = GridView::new(&cells, config);
        let mut rng = gridsiege_core::ScriptedRandom::new(vec![0.0]);

        let mut attacking = character(0, Faction::Invader, CellCoord::new(5, 5), 50);
        attacking.state = AnimationState::Attack;
        let roster = RosterView::from_snapshots(vec![attacking.clone()]);
        assert!(targeting.decide(&attacking, &roster, grid, &mut rng).is_none());

        let mut gliding = character(0, Faction::Invader, CellCoord::new(5, 5), 50);
        gliding.display = DisplayPoint::at_cell(CellCoord::new(4, 5));
        assert!(targeting.decide(&gliding, &roster, grid, &mut rng).is_none());
    }
}
