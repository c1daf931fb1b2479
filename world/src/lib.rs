#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridsiege.
//!
//! The world owns the entity arena and the occupancy grid. It only changes in
//! response to [`Command`] values passed to [`apply`], and it reports every
//! observable change as an [`Event`].

mod animation;
mod entity;
mod grid;

use std::{collections::BTreeMap, time::Duration};

use gridsiege_core::{
    scale_for_level, AnimationCatalog, AnimationState, Archetype, CellCoord, Command, EntityId,
    Event, Faction, GridConfig, Occupant, PlacementError, StrikeOutcome,
};
use tracing::debug;

use entity::Entity;
use grid::OccupancyGrid;

/// Represents the authoritative Gridsiege battlefield.
#[derive(Debug)]
pub struct World {
    config: GridConfig,
    catalog: AnimationCatalog,
    grid: OccupancyGrid,
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: u32,
}

impl World {
    /// Creates an empty battlefield with the provided layout and animation catalog.
    #[must_use]
    pub fn new(config: GridConfig, catalog: AnimationCatalog) -> Self {
        Self {
            config,
            catalog,
            grid: OccupancyGrid::new(config),
            entities: BTreeMap::new(),
            next_entity_id: 0,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.saturating_add(1);
        id
    }

    fn insert(
        &mut self,
        cell: CellCoord,
        margin: u32,
        build: impl FnOnce(EntityId) -> Entity,
        out_events: &mut Vec<Event>,
    ) -> Option<EntityId> {
        if let Err(reason) = self.grid.can_place(cell, margin) {
            debug!(?cell, %reason, "placement refused");
            out_events.push(Event::PlacementRejected { cell, reason });
            return None;
        }

        let id = self.allocate_id();
        let entity = build(id);
        let occupied = self.grid.occupy(
            cell,
            Occupant {
                id,
                kind: entity.kind(),
            },
        );
        debug_assert!(occupied, "validated cell must accept the occupant");
        let _ = self.entities.insert(id, entity);
        Some(id)
    }

    fn spawn_character(
        &mut self,
        cell: CellCoord,
        margin: u32,
        faction: Faction,
        archetype: Archetype,
        level: u32,
        out_events: &mut Vec<Event>,
    ) {
        let level = level.max(1);
        let stats = archetype.stats();
        let max_health = scale_for_level(stats.max_health, level);
        let damage = scale_for_level(stats.damage, level);
        let spawned = self.insert(
            cell,
            margin,
            |id| Entity::character(id, cell, faction, archetype, level, max_health, damage),
            out_events,
        );

        if let Some(entity) = spawned {
            debug!(entity = entity.get(), ?faction, ?archetype, ?cell, "character spawned");
            out_events.push(Event::CharacterSpawned {
                entity,
                faction,
                archetype,
                cell,
            });
        }
    }

    fn deal_damage(
        &mut self,
        source: Option<EntityId>,
        target: EntityId,
        amount: u32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(entity) = self.entities.get_mut(&target) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }

        let report = entity.take_damage(amount);
        out_events.push(Event::DamageDealt {
            source,
            target,
            amount: report.amount,
            remaining: report.remaining,
        });
        if report.died {
            debug!(entity = target.get(), kind = ?entity.kind(), "entity died");
            out_events.push(Event::EntityDied {
                entity: target,
                kind: entity.kind(),
                faction: entity.faction(),
            });
        }
    }

    fn begin_attack(&mut self, attacker: EntityId, target: EntityId, out_events: &mut Vec<Event>) {
        if attacker == target {
            return;
        }
        let Some((target_cell, target_faction)) = self
            .entities
            .get(&target)
            .filter(|entity| entity.is_alive())
            .map(|entity| (entity.cell, entity.faction()))
        else {
            return;
        };
        let Some(entity) = self.entities.get_mut(&attacker) else {
            return;
        };
        if !entity.is_alive() || entity.cell.chebyshev_distance(target_cell) > 1 {
            debug!(attacker = attacker.get(), target = target.get(), "attack refused");
            return;
        }
        let Some(character) = entity.as_character_mut() else {
            return;
        };
        if character.animator.state().is_engaged()
            || !character.attack_cooldown.is_zero()
            || target_faction == Some(character.faction)
        {
            return;
        }

        character.target = Some(target);
        character.attack_cooldown = character.archetype.stats().attack_cooldown;
        let _ = character.animator.transition(AnimationState::Attack);
        entity.face_toward(target_cell);
        out_events.push(Event::AttackStarted { attacker, target });
    }

    fn move_character(&mut self, id: EntityId, to: CellCoord, out_events: &mut Vec<Event>) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        let from = entity.cell;
        let free_to_move = entity.is_alive()
            && entity
                .as_character()
                .is_some_and(|character| !character.animator.state().is_engaged());
        if !free_to_move || from.chebyshev_distance(to) != 1 || !self.grid.relocate(id, from, to) {
            debug!(entity = id.get(), ?from, ?to, "move refused");
            return;
        }

        entity.face_toward(to);
        entity.cell = to;
        if let Some(character) = entity.as_character_mut() {
            let _ = character.animator.transition(AnimationState::Run);
        }
        out_events.push(Event::CharacterMoved { entity: id, from, to });
    }

    fn animate(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let catalog = &self.catalog;
        for entity in self.entities.values_mut() {
            let resting = entity.has_arrived();
            entity.glide(dt);
            if resting {
                entity.settle();
            }

            let target = entity.as_character().and_then(|character| character.target);
            let report = entity.animate(dt, catalog);
            if report.impact {
                if let Some(target) = target {
                    out_events.push(Event::ImpactFrameReached {
                        attacker: entity.id,
                        target,
                    });
                }
            }
        }
    }

    fn resolve_strike(
        &mut self,
        attacker: EntityId,
        target: EntityId,
        outcome: StrikeOutcome,
        out_events: &mut Vec<Event>,
    ) {
        let Some((damage, botch_damage)) = self
            .entities
            .get(&attacker)
            .filter(|entity| entity.is_alive())
            .and_then(Entity::as_character)
            .map(|character| (character.damage, character.botch_damage))
        else {
            return;
        };
        if !self.entities.get(&target).is_some_and(Entity::is_alive) {
            return;
        }

        out_events.push(Event::StrikeResolved {
            attacker,
            target,
            outcome,
        });
        match outcome {
            StrikeOutcome::Hit => self.deal_damage(Some(attacker), target, damage, out_events),
            StrikeOutcome::Critical => {
                self.deal_damage(Some(attacker), target, damage.saturating_mul(2), out_events);
            }
            StrikeOutcome::Botched => {
                self.deal_damage(Some(attacker), attacker, botch_damage, out_events);
            }
            StrikeOutcome::Miss => {}
        }
    }

    fn strike_area(
        &mut self,
        center: CellCoord,
        radius: u32,
        damage: u32,
        out_events: &mut Vec<Event>,
    ) {
        if !self.config.contains(center) {
            out_events.push(Event::PlacementRejected {
                cell: center,
                reason: PlacementError::OutOfBounds,
            });
            return;
        }

        let victims: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| {
                entity.is_alive()
                    && entity.faction() == Some(Faction::Invader)
                    && entity.cell.chebyshev_distance(center) <= radius
            })
            .map(|entity| entity.id)
            .collect();

        out_events.push(Event::AreaEffectCast {
            center,
            victims: u32::try_from(victims.len()).unwrap_or(u32::MAX),
        });
        for victim in victims {
            self.deal_damage(None, victim, damage, out_events);
        }
    }

    fn heal_defenders(&mut self, fraction: f32, out_events: &mut Vec<Event>) {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut count = 0_u32;
        for entity in self.entities.values_mut() {
            if !entity.is_alive() || entity.faction() != Some(Faction::Defender) {
                continue;
            }
            let restored = (entity.max_health as f32 * fraction).ceil() as u32;
            entity.health = entity.health.saturating_add(restored).min(entity.max_health);
            count += 1;
        }
        out_events.push(Event::DefendersHealed { count });
    }

    fn purge_removed(&mut self, out_events: &mut Vec<Event>) {
        let removed: Vec<EntityId> = self
            .entities
            .values()
            .filter(|entity| entity.removal_pending)
            .map(|entity| entity.id)
            .collect();
        if removed.is_empty() {
            return;
        }

        for id in &removed {
            if let Some(entity) = self.entities.remove(id) {
                let _ = self.grid.vacate(entity.cell, *id);
                debug!(entity = id.get(), kind = ?entity.kind(), "entity removed");
                out_events.push(Event::EntityRemoved { entity: *id });
            }
        }

        for entity in self.entities.values_mut() {
            if let Some(character) = entity.as_character_mut() {
                if character
                    .target
                    .is_some_and(|target| removed.contains(&target))
                {
                    character.target = None;
                }
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(GridConfig::default(), AnimationCatalog::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Requests that cannot be honoured leave the world untouched. Placements
/// report a [`Event::PlacementRejected`]; illegal moves and stale attack
/// requests are dropped silently.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnInvader {
            archetype,
            level,
            cell,
        } => world.spawn_character(cell, 0, Faction::Invader, archetype, level, out_events),
        Command::PlaceDefender { cell } => {
            let margin = world.config.placement_margin;
            world.spawn_character(
                cell,
                margin,
                Faction::Defender,
                Archetype::Knight,
                1,
                out_events,
            );
        }
        Command::PlaceObstacle { cell, durability } => {
            let margin = world.config.placement_margin;
            let durability = durability.max(1);
            let placed = world.insert(
                cell,
                margin,
                |id| Entity::obstacle(id, cell, durability),
                out_events,
            );
            if let Some(entity) = placed {
                debug!(entity = entity.get(), ?cell, "obstacle placed");
                out_events.push(Event::ObstaclePlaced { entity, cell });
            }
        }
        Command::MoveCharacter { entity, to } => world.move_character(entity, to, out_events),
        Command::FaceToward { entity, cell } => {
            if let Some(entity) = world.entities.get_mut(&entity) {
                entity.face_toward(cell);
                entity.settle();
            }
        }
        Command::BeginAttack { attacker, target } => {
            world.begin_attack(attacker, target, out_events);
        }
        Command::StandIdle { entity } => {
            if let Some(entity) = world.entities.get_mut(&entity) {
                entity.settle();
            }
        }
        Command::AdvanceCooldowns { dt } => {
            for entity in world.entities.values_mut() {
                if let Some(character) = entity.as_character_mut() {
                    character.attack_cooldown = character.attack_cooldown.saturating_sub(dt);
                }
            }
        }
        Command::Animate { dt } => world.animate(dt, out_events),
        Command::ResolveStrike {
            attacker,
            target,
            outcome,
        } => world.resolve_strike(attacker, target, outcome, out_events),
        Command::StrikeArea {
            center,
            radius,
            damage,
        } => world.strike_area(center, radius, damage, out_events),
        Command::HealDefenders { fraction } => world.heal_defenders(fraction, out_events),
        Command::PurgeRemoved => world.purge_removed(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridsiege_core::{
        AnimationCatalog, EntityId, EntitySnapshot, Faction, GridConfig, GridView, RosterView,
    };

    use super::World;

    /// Layout the world was created with.
    #[must_use]
    pub fn grid_config(world: &World) -> GridConfig {
        world.config
    }

    /// Animation catalog consulted by the state machines.
    #[must_use]
    pub fn animation_catalog(world: &World) -> &AnimationCatalog {
        &world.catalog
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn grid_view(world: &World) -> GridView<'_> {
        world.grid.view()
    }

    /// Captures a snapshot of every entity in ascending handle order.
    #[must_use]
    pub fn roster_view(world: &World) -> RosterView {
        RosterView::from_snapshots(
            world
                .entities
                .values()
                .map(|entity| entity.snapshot())
                .collect(),
        )
    }

    /// Captures a snapshot of a single entity.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world.entities.get(&id).map(|entity| entity.snapshot())
    }

    /// Number of characters of the faction still present, including the dying.
    #[must_use]
    pub fn roster_count(world: &World, faction: Faction) -> usize {
        world
            .entities
            .values()
            .filter(|entity| entity.faction() == Some(faction))
            .count()
    }

    /// Number of characters of the faction that are still fighting.
    #[must_use]
    pub fn living_count(world: &World, faction: Faction) -> usize {
        world
            .entities
            .values()
            .filter(|entity| entity.faction() == Some(faction) && entity.is_alive())
            .count()
    }

    /// Verifies that the occupancy grid and the arena agree on every position.
    #[must_use]
    pub fn occupancy_is_consistent(world: &World) -> bool {
        let config = world.config;
        let mut occupied = 0_usize;
        for (index, occupant) in world.grid.occupied() {
            occupied += 1;
            let Some(entity) = world.entities.get(&occupant.id) else {
                return false;
            };
            if entity.kind() != occupant.kind || config.index(entity.cell) != Some(index) {
                return false;
            }
        }

        occupied == world.entities.len()
            && world.entities.values().all(|entity| {
                world
                    .grid
                    .occupant(entity.cell)
                    .is_some_and(|occupant| occupant.id == entity.id)
            })
    }
}
