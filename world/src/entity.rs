//! Arena records for characters and obstacles.

use std::time::Duration;

use gridsiege_core::{
    AnimationCatalog, AnimationState, Archetype, CellCoord, DisplayPoint, EntityId, EntityKind,
    EntitySnapshot, Faction, Facing,
};

use crate::animation::{Animator, FrameReport};

#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) cell: CellCoord,
    pub(crate) display: DisplayPoint,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) removal_pending: bool,
    pub(crate) body: Body,
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Obstacle,
    Character(Character),
}

#[derive(Clone, Debug)]
pub(crate) struct Character {
    pub(crate) faction: Faction,
    pub(crate) archetype: Archetype,
    pub(crate) level: u32,
    pub(crate) animator: Animator,
    pub(crate) facing: Facing,
    pub(crate) target: Option<EntityId>,
    pub(crate) attack_cooldown: Duration,
    pub(crate) damage: u32,
    pub(crate) botch_damage: u32,
}

/// Result of removing health from an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DamageReport {
    pub(crate) amount: u32,
    pub(crate) remaining: u32,
    pub(crate) died: bool,
}

impl Entity {
    pub(crate) fn character(
        id: EntityId,
        cell: CellCoord,
        faction: Faction,
        archetype: Archetype,
        level: u32,
        max_health: u32,
        damage: u32,
    ) -> Self {
        let facing = match faction {
            Faction::Defender => Facing::Right,
            Faction::Invader => Facing::Left,
        };
        Self {
            id,
            cell,
            display: DisplayPoint::at_cell(cell),
            health: max_health,
            max_health,
            removal_pending: false,
            body: Body::Character(Character {
                faction,
                archetype,
                level,
                animator: Animator::new(),
                facing,
                target: None,
                attack_cooldown: Duration::ZERO,
                damage,
                botch_damage: archetype.stats().botch_damage,
            }),
        }
    }

    pub(crate) fn obstacle(id: EntityId, cell: CellCoord, durability: u32) -> Self {
        Self {
            id,
            cell,
            display: DisplayPoint::at_cell(cell),
            health: durability,
            max_health: durability,
            removal_pending: false,
            body: Body::Obstacle,
        }
    }

    pub(crate) const fn kind(&self) -> EntityKind {
        match self.body {
            Body::Obstacle => EntityKind::Obstacle,
            Body::Character(_) => EntityKind::Character,
        }
    }

    pub(crate) fn faction(&self) -> Option<Faction> {
        self.as_character().map(|character| character.faction)
    }

    pub(crate) fn as_character(&self) -> Option<&Character> {
        match &self.body {
            Body::Character(character) => Some(character),
            Body::Obstacle => None,
        }
    }

    pub(crate) fn as_character_mut(&mut self) -> Option<&mut Character> {
        match &mut self.body {
            Body::Character(character) => Some(character),
            Body::Obstacle => None,
        }
    }

    pub(crate) fn state(&self) -> AnimationState {
        self.as_character()
            .map_or(AnimationState::Idle, |character| character.animator.state())
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.health > 0 && !self.state().is_terminal()
    }

    pub(crate) fn has_arrived(&self) -> bool {
        self.display == DisplayPoint::at_cell(self.cell)
    }

    /// Removes up to `amount` health and starts the matching reaction.
    pub(crate) fn take_damage(&mut self, amount: u32) -> DamageReport {
        let dealt = amount.min(self.health);
        self.health -= dealt;
        let died = self.health == 0;

        match &mut self.body {
            Body::Obstacle if died => self.removal_pending = true,
            Body::Obstacle => {}
            Body::Character(character) if died => {
                let _ = character.animator.transition(AnimationState::Death);
                character.target = None;
            }
            Body::Character(character) => {
                let _ = character.animator.transition(AnimationState::Hit);
            }
        }

        DamageReport {
            amount: dealt,
            remaining: self.health,
            died,
        }
    }

    /// Drops a running character back to idle once it rests on its cell.
    pub(crate) fn settle(&mut self) {
        let arrived = self.has_arrived();
        if let Some(character) = self.as_character_mut() {
            if arrived && character.animator.state() == AnimationState::Run {
                let _ = character.animator.transition(AnimationState::Idle);
            }
        }
    }

    /// Turns the sprite toward the cell when it lies to either side.
    pub(crate) fn face_toward(&mut self, cell: CellCoord) {
        let column = self.cell.column();
        if let Some(character) = self.as_character_mut() {
            if cell.column() > column {
                character.facing = Facing::Right;
            } else if cell.column() < column {
                character.facing = Facing::Left;
            }
        }
    }

    /// Moves the display point toward the stored cell at the archetype's speed.
    pub(crate) fn glide(&mut self, dt: Duration) {
        let Some(character) = self.as_character() else {
            return;
        };
        let step = character.archetype.stats().speed * dt.as_secs_f32();
        let distance = self.display.distance_to(self.cell);
        if distance <= step || distance <= f32::EPSILON {
            self.display = DisplayPoint::at_cell(self.cell);
            return;
        }

        let target = DisplayPoint::at_cell(self.cell);
        let ratio = step / distance;
        self.display.column += (target.column - self.display.column) * ratio;
        self.display.row += (target.row - self.display.row) * ratio;
    }

    /// Advances the character's clip, returning what happened along the way.
    pub(crate) fn animate(&mut self, dt: Duration, catalog: &AnimationCatalog) -> FrameReport {
        let moving = !self.has_arrived();
        let Some(character) = self.as_character_mut() else {
            return FrameReport::default();
        };
        let frames = catalog.frame_count(character.archetype, character.animator.state());
        let impact_frame = character.archetype.stats().impact_frame;
        let report = character
            .animator
            .advance(dt, frames, impact_frame, moving);

        if report.concluded {
            character.target = None;
        }
        if report.removal_ready {
            self.removal_pending = true;
        }
        report
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        let character = self.as_character();
        EntitySnapshot {
            id: self.id,
            kind: self.kind(),
            faction: character.map(|character| character.faction),
            archetype: character.map(|character| character.archetype),
            level: character.map_or(0, |character| character.level),
            cell: self.cell,
            display: self.display,
            state: self.state(),
            frame: character.map_or(0, |character| character.animator.frame()),
            facing: character.map_or(Facing::Right, |character| character.facing),
            health: self.health,
            max_health: self.max_health,
            target: character.and_then(|character| character.target),
            attack_cooldown: character
                .map_or(Duration::ZERO, |character| character.attack_cooldown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knight() -> Entity {
        Entity::character(
            EntityId::new(1),
            CellCoord::new(2, 2),
            Faction::Defender,
            Archetype::Knight,
            1,
            60,
            6,
        )
    }

    #[test]
    fn damage_clamps_and_kills_once() {
        let mut entity = knight();
        let first = entity.take_damage(50);
        assert_eq!(first.remaining, 10);
        assert!(!first.died);
        assert_eq!(entity.state(), AnimationState::Hit);

        let second = entity.take_damage(25);
        assert_eq!(second.amount, 10);
        assert!(second.died);
        assert_eq!(entity.state(), AnimationState::Death);
        assert!(!entity.is_alive());
    }

    #[test]
    fn destroyed_obstacle_is_marked_for_removal() {
        let mut obstacle = Entity::obstacle(EntityId::new(3), CellCoord::new(1, 2), 10);
        assert!(!obstacle.take_damage(4).died);
        assert!(!obstacle.removal_pending);
        assert!(obstacle.take_damage(6).died);
        assert!(obstacle.removal_pending);
    }

    #[test]
    fn glide_snaps_exactly_onto_the_cell() {
        let mut entity = knight();
        entity.display = DisplayPoint::at_cell(CellCoord::new(1, 2));
        assert!(!entity.has_arrived());

        entity.glide(Duration::from_millis(100));
        assert!(!entity.has_arrived());
        assert!(entity.display.column > 1.0);

        entity.glide(Duration::from_millis(300));
        assert!(entity.has_arrived());
    }

    #[test]
    fn facing_follows_horizontal_direction_only() {
        let mut entity = knight();
        entity.face_toward(CellCoord::new(0, 2));
        assert_eq!(entity.snapshot().facing, Facing::Left);
        entity.face_toward(CellCoord::new(2, 5));
        assert_eq!(entity.snapshot().facing, Facing::Left);
        entity.face_toward(CellCoord::new(3, 1));
        assert_eq!(entity.snapshot().facing, Facing::Right);
    }
}
