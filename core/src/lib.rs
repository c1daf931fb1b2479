#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridsiege engine.
//!
//! This crate defines the message surface that connects the orchestrator,
//! the authoritative world, and pure systems. Systems read immutable
//! snapshots and submit [`Command`] values describing desired mutations, the
//! world executes those commands via its `apply` entry point, and then reports
//! [`Event`] values describing what actually happened. Every expected failure
//! is expressed as a refusal event or a typed error rather than a panic.

mod animation;
mod random;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use animation::{AnimationCatalog, AnimationClip};
pub use random::{shuffle, RandomSource, ScriptedRandom, SeededRandom};

/// Largest delta a single tick may consume; longer stalls are clamped.
pub const MAX_TICK_DELTA: Duration = Duration::from_millis(50);

/// Growth of the invader multiplier per level above the first.
pub const THREAT_GROWTH_PER_LEVEL: f32 = 0.15;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Creates an invader of the provided archetype at the given cell.
    SpawnInvader {
        /// Archetype that determines stats and animation clips.
        archetype: Archetype,
        /// Level used to scale health and damage.
        level: u32,
        /// Cell the invader should occupy.
        cell: CellCoord,
    },
    /// Creates a defender at the given cell.
    PlaceDefender {
        /// Cell the defender should occupy.
        cell: CellCoord,
    },
    /// Creates a static obstacle at the given cell.
    PlaceObstacle {
        /// Cell the obstacle should occupy.
        cell: CellCoord,
        /// Damage the obstacle absorbs before it is destroyed.
        durability: u32,
    },
    /// Requests that a character step into an adjacent cell.
    MoveCharacter {
        /// Character attempting to move.
        entity: EntityId,
        /// Destination cell, which must neighbour the current cell.
        to: CellCoord,
    },
    /// Turns a character toward a cell without moving it.
    FaceToward {
        /// Character that should turn.
        entity: EntityId,
        /// Cell the character should face.
        cell: CellCoord,
    },
    /// Starts an attack animation against an adjacent entity.
    BeginAttack {
        /// Character initiating the attack.
        attacker: EntityId,
        /// Character or obstacle receiving the attack.
        target: EntityId,
    },
    /// Settles a character that has nothing to do this tick.
    StandIdle {
        /// Character that should rest.
        entity: EntityId,
    },
    /// Counts down attack cooldowns by the elapsed time.
    AdvanceCooldowns {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Advances display interpolation and every animation state machine.
    Animate {
        /// Simulated time that elapsed.
        dt: Duration,
    },
    /// Applies the result of a rolled strike.
    ResolveStrike {
        /// Character whose attack reached its impact frame.
        attacker: EntityId,
        /// Entity the attack was aimed at.
        target: EntityId,
        /// Band selected by the combat roll.
        outcome: StrikeOutcome,
    },
    /// Damages every living invader around a cell.
    StrikeArea {
        /// Cell at the centre of the effect.
        center: CellCoord,
        /// Chebyshev radius of the affected square.
        radius: u32,
        /// Damage applied to each invader caught in the area.
        damage: u32,
    },
    /// Restores a fraction of maximum health to every living defender.
    HealDefenders {
        /// Portion of maximum health restored, in `[0, 1]`.
        fraction: f32,
    },
    /// Removes entities whose death has fully played out.
    PurgeRemoved,
}

/// Events reported by the world and the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A character entered the grid.
    CharacterSpawned {
        /// Handle allocated for the character.
        entity: EntityId,
        /// Side the character fights for.
        faction: Faction,
        /// Archetype assigned to the character.
        archetype: Archetype,
        /// Cell the character occupies.
        cell: CellCoord,
    },
    /// An obstacle entered the grid.
    ObstaclePlaced {
        /// Handle allocated for the obstacle.
        entity: EntityId,
        /// Cell the obstacle occupies.
        cell: CellCoord,
    },
    /// A placement or spawn request was refused without mutating state.
    PlacementRejected {
        /// Cell named in the request.
        cell: CellCoord,
        /// Reason the request failed.
        reason: PlacementError,
    },
    /// A character stepped into a neighbouring cell.
    CharacterMoved {
        /// Character that moved.
        entity: EntityId,
        /// Cell occupied before the step.
        from: CellCoord,
        /// Cell occupied after the step.
        to: CellCoord,
    },
    /// A character started an attack animation.
    AttackStarted {
        /// Character attacking.
        attacker: EntityId,
        /// Entity under attack.
        target: EntityId,
    },
    /// An attack animation reached its archetype's impact frame.
    ImpactFrameReached {
        /// Character whose attack is landing.
        attacker: EntityId,
        /// Entity the attack is aimed at.
        target: EntityId,
    },
    /// A strike roll was resolved.
    StrikeResolved {
        /// Character that attacked.
        attacker: EntityId,
        /// Entity the attack was aimed at.
        target: EntityId,
        /// Band selected by the roll.
        outcome: StrikeOutcome,
    },
    /// Health was removed from an entity.
    DamageDealt {
        /// Character responsible, or `None` for player area effects.
        source: Option<EntityId>,
        /// Entity that lost health.
        target: EntityId,
        /// Health removed after clamping.
        amount: u32,
        /// Health left after the damage.
        remaining: u32,
    },
    /// An entity's health reached zero.
    EntityDied {
        /// Entity that died.
        entity: EntityId,
        /// Kind tag of the entity.
        kind: EntityKind,
        /// Faction of the entity, if it is a character.
        faction: Option<Faction>,
    },
    /// An entity left the grid and the arena.
    EntityRemoved {
        /// Entity that was purged.
        entity: EntityId,
    },
    /// Living defenders recovered health between levels.
    DefendersHealed {
        /// Number of defenders that recovered health.
        count: u32,
    },
    /// The player cast an area effect.
    AreaEffectCast {
        /// Cell at the centre of the effect.
        center: CellCoord,
        /// Number of invaders caught in the area.
        victims: u32,
    },
    /// A wave started spawning.
    WaveStarted {
        /// Level the wave belongs to.
        level: u32,
        /// One-based index of the wave within the level.
        wave: u32,
        /// Number of invaders queued for the wave.
        enemies: u32,
    },
    /// A wave finished spawning and every invader was removed.
    WaveCleared {
        /// Level the wave belongs to.
        level: u32,
        /// One-based index of the wave within the level.
        wave: u32,
    },
    /// The final wave of a level was cleared and the next level begins.
    LevelAdvanced {
        /// Level that is about to start.
        level: u32,
    },
    /// Every defender was removed.
    Defeat {
        /// Level at which the defence fell.
        level: u32,
        /// Wave at which the defence fell.
        wave: u32,
    },
    /// The final level was cleared.
    Victory {
        /// Last level cleared.
        level: u32,
    },
}

/// Reasons a placement or spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The cell lies outside the placeable area of the grid.
    #[error("cell lies outside the placeable area")]
    OutOfBounds,
    /// The cell already holds an entity.
    #[error("cell is already occupied")]
    Occupied,
}

/// Failures reported by the player command interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The target cell cannot receive the placement.
    #[error("placement rejected: {0}")]
    Placement(#[from] PlacementError),
    /// The resource balance does not cover the command's cost.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Cost of the command.
        required: u32,
        /// Balance at the time of the request.
        available: u32,
    },
    /// The simulation already ended in victory or defeat.
    #[error("the simulation has already ended")]
    SimulationOver,
}

/// Unique handle of an entity stored in the world arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Computes the Chebyshev distance, which treats diagonals as adjacent.
    #[must_use]
    pub fn chebyshev_distance(self, other: CellCoord) -> u32 {
        self.column
            .abs_diff(other.column)
            .max(self.row.abs_diff(other.row))
    }

    /// Returns the cell displaced by the signed offsets, if it stays non-negative.
    ///
    /// The result is not checked against any grid bounds.
    #[must_use]
    pub fn offset(self, columns: i32, rows: i32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(columns)?;
        let row = self.row.checked_add_signed(rows)?;
        Some(CellCoord::new(column, row))
    }
}

/// Continuous position used to interpolate motion between cells.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayPoint {
    /// Horizontal position measured in cells.
    pub column: f32,
    /// Vertical position measured in cells.
    pub row: f32,
}

impl DisplayPoint {
    /// Creates a display point resting on the provided cell.
    #[must_use]
    pub fn at_cell(cell: CellCoord) -> Self {
        Self {
            column: cell.column() as f32,
            row: cell.row() as f32,
        }
    }

    /// Euclidean distance to the centre of the provided cell.
    #[must_use]
    pub fn distance_to(self, cell: CellCoord) -> f32 {
        let target = Self::at_cell(cell);
        let dx = target.column - self.column;
        let dy = target.row - self.row;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Side a character fights for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Player-aligned characters.
    Defender,
    /// Hostile characters introduced by waves.
    Invader,
}

impl Faction {
    /// Faction on the opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Defender => Self::Invader,
            Self::Invader => Self::Defender,
        }
    }
}

/// Discriminates the two kinds of entities stored in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Animated, fighting entity.
    Character,
    /// Static blocker with durability.
    Obstacle,
}

/// Identifies the entity currently stored in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Occupant {
    /// Handle of the occupying entity.
    pub id: EntityId,
    /// Kind tag of the occupying entity.
    pub kind: EntityKind,
}

/// Archetypes that determine character stats and animation clips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Defender knight.
    Knight,
    /// Fast, fragile invader.
    FlyingEye,
    /// Slow, sturdy invader.
    Skeleton,
    /// Quick invader with a wild swing.
    Goblin,
    /// Slow invader with the most health.
    Mushroom,
}

impl Archetype {
    /// Invader archetypes in the order waves unlock them.
    pub const INVADERS: [Archetype; 4] = [
        Archetype::FlyingEye,
        Archetype::Skeleton,
        Archetype::Goblin,
        Archetype::Mushroom,
    ];

    /// Faction that fields this archetype.
    #[must_use]
    pub const fn faction(self) -> Faction {
        match self {
            Self::Knight => Faction::Defender,
            Self::FlyingEye | Self::Skeleton | Self::Goblin | Self::Mushroom => Faction::Invader,
        }
    }

    /// Base stats before any level scaling.
    #[must_use]
    pub const fn stats(self) -> ArchetypeStats {
        match self {
            Self::Knight => ArchetypeStats {
                max_health: 60,
                damage: 6,
                botch_damage: 3,
                speed: 3.0,
                attack_cooldown: Duration::from_millis(600),
                impact_frame: 2,
                combat: KNIGHT_COMBAT,
            },
            Self::FlyingEye => ArchetypeStats {
                max_health: 30,
                damage: 3,
                botch_damage: 5,
                speed: 4.0,
                attack_cooldown: Duration::from_millis(700),
                impact_frame: 6,
                combat: FLYING_EYE_COMBAT,
            },
            Self::Skeleton => ArchetypeStats {
                max_health: 50,
                damage: 4,
                botch_damage: 5,
                speed: 2.0,
                attack_cooldown: Duration::from_millis(900),
                impact_frame: 6,
                combat: SKELETON_COMBAT,
            },
            Self::Goblin => ArchetypeStats {
                max_health: 40,
                damage: 3,
                botch_damage: 5,
                speed: 3.5,
                attack_cooldown: Duration::from_millis(600),
                impact_frame: 5,
                combat: GOBLIN_COMBAT,
            },
            Self::Mushroom => ArchetypeStats {
                max_health: 70,
                damage: 5,
                botch_damage: 5,
                speed: 1.5,
                attack_cooldown: Duration::from_millis(1_000),
                impact_frame: 6,
                combat: MUSHROOM_COMBAT,
            },
        }
    }
}

/// Fixed per-archetype attributes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArchetypeStats {
    /// Health at level one.
    pub max_health: u32,
    /// Damage dealt by a clean hit at level one.
    pub damage: u32,
    /// Damage the attacker takes on a botched strike.
    pub botch_damage: u32,
    /// Display speed measured in cells per second.
    pub speed: f32,
    /// Minimum time between two attack starts.
    pub attack_cooldown: Duration,
    /// Frame of the attack clip on which damage is resolved.
    pub impact_frame: u32,
    /// Probability bands used when resolving strikes.
    pub combat: CombatProfile,
}

/// Probability bands consulted with one uniform roll per impact frame.
///
/// A roll below `hit_below` lands the designated damage, a roll below
/// `botch_below` injures the attacker instead, and a roll at or above
/// `critical_from` (when present) doubles the damage. Anything else misses.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    /// Upper bound of the clean-hit band.
    pub hit_below: f64,
    /// Upper bound of the botched-strike band.
    pub botch_below: f64,
    /// Lower bound of the critical band, if the archetype has one.
    pub critical_from: Option<f64>,
}

impl CombatProfile {
    /// Maps a roll in `[0, 1)` onto the profile's bands.
    #[must_use]
    pub fn resolve(&self, roll: f64) -> StrikeOutcome {
        if roll < self.hit_below {
            StrikeOutcome::Hit
        } else if roll < self.botch_below {
            StrikeOutcome::Botched
        } else if self.critical_from.is_some_and(|from| roll >= from) {
            StrikeOutcome::Critical
        } else {
            StrikeOutcome::Miss
        }
    }
}

/// Defender bands: 80% hit, 5% botch, 5% miss, 10% critical.
pub const KNIGHT_COMBAT: CombatProfile = CombatProfile {
    hit_below: 0.80,
    botch_below: 0.85,
    critical_from: Some(0.90),
};

/// Flying eye bands: 90% hit, 10% botch.
pub const FLYING_EYE_COMBAT: CombatProfile = CombatProfile {
    hit_below: 0.90,
    botch_below: 1.0,
    critical_from: None,
};

/// Skeleton bands: 90% hit, 10% botch.
pub const SKELETON_COMBAT: CombatProfile = CombatProfile {
    hit_below: 0.90,
    botch_below: 1.0,
    critical_from: None,
};

/// Goblin bands: 85% hit, 10% botch, 5% miss.
pub const GOBLIN_COMBAT: CombatProfile = CombatProfile {
    hit_below: 0.85,
    botch_below: 0.95,
    critical_from: None,
};

/// Mushroom bands: 90% hit, 10% botch.
pub const MUSHROOM_COMBAT: CombatProfile = CombatProfile {
    hit_below: 0.90,
    botch_below: 1.0,
    critical_from: None,
};

/// Band selected by a strike roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrikeOutcome {
    /// Full designated damage to the target.
    Hit,
    /// Double damage to the target.
    Critical,
    /// The attacker injures itself.
    Botched,
    /// No effect.
    Miss,
}

/// Multiplier applied to invader health and damage at the given level.
#[must_use]
pub fn threat_multiplier(level: u32) -> f32 {
    1.0 + THREAT_GROWTH_PER_LEVEL * level.saturating_sub(1) as f32
}

/// Scales a base value by the level multiplier, never dropping below one.
#[must_use]
pub fn scale_for_level(base: u32, level: u32) -> u32 {
    let scaled = (base as f32 * threat_multiplier(level)).round();
    (scaled as u32).max(1)
}

/// Animation states shared by every character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    /// Resting in place.
    Idle,
    /// Travelling between cells.
    Run,
    /// Playing an attack.
    Attack,
    /// Reacting to damage.
    Hit,
    /// Terminal state played once before removal.
    Death,
}

impl AnimationState {
    /// Time each frame of the state stays on screen.
    #[must_use]
    pub const fn frame_duration(self) -> Duration {
        match self {
            Self::Attack | Self::Hit => Duration::from_millis(60),
            Self::Idle | Self::Run | Self::Death => Duration::from_millis(100),
        }
    }

    /// Reports whether the state is the absorbing death state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Death)
    }

    /// Reports whether the character is busy attacking or recoiling.
    #[must_use]
    pub const fn is_engaged(self) -> bool {
        matches!(self, Self::Attack | Self::Hit)
    }
}

/// Horizontal orientation of a character sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Looking toward decreasing columns.
    Left,
    /// Looking toward increasing columns.
    Right,
}

/// Dimensions and walkability rules of the battlefield.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns in the grid.
    pub columns: u32,
    /// Number of rows in the grid.
    pub rows: u32,
    /// Rows at the top of the grid that are never walkable.
    pub reserved_top_rows: u32,
    /// Distance from the playable edges inside which player placements must land.
    pub placement_margin: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 32,
            rows: 14,
            reserved_top_rows: 2,
            placement_margin: 0,
        }
    }
}

impl GridConfig {
    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether the cell lies inside the grid and below the reserved rows.
    #[must_use]
    pub const fn is_playable(&self, cell: CellCoord) -> bool {
        self.contains(cell) && cell.row() >= self.reserved_top_rows
    }

    /// Reports whether the cell lies at least `margin` cells inside the playable area.
    #[must_use]
    pub fn is_within_margin(&self, cell: CellCoord, margin: u32) -> bool {
        let top = self.reserved_top_rows.saturating_add(margin);
        cell.column() >= margin
            && cell.row() >= top
            && cell.column().saturating_add(margin) < self.columns
            && cell.row().saturating_add(margin) < self.rows
    }

    /// Row-major index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [Option<Occupant>],
    config: GridConfig,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>], config: GridConfig) -> Self {
        Self { cells, config }
    }

    /// Configuration describing the grid's dimensions.
    #[must_use]
    pub const fn config(&self) -> GridConfig {
        self.config
    }

    /// Provides the dimensions of the underlying grid as `(columns, rows)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.config.columns, self.config.rows)
    }

    /// Returns the entity occupying the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.config
            .index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Returns the obstacle stored in the cell, if any.
    #[must_use]
    pub fn obstacle_at(&self, cell: CellCoord) -> Option<EntityId> {
        self.occupant(cell)
            .filter(|occupant| occupant.kind == EntityKind::Obstacle)
            .map(|occupant| occupant.id)
    }

    /// Reports whether paths may cross the cell.
    ///
    /// Characters do not block walkability; obstacles and the reserved top
    /// rows always do.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.config.is_playable(cell) && self.obstacle_at(cell).is_none()
    }

    /// Reports whether a character could step into the cell right now.
    #[must_use]
    pub fn is_empty_for_move(&self, cell: CellCoord) -> bool {
        self.config.is_playable(cell) && self.occupant(cell).is_none()
    }
}

/// Immutable representation of a single entity used for queries and rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Handle of the entity.
    pub id: EntityId,
    /// Kind tag of the entity.
    pub kind: EntityKind,
    /// Faction of a character; `None` for obstacles.
    pub faction: Option<Faction>,
    /// Archetype of a character; `None` for obstacles.
    pub archetype: Option<Archetype>,
    /// Level used to scale the character's stats.
    pub level: u32,
    /// Cell currently occupied.
    pub cell: CellCoord,
    /// Interpolated position for smooth motion.
    pub display: DisplayPoint,
    /// Current animation state.
    pub state: AnimationState,
    /// Current frame index within the state.
    pub frame: u32,
    /// Horizontal orientation.
    pub facing: Facing,
    /// Current health or durability.
    pub health: u32,
    /// Maximum health or durability.
    pub max_health: u32,
    /// Entity the character is currently engaging.
    pub target: Option<EntityId>,
    /// Time left before the character may attack again.
    pub attack_cooldown: Duration,
}

impl EntitySnapshot {
    /// Reports whether the entity still takes part in the fight.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0 && !self.state.is_terminal()
    }

    /// Reports whether the interpolated position has reached the stored cell.
    #[must_use]
    pub fn has_arrived(&self) -> bool {
        self.display == DisplayPoint::at_cell(self.cell)
    }

    /// Remaining health as a fraction of the maximum.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }
}

/// Read-only snapshot of every entity in the arena.
#[derive(Clone, Debug, Default)]
pub struct RosterView {
    snapshots: Vec<EntitySnapshot>,
}

impl RosterView {
    /// Creates a new roster view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over every snapshot in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the characters of one faction in ascending handle order.
    pub fn faction(&self, faction: Faction) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.faction == Some(faction))
    }

    /// Iterator over the obstacles in ascending handle order.
    pub fn obstacles(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind == EntityKind::Obstacle)
    }

    /// Looks up a snapshot by handle.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of entities of the faction still in the roster, dying or not.
    #[must_use]
    pub fn count(&self, faction: Faction) -> usize {
        self.faction(faction).count()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}
