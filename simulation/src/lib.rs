#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick orchestrator that composes the world and the systems into one
//! deterministic simulation, together with the player command interface and
//! the resource balance that funds it.

mod config;

use std::{mem, time::Duration};

pub use config::{BootstrapConfig, ConfigError, EconomyConfig, SimulationConfig};
pub use gridsiege_system_waves::WavePhase;

use gridsiege_core::{
    threat_multiplier, CellCoord, Command, CommandError, EntityId, Event, Faction, GridConfig,
    PlacementError, RandomSource, RosterView, SeededRandom, MAX_TICK_DELTA,
};
use gridsiege_system_combat::Combat;
use gridsiege_system_targeting::Targeting;
use gridsiege_system_waves::{WaveProgress, WaveScheduler};
use gridsiege_world::{self as world, query, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Final result of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every defender was removed from the field.
    Defeat,
    /// The last wave of the last level was cleared.
    Victory,
}

/// Running totals collected over a run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Invaders killed.
    pub kills: u32,
    /// Resource spent on player commands.
    pub gold_spent: u32,
    /// Highest invader multiplier fielded so far.
    pub peak_threat: f32,
    /// Ticks processed while running.
    pub ticks: u64,
}

impl Default for SimulationStats {
    fn default() -> Self {
        Self {
            kills: 0,
            gold_spent: 0,
            peak_threat: threat_multiplier(1),
            ticks: 0,
        }
    }
}

/// Summary for HUD consumers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Phase of the wave state machine.
    pub phase: WavePhase,
    /// Current level.
    pub level: u32,
    /// Current or upcoming wave within the level.
    pub wave: u32,
    /// Waves that make up a level.
    pub waves_per_level: u32,
    /// Resource balance.
    pub gold: u32,
    /// Defenders still fighting.
    pub defenders: usize,
    /// Invaders still fighting.
    pub invaders: usize,
    /// Invaders waiting to spawn.
    pub queued: usize,
    /// Time before the next wave, if a countdown is running.
    pub countdown: Option<Duration>,
    /// Result, once the run has ended.
    pub outcome: Option<Outcome>,
    /// Whether ticks are currently ignored.
    pub paused: bool,
    /// Running totals.
    pub stats: SimulationStats,
}

/// Simulation context owning the world, the systems and the random source.
#[derive(Debug)]
pub struct Simulation<R = SeededRandom> {
    config: SimulationConfig,
    world: World,
    rng: R,
    targeting: Targeting,
    combat: Combat,
    waves: WaveScheduler,
    gold: u32,
    stats: SimulationStats,
    outcome: Option<Outcome>,
    paused: bool,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Simulation<SeededRandom> {
    /// Creates a run seeded from `config.seed`.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let rng = SeededRandom::from_seed(config.seed);
        Self::with_random(config, rng)
    }
}

impl<R> Simulation<R>
where
    R: RandomSource,
{
    /// Creates a run drawing from the provided random source.
    ///
    /// The bootstrap roster is placed immediately; its events are returned by
    /// the first call to [`Simulation::tick`].
    pub fn with_random(config: SimulationConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut simulation = Self {
            world: World::new(config.grid, config.animations.clone()),
            targeting: Targeting::new(config.targeting),
            combat: Combat::new(),
            waves: WaveScheduler::new(config.waves),
            gold: config.economy.starting_gold,
            stats: SimulationStats::default(),
            outcome: None,
            paused: false,
            events: Vec::new(),
            commands: Vec::new(),
            rng,
            config,
        };
        simulation.bootstrap();
        Ok(simulation)
    }

    /// Configuration the run was created with.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Read-only access to the world for [`query`] functions.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Snapshot of every entity in ascending handle order.
    #[must_use]
    pub fn roster(&self) -> RosterView {
        query::roster_view(&self.world)
    }

    /// Current resource balance.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Result of the run, once decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Reports whether ticks are currently ignored.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Halts or resumes tick processing. Player commands stay available.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!(paused, "simulation pause toggled");
        }
        self.paused = paused;
    }

    /// Summary for HUD consumers.
    #[must_use]
    pub fn status(&self) -> SimulationStatus {
        SimulationStatus {
            phase: self.waves.phase(),
            level: self.waves.level(),
            wave: self.waves.wave(),
            waves_per_level: self.config.waves.waves_per_level,
            gold: self.gold,
            defenders: query::living_count(&self.world, Faction::Defender),
            invaders: query::living_count(&self.world, Faction::Invader),
            queued: self.waves.queued(),
            countdown: self.waves.countdown(),
            outcome: self.outcome,
            paused: self.paused,
            stats: self.stats,
        }
    }

    /// Throws the current run away and starts over from the configuration.
    ///
    /// The random source keeps its position in the stream.
    pub fn restart(&mut self) {
        info!("simulation restarted");
        self.world = World::new(self.config.grid, self.config.animations.clone());
        self.targeting = Targeting::new(self.config.targeting);
        self.combat = Combat::new();
        self.waves = WaveScheduler::new(self.config.waves);
        self.gold = self.config.economy.starting_gold;
        self.stats = SimulationStats::default();
        self.outcome = None;
        self.paused = false;
        self.events.clear();
        self.commands.clear();
        self.bootstrap();
    }

    /// Applies a command directly, bypassing the resource balance.
    ///
    /// Resulting events are returned by the next call to [`Simulation::tick`].
    pub fn submit(&mut self, command: Command) {
        self.apply(command);
    }

    /// Places a defender, paying for it on success.
    pub fn place_defender(&mut self, cell: CellCoord) -> Result<EntityId, CommandError> {
        let cost = self.config.economy.defender_cost;
        self.ensure_affordable(cost)?;
        let entity = self.place(Command::PlaceDefender { cell })?;
        self.debit(cost);
        Ok(entity)
    }

    /// Places an obstacle, paying for it on success.
    pub fn place_obstacle(&mut self, cell: CellCoord) -> Result<EntityId, CommandError> {
        let economy = self.config.economy;
        self.ensure_affordable(economy.obstacle_cost)?;
        let entity = self.place(Command::PlaceObstacle {
            cell,
            durability: economy.obstacle_durability,
        })?;
        self.debit(economy.obstacle_cost);
        Ok(entity)
    }

    /// Damages every invader around the cell, returning how many were caught.
    pub fn cast_area_effect(&mut self, cell: CellCoord) -> Result<u32, CommandError> {
        let economy = self.config.economy;
        self.ensure_affordable(economy.area_effect_cost)?;
        if !self.config.grid.contains(cell) {
            return Err(PlacementError::OutOfBounds.into());
        }

        let start = self.events.len();
        self.apply(Command::StrikeArea {
            center: cell,
            radius: economy.area_effect_radius,
            damage: economy.area_effect_damage,
        });
        let victims = self.events[start..]
            .iter()
            .find_map(|event| match *event {
                Event::AreaEffectCast { victims, .. } => Some(victims),
                _ => None,
            })
            .unwrap_or(0);
        self.debit(economy.area_effect_cost);
        Ok(victims)
    }

    /// Advances the simulation by `dt`, clamped to [`MAX_TICK_DELTA`], and
    /// returns every event produced since the previous tick.
    ///
    /// Paused or finished runs only hand back pending events.
    pub fn tick(&mut self, dt: Duration) -> Vec<Event> {
        if self.paused || self.outcome.is_some() {
            return mem::take(&mut self.events);
        }
        let dt = dt.min(MAX_TICK_DELTA);
        self.stats.ticks += 1;

        self.apply(Command::AdvanceCooldowns { dt });

        if !self.waves.is_active() {
            let start = self.events.len();
            self.waves.advance_countdown(dt, &mut self.events);
            self.account(start);
            self.animate(dt);

            let defenders = query::roster_count(&self.world, Faction::Defender);
            self.apply(Command::PurgeRemoved);
            if defenders > 0 {
                let _ = self.check_defeat();
            }
            return mem::take(&mut self.events);
        }

        if let Some(spawn) =
            self.waves
                .next_spawn(dt, query::grid_view(&self.world), &mut self.rng)
        {
            self.apply(spawn);
        }
        self.decide();
        self.fight(dt);
        self.apply(Command::PurgeRemoved);
        self.evaluate();

        debug_assert!(
            query::occupancy_is_consistent(&self.world),
            "occupancy grid diverged from entity positions"
        );
        mem::take(&mut self.events)
    }

    fn decide(&mut self) {
        let mut roster = query::roster_view(&self.world);
        let ids: Vec<EntityId> = roster.iter().map(|snapshot| snapshot.id).collect();

        for id in ids {
            let Some(agent) = query::entity(&self.world, id) else {
                continue;
            };
            let Some(command) = self.targeting.decide(
                &agent,
                &roster,
                query::grid_view(&self.world),
                &mut self.rng,
            ) else {
                continue;
            };
            let changes_roster = matches!(
                command,
                Command::MoveCharacter { .. } | Command::BeginAttack { .. }
            );
            self.apply(command);
            if changes_roster {
                roster = query::roster_view(&self.world);
            }
        }
    }

    fn fight(&mut self, dt: Duration) {
        let roster = query::roster_view(&self.world);
        self.combat.engage(&roster, &mut self.commands);
        self.flush_commands();
        self.animate(dt);
    }

    fn animate(&mut self, dt: Duration) {
        let start = self.events.len();
        self.apply(Command::Animate { dt });
        let roster = query::roster_view(&self.world);
        self.combat.resolve_impacts(
            &self.events[start..],
            &roster,
            &mut self.rng,
            &mut self.commands,
        );
        self.flush_commands();
    }

    fn check_defeat(&mut self) -> bool {
        if query::roster_count(&self.world, Faction::Defender) > 0 {
            return false;
        }
        let level = self.waves.level();
        let wave = self.waves.wave();
        info!(level, wave, "defenders overrun");
        self.events.push(Event::Defeat { level, wave });
        self.outcome = Some(Outcome::Defeat);
        true
    }

    fn evaluate(&mut self) {
        if self.check_defeat() {
            return;
        }
        // Dying defenders still count toward defeat, so progress waits for them.
        if query::living_count(&self.world, Faction::Defender) == 0 {
            return;
        }

        let invaders = query::roster_count(&self.world, Faction::Invader);
        let start = self.events.len();
        let progress = self
            .waves
            .evaluate(invaders, &mut self.commands, &mut self.events);
        self.account(start);
        self.flush_commands();

        if progress == WaveProgress::Victory {
            self.outcome = Some(Outcome::Victory);
        }
    }

    fn bootstrap(&mut self) {
        let grid = self.config.grid;
        let plan = self.config.bootstrap;
        let durability = self.config.economy.obstacle_durability;

        let margin = plan.obstacle_margin;
        let obstacle_area = Area {
            column: margin,
            columns: grid.columns.saturating_sub(margin.saturating_mul(2)),
            row: grid.reserved_top_rows.saturating_add(margin),
            rows: grid
                .rows
                .saturating_sub(grid.reserved_top_rows)
                .saturating_sub(margin.saturating_mul(2)),
        };
        self.scatter(plan.obstacles, obstacle_area, |cell| Command::PlaceObstacle {
            cell,
            durability,
        });

        self.scatter(plan.defenders, Area::left_strip(grid, plan.defender_columns), |cell| {
            Command::PlaceDefender { cell }
        });
    }

    fn scatter(&mut self, count: u32, area: Area, build: impl Fn(CellCoord) -> Command) {
        let attempts = self.config.bootstrap.max_attempts.max(1);
        let mut skipped = 0_u32;

        for _ in 0..count {
            let placed = (0..attempts).any(|_| {
                let Some(cell) = area.pick(&mut self.rng) else {
                    return false;
                };
                self.place(build(cell)).is_ok()
            });
            if !placed {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, ?area, "bootstrap could not place every entity");
        }
    }

    fn ensure_affordable(&self, cost: u32) -> Result<(), CommandError> {
        if self.outcome.is_some() {
            return Err(CommandError::SimulationOver);
        }
        if self.gold < cost {
            return Err(CommandError::InsufficientFunds {
                required: cost,
                available: self.gold,
            });
        }
        Ok(())
    }

    fn place(&mut self, command: Command) -> Result<EntityId, CommandError> {
        let start = self.events.len();
        self.apply(command);

        let mut result = Err(CommandError::Placement(PlacementError::OutOfBounds));
        for event in &self.events[start..] {
            match *event {
                Event::CharacterSpawned { entity, .. } | Event::ObstaclePlaced { entity, .. } => {
                    result = Ok(entity);
                    break;
                }
                Event::PlacementRejected { reason, .. } => {
                    result = Err(reason.into());
                    break;
                }
                _ => {}
            }
        }
        if result.is_err() {
            self.events.truncate(start);
        }
        result
    }

    fn debit(&mut self, cost: u32) {
        self.gold -= cost;
        self.stats.gold_spent += cost;
        debug!(cost, balance = self.gold, "player command paid");
    }

    fn flush_commands(&mut self) {
        let mut commands = mem::take(&mut self.commands);
        for command in commands.drain(..) {
            self.apply(command);
        }
        self.commands = commands;
    }

    fn apply(&mut self, command: Command) {
        let start = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);
        self.account(start);
    }

    fn account(&mut self, start: usize) {
        let economy = self.config.economy;
        for event in &self.events[start..] {
            match *event {
                Event::EntityDied {
                    faction: Some(Faction::Invader),
                    ..
                } => {
                    self.stats.kills += 1;
                    self.gold = self.gold.saturating_add(economy.kill_bounty);
                }
                Event::WaveCleared { .. } => {
                    self.gold = self.gold.saturating_add(economy.wave_bonus);
                }
                Event::WaveStarted { level, .. } => {
                    self.stats.peak_threat = self.stats.peak_threat.max(threat_multiplier(level));
                }
                _ => {}
            }
        }
    }
}

/// Rectangle of cells used to scatter the bootstrap roster.
#[derive(Clone, Copy, Debug)]
struct Area {
    column: u32,
    columns: u32,
    row: u32,
    rows: u32,
}

impl Area {
    fn left_strip(grid: GridConfig, width: u32) -> Self {
        Self {
            column: 0,
            columns: width.min(grid.columns),
            row: grid.reserved_top_rows,
            rows: grid.rows.saturating_sub(grid.reserved_top_rows),
        }
    }

    fn pick<R>(&self, rng: &mut R) -> Option<CellCoord>
    where
        R: RandomSource + ?Sized,
    {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }
        Some(CellCoord::new(
            self.column + rng.below(self.columns),
            self.row + rng.below(self.rows),
        ))
    }
}
