#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave and level scheduler.
//!
//! The scheduler alternates between a countdown before each wave, the wave
//! itself (while its spawn queue trickles invaders onto the border) and a
//! longer countdown between levels.

use std::{collections::VecDeque, time::Duration};

use gridsiege_core::{Archetype, CellCoord, Command, Event, GridView, RandomSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Tunables of the wave progression.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Waves that make up one level.
    pub waves_per_level: u32,
    /// Last level of the campaign; `None` runs forever.
    pub max_levels: Option<u32>,
    /// Countdown before the very first wave, in milliseconds.
    pub first_wave_delay_ms: u64,
    /// Countdown between waves of the same level, in milliseconds.
    pub wave_delay_ms: u64,
    /// Countdown between levels, in milliseconds.
    pub level_delay_ms: u64,
    /// Invaders in the first wave of the first level.
    pub base_enemies: u32,
    /// Additional invaders per level.
    pub enemies_per_level: u32,
    /// Additional invaders per wave within a level.
    pub enemies_per_wave: u32,
    /// Upper bound on invaders in a single wave.
    pub enemy_cap: u32,
    /// Delay between spawns at level one, in milliseconds.
    pub spawn_interval_ms: u64,
    /// Reduction of the spawn delay per level, in milliseconds.
    pub spawn_interval_step_ms: u64,
    /// Shortest delay between spawns, in milliseconds.
    pub spawn_interval_floor_ms: u64,
    /// Portion of maximum health restored to defenders on level advance.
    pub heal_fraction: f32,
    /// Border cells tried per spawn before deferring to the next tick.
    pub spawn_attempts: u32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            waves_per_level: 5,
            max_levels: Some(10),
            first_wave_delay_ms: 3_000,
            wave_delay_ms: 3_000,
            level_delay_ms: 4_000,
            base_enemies: 3,
            enemies_per_level: 2,
            enemies_per_wave: 1,
            enemy_cap: 40,
            spawn_interval_ms: 1_500,
            spawn_interval_step_ms: 150,
            spawn_interval_floor_ms: 400,
            heal_fraction: 0.3,
            spawn_attempts: 24,
        }
    }
}

impl WaveConfig {
    /// Number of invaders queued for the wave.
    #[must_use]
    pub fn enemy_count(&self, level: u32, wave: u32) -> u32 {
        let level_growth = self
            .enemies_per_level
            .saturating_mul(level.saturating_sub(1));
        let wave_growth = self.enemies_per_wave.saturating_mul(wave.saturating_sub(1));
        self.base_enemies
            .saturating_add(level_growth)
            .saturating_add(wave_growth)
            .min(self.enemy_cap)
    }

    /// Number of distinct invader archetypes fielded in the wave.
    #[must_use]
    pub fn variety(&self, level: u32, wave: u32) -> usize {
        let unlocked = 1 + level.saturating_sub(1) + wave.saturating_sub(1) / 2;
        usize::try_from(unlocked)
            .unwrap_or(usize::MAX)
            .min(Archetype::INVADERS.len())
    }

    /// Delay between consecutive spawns at the level.
    #[must_use]
    pub fn spawn_interval(&self, level: u32) -> Duration {
        let reduction = self
            .spawn_interval_step_ms
            .saturating_mul(u64::from(level.saturating_sub(1)));
        let interval = self
            .spawn_interval_ms
            .saturating_sub(reduction)
            .max(self.spawn_interval_floor_ms);
        Duration::from_millis(interval)
    }

    /// Archetypes queued for the wave, assigned round-robin.
    #[must_use]
    pub fn manifest(&self, level: u32, wave: u32) -> VecDeque<Archetype> {
        let variety = self.variety(level, wave);
        (0..self.enemy_count(level, wave) as usize)
            .map(|index| Archetype::INVADERS[index % variety])
            .collect()
    }
}

/// Phase of the wave state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Counting down to the next wave of the current level.
    BetweenWaves,
    /// Spawning and fighting the current wave.
    WaveActive,
    /// Counting down to the first wave of the next level.
    BetweenLevels,
    /// The final level was cleared.
    Completed,
}

/// What the end-of-tick evaluation concluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveProgress {
    /// Nothing changed.
    Continuing,
    /// A wave was cleared and another wave of the same level follows.
    WaveCleared,
    /// The last wave of a level was cleared and the next level was entered.
    LevelAdvanced,
    /// The last wave of the final level was cleared.
    Victory,
}

/// Deterministic wave and level state machine.
#[derive(Debug)]
pub struct WaveScheduler {
    config: WaveConfig,
    phase: WavePhase,
    countdown: Duration,
    level: u32,
    wave: u32,
    queue: VecDeque<Archetype>,
    spawn_timer: Duration,
}

impl WaveScheduler {
    /// Creates a scheduler waiting for the first wave of level one.
    #[must_use]
    pub fn new(config: WaveConfig) -> Self {
        Self {
            config,
            phase: WavePhase::BetweenWaves,
            countdown: Duration::from_millis(config.first_wave_delay_ms),
            level: 1,
            wave: 1,
            queue: VecDeque::new(),
            spawn_timer: Duration::ZERO,
        }
    }

    /// Tunables in use.
    #[must_use]
    pub const fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Reports whether a wave is being fought.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == WavePhase::WaveActive
    }

    /// Current level, starting at one.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// One-based index of the current or upcoming wave within the level.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Invaders still waiting to spawn.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Time left before the next wave starts, if a countdown is running.
    #[must_use]
    pub fn countdown(&self) -> Option<Duration> {
        match self.phase {
            WavePhase::BetweenWaves | WavePhase::BetweenLevels => Some(self.countdown),
            WavePhase::WaveActive | WavePhase::Completed => None,
        }
    }

    /// Runs the between-wave countdown, starting the next wave when it expires.
    pub fn advance_countdown(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if !matches!(
            self.phase,
            WavePhase::BetweenWaves | WavePhase::BetweenLevels
        ) {
            return;
        }
        self.countdown = self.countdown.saturating_sub(dt);
        if self.countdown.is_zero() {
            self.start_wave(out_events);
        }
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        self.queue = self.config.manifest(self.level, self.wave);
        self.spawn_timer = Duration::ZERO;
        self.phase = WavePhase::WaveActive;
        let enemies = u32::try_from(self.queue.len()).unwrap_or(u32::MAX);
        info!(level = self.level, wave = self.wave, enemies, "wave started");
        out_events.push(Event::WaveStarted {
            level: self.level,
            wave: self.wave,
            enemies,
        });
    }

    /// Spends elapsed time on the spawn cadence and emits at most one spawn.
    ///
    /// The invader at the head of the queue is only dequeued once a free
    /// border cell was found; otherwise it retries on the next tick.
    pub fn next_spawn<R>(
        &mut self,
        dt: Duration,
        grid: GridView<'_>,
        rng: &mut R,
    ) -> Option<Command>
    where
        R: RandomSource + ?Sized,
    {
        if !self.is_active() {
            return None;
        }
        self.spawn_timer = self.spawn_timer.saturating_sub(dt);
        if !self.spawn_timer.is_zero() {
            return None;
        }
        let archetype = *self.queue.front()?;

        let Some(cell) = self.pick_border_cell(grid, rng) else {
            debug!(?archetype, "no free border cell; spawn deferred");
            return None;
        };
        let _ = self.queue.pop_front();
        self.spawn_timer = self.config.spawn_interval(self.level);
        Some(Command::SpawnInvader {
            archetype,
            level: self.level,
            cell,
        })
    }

    fn pick_border_cell<R>(&self, grid: GridView<'_>, rng: &mut R) -> Option<CellCoord>
    where
        R: RandomSource + ?Sized,
    {
        let config = grid.config();
        if config.columns == 0 || config.rows <= config.reserved_top_rows {
            return None;
        }
        let top = config.reserved_top_rows;
        let bottom = config.rows - 1;
        let right = config.columns - 1;
        let playable_rows = config.rows - top;

        for _ in 0..self.config.spawn_attempts.max(1) {
            let cell = match rng.below(4) {
                0 => CellCoord::new(rng.below(config.columns), top),
                1 => CellCoord::new(rng.below(config.columns), bottom),
                2 => CellCoord::new(0, top + rng.below(playable_rows)),
                _ => CellCoord::new(right, top + rng.below(playable_rows)),
            };
            if grid.is_empty_for_move(cell) {
                return Some(cell);
            }
        }
        None
    }

    /// Checks whether the active wave is over.
    ///
    /// A wave ends once its queue is drained and no invader remains in the
    /// roster. Finishing the last wave of a level emits the healing command
    /// into `out_commands`.
    pub fn evaluate(
        &mut self,
        invaders_remaining: usize,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) -> WaveProgress {
        if !self.is_active() || !self.queue.is_empty() || invaders_remaining > 0 {
            return WaveProgress::Continuing;
        }

        info!(level = self.level, wave = self.wave, "wave cleared");
        out_events.push(Event::WaveCleared {
            level: self.level,
            wave: self.wave,
        });

        if self.wave < self.config.waves_per_level {
            self.wave += 1;
            self.phase = WavePhase::BetweenWaves;
            self.countdown = Duration::from_millis(self.config.wave_delay_ms);
            return WaveProgress::WaveCleared;
        }

        if self.config.max_levels.is_some_and(|last| self.level >= last) {
            info!(level = self.level, "campaign won");
            self.phase = WavePhase::Completed;
            out_events.push(Event::Victory { level: self.level });
            return WaveProgress::Victory;
        }

        self.level += 1;
        self.wave = 1;
        self.phase = WavePhase::BetweenLevels;
        self.countdown = Duration::from_millis(self.config.level_delay_ms);
        out_commands.push(Command::HealDefenders {
            fraction: self.config.heal_fraction,
        });
        info!(level = self.level, "level advanced");
        out_events.push(Event::LevelAdvanced { level: self.level });
        WaveProgress::LevelAdvanced
    }
}
