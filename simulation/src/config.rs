//! Tunables of a simulation run and their TOML representation.

use gridsiege_core::{AnimationCatalog, AnimationState, Archetype, GridConfig};
use gridsiege_system_targeting::TargetingConfig;
use gridsiege_system_waves::WaveConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prices, rewards and player effect strengths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Balance available when the run starts.
    pub starting_gold: u32,
    /// Price of placing a defender.
    pub defender_cost: u32,
    /// Price of placing an obstacle.
    pub obstacle_cost: u32,
    /// Price of casting the area effect.
    pub area_effect_cost: u32,
    /// Reward per invader killed.
    pub kill_bounty: u32,
    /// Reward per wave cleared.
    pub wave_bonus: u32,
    /// Damage an obstacle absorbs before it is destroyed.
    pub obstacle_durability: u32,
    /// Chebyshev radius of the area effect.
    pub area_effect_radius: u32,
    /// Damage the area effect deals to each invader.
    pub area_effect_damage: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_gold: 150,
            defender_cost: 50,
            obstacle_cost: 15,
            area_effect_cost: 40,
            kill_bounty: 5,
            wave_bonus: 20,
            obstacle_durability: 30,
            area_effect_radius: 1,
            area_effect_damage: 25,
        }
    }
}

/// Free roster laid out when a run starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Defenders placed in the leftmost columns.
    pub defenders: u32,
    /// Obstacles scattered across the field.
    pub obstacles: u32,
    /// Width of the strip defenders are placed in.
    pub defender_columns: u32,
    /// Minimum distance between an obstacle and the playable edges.
    pub obstacle_margin: u32,
    /// Random cells tried per entity before it is skipped.
    pub max_attempts: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            defenders: 4,
            obstacles: 8,
            defender_columns: 8,
            obstacle_margin: 1,
            max_attempts: 256,
        }
    }
}

/// Everything needed to start a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed of the random source driving AI and combat rolls.
    pub seed: u64,
    /// Battlefield layout.
    pub grid: GridConfig,
    /// Prices and rewards.
    pub economy: EconomyConfig,
    /// Wave progression.
    pub waves: WaveConfig,
    /// AI scoring weights.
    pub targeting: TargetingConfig,
    /// Starting roster.
    pub bootstrap: BootstrapConfig,
    /// Frame counts per archetype and state.
    pub animations: AnimationCatalog,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            grid: GridConfig::default(),
            economy: EconomyConfig::default(),
            waves: WaveConfig::default(),
            targeting: TargetingConfig::default(),
            bootstrap: BootstrapConfig::default(),
            animations: AnimationCatalog::default(),
        }
    }
}

/// Reasons a configuration cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The grid has no cells.
    #[error("grid must have at least one column and one row")]
    EmptyGrid,
    /// The reserved rows leave nothing to play on.
    #[error("{reserved} reserved rows leave no playable row in a grid of {rows}")]
    NoPlayableRows {
        /// Configured reserved rows.
        reserved: u32,
        /// Configured grid height.
        rows: u32,
    },
    /// The placement margin excludes every cell.
    #[error("placement margin {0} leaves no placeable cell")]
    MarginTooWide(u32),
    /// A level needs at least one wave.
    #[error("a level must contain at least one wave")]
    NoWaves,
    /// The spawn cadence would grow slower with every level.
    #[error("spawn interval floor of {floor} ms exceeds the base interval of {base} ms")]
    SpawnFloorAboveBase {
        /// Configured shortest delay.
        floor: u64,
        /// Configured delay at level one.
        base: u64,
    },
    /// The impact frame is never reached by the attack clip.
    #[error("{archetype:?} strikes on frame {impact_frame} of a {frames}-frame attack clip")]
    ImpactFrameOutOfRange {
        /// Offending archetype.
        archetype: Archetype,
        /// Frame the archetype strikes on.
        impact_frame: u32,
        /// Frames in the configured attack clip.
        frames: u32,
    },
}

impl SimulationConfig {
    /// Parses and validates a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a playable run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = self.grid;
        if grid.columns == 0 || grid.rows == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if grid.reserved_top_rows >= grid.rows {
            return Err(ConfigError::NoPlayableRows {
                reserved: grid.reserved_top_rows,
                rows: grid.rows,
            });
        }
        let margin = grid.placement_margin;
        let doubled = margin.saturating_mul(2);
        if doubled >= grid.columns || doubled >= grid.rows - grid.reserved_top_rows {
            return Err(ConfigError::MarginTooWide(margin));
        }
        if self.waves.waves_per_level == 0 {
            return Err(ConfigError::NoWaves);
        }
        if self.waves.spawn_interval_floor_ms > self.waves.spawn_interval_ms {
            return Err(ConfigError::SpawnFloorAboveBase {
                floor: self.waves.spawn_interval_floor_ms,
                base: self.waves.spawn_interval_ms,
            });
        }

        for archetype in std::iter::once(Archetype::Knight).chain(Archetype::INVADERS) {
            let impact_frame = archetype.stats().impact_frame;
            let frames = self
                .animations
                .frame_count(archetype, AnimationState::Attack);
            if impact_frame >= frames {
                return Err(ConfigError::ImpactFrameOutOfRange {
                    archetype,
                    impact_frame,
                    frames,
                });
            }
        }
        Ok(())
    }
}
