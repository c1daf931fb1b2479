//! Seedable random sources injected into every system that draws.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws consumed by AI tie-breaks, spawning and combat.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in `[0, upper)`; returns zero when `upper` is zero.
    fn below(&mut self, upper: u32) -> u32;
}

/// Shuffles the slice in place with a Fisher-Yates pass.
pub fn shuffle<T, R>(rng: &mut R, items: &mut [T])
where
    R: RandomSource + ?Sized,
{
    for index in (1..items.len()).rev() {
        let bound = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let swap = rng.below(bound) as usize;
        items.swap(index, swap);
    }
}

/// ChaCha-backed random source seeded once per simulation run.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Creates a random source from a 64-bit seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn below(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed, cycling sequence of draws.
///
/// Integer draws scale the next value onto the requested range, so a script
/// controls shuffles and spawn picks as well as combat rolls.
#[derive(Clone, Debug)]
pub struct ScriptedRandom {
    values: Vec<f64>,
    cursor: usize,
    draws: u64,
}

impl ScriptedRandom {
    /// Creates a source that cycles through the provided values.
    ///
    /// Values are clamped into `[0, 1)`; an empty script always yields zero.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|value| value.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self {
            values,
            cursor: 0,
            draws: 0,
        }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws += 1;
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        value
    }

    fn below(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        let scaled = (self.next_unit() * f64::from(upper)).floor() as u32;
        scaled.min(upper - 1)
    }
}
