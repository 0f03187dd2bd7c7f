//! Random sources consumed by the progression engine.
//!
//! All randomness flows through [`RandomSource`] so tests can script every
//! roll while the binaries use a seeded or entropy-backed [`GameRng`].
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

const STREAM_TAG: &[u8] = b"cagebound";

/// Source of the two kinds of draws the engine needs.
pub trait RandomSource {
    /// Uniform integer in `[min, max]`. Returns `min` when `max <= min`.
    fn roll_inclusive(&mut self, min: i64, max: i64) -> i64;

    /// Uniform real in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

/// Counting ChaCha stream used by the engine and CLI.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha20Rng,
    draws: u64,
}

impl GameRng {
    /// Seed from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
            draws: 0,
        }
    }

    /// Deterministic stream derived from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(derive_stream_seed(seed, STREAM_TAG)),
            draws: 0,
        }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RngCore for GameRng {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

impl RandomSource for GameRng {
    fn roll_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        self.gen_range(min..=max)
    }

    fn unit(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> [u8; 32] {
    let digest = Sha256::new()
        .chain_update(domain_tag)
        .chain_update(user_seed.to_le_bytes())
        .finalize();
    let mut seed = [0_u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

/// Replays pre-recorded draws in order.
///
/// Integer rolls are clamped into the requested range so a script written
/// for one range never produces an out-of-range value.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    rolls: VecDeque<i64>,
    units: VecDeque<f64>,
}

impl ScriptedRandom {
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = i64>, units: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            units: units.into_iter().collect(),
        }
    }

    pub fn push_roll(&mut self, roll: i64) -> &mut Self {
        self.rolls.push_back(roll);
        self
    }

    pub fn push_unit(&mut self, unit: f64) -> &mut Self {
        self.units.push_back(unit);
        self
    }

    /// True once every scripted draw has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.rolls.is_empty() && self.units.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> (usize, usize) {
        (self.rolls.len(), self.units.len())
    }
}

impl RandomSource for ScriptedRandom {
    /// Degenerate ranges return `min` without consuming a roll.
    ///
    /// # Panics
    ///
    /// Panics when no scripted integer roll remains.
    fn roll_inclusive(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let Some(roll) = self.rolls.pop_front() else {
            panic!("scripted random ran out of rolls for [{min}, {max}]");
        };
        roll.clamp(min, max)
    }

    /// # Panics
    ///
    /// Panics when no scripted unit draw remains.
    fn unit(&mut self) -> f64 {
        let Some(unit) = self.units.pop_front() else {
            panic!("scripted random ran out of unit draws");
        };
        unit.clamp(0.0, 1.0)
    }
}
