//! Difficulty cycle generation.
//!
//! A cycle is one progression unit: `level` portions, each the length of a
//! single turn in [`MINUTES_PER_PORTION`] units, plus a price modifier that
//! scales every purchase while the cycle lasts.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::chance::chance_of;
use crate::constants::{
    BASE_LEVEL, DOUBLE_LEVEL_UP_CHANCE, LEVEL_UP_CHANCE, LEVELS_PER_MIN_PORTION_STEP,
    LOG_TARGET, MAX_DIFFICULTY, MINUTES_PER_PORTION, PORTION_RANGE, PRICE_RANGE,
    PRICE_SHIFT_PER_LEVEL,
};
use crate::counter::{BoundedCounter, Direction};
use crate::error::GameError;
use crate::ledger::Minutes;
use crate::numbers::{
    divide, i64_to_f64, i64_to_usize, round_f64_to_i64, usize_to_f64, usize_to_i64,
};
use crate::rng::RandomSource;

/// Portion values stored inline up to the maximum difficulty.
pub type PortionSet = SmallVec<[i64; MAX_DIFFICULTY]>;

/// Errors raised when cycle parameters cannot produce a valid cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} range [{min}, {max}] cannot produce two distinct values")]
    DegenerateRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{field} range is inverted (min {min} > max {max})")]
    InvertedRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("cycle level must be at least 1")]
    ZeroLevel,
    #[error("stored cycle is inconsistent: {0}")]
    Inconsistent(&'static str),
}

/// Base ranges every cycle is scaled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "CycleConfig::default_base_level")]
    pub base_level: usize,
    #[serde(default = "CycleConfig::default_price_range")]
    pub price_range: (i64, i64),
    #[serde(default = "CycleConfig::default_portion_range")]
    pub portion_range: (i64, i64),
    #[serde(default = "CycleConfig::default_max_difficulty")]
    pub max_difficulty: usize,
    #[serde(default = "CycleConfig::default_price_shift_per_level")]
    pub price_shift_per_level: i64,
}

impl CycleConfig {
    const fn default_base_level() -> usize {
        BASE_LEVEL
    }

    const fn default_price_range() -> (i64, i64) {
        PRICE_RANGE
    }

    const fn default_portion_range() -> (i64, i64) {
        PORTION_RANGE
    }

    const fn default_max_difficulty() -> usize {
        MAX_DIFFICULTY
    }

    const fn default_price_shift_per_level() -> i64 {
        PRICE_SHIFT_PER_LEVEL
    }

    /// Check that the ranges can generate cycles.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_level == 0 {
            return Err(ConfigError::ZeroLevel);
        }
        check_portion_range(self.portion_range)?;
        check_price_range(self.price_range)?;
        if self.max_difficulty < self.base_level {
            return Err(ConfigError::InvertedRange {
                field: "difficulty",
                min: usize_to_i64(self.base_level),
                max: usize_to_i64(self.max_difficulty),
            });
        }
        Ok(())
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            base_level: Self::default_base_level(),
            price_range: Self::default_price_range(),
            portion_range: Self::default_portion_range(),
            max_difficulty: Self::default_max_difficulty(),
            price_shift_per_level: Self::default_price_shift_per_level(),
        }
    }
}

fn check_portion_range((min, max): (i64, i64)) -> Result<(), ConfigError> {
    if min >= max {
        return Err(ConfigError::DegenerateRange {
            field: "portion",
            min,
            max,
        });
    }
    Ok(())
}

fn check_price_range((min, max): (i64, i64)) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::InvertedRange {
            field: "price",
            min,
            max,
        });
    }
    Ok(())
}

/// Randomized portions and price modifier for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CycleRecord")]
pub struct DifficultyCycle {
    price_modifier: i64,
    portions: PortionSet,
    completed_index: BoundedCounter,
    config: CycleConfig,
}

#[derive(Deserialize)]
struct CycleRecord {
    price_modifier: i64,
    portions: PortionSet,
    #[serde(default)]
    completed_index: BoundedCounter,
    #[serde(default)]
    config: CycleConfig,
}

impl TryFrom<CycleRecord> for DifficultyCycle {
    type Error = ConfigError;

    fn try_from(record: CycleRecord) -> Result<Self, Self::Error> {
        let cycle = Self {
            price_modifier: record.price_modifier,
            portions: record.portions,
            completed_index: record.completed_index,
            config: record.config,
        };
        cycle.config.validate()?;
        cycle.check_consistent()?;
        Ok(cycle)
    }
}

impl DifficultyCycle {
    /// Draw a fresh cycle of `level` portions.
    ///
    /// Adjacent portions always differ. The price modifier is drawn from
    /// `price_range` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] before drawing anything when the level is 0,
    /// the portion range cannot hold two distinct values, or the price range
    /// is inverted.
    pub fn generate<R: RandomSource + ?Sized>(
        config: CycleConfig,
        level: usize,
        price_range: (i64, i64),
        portion_range: (i64, i64),
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        if level == 0 {
            return Err(ConfigError::ZeroLevel);
        }
        check_portion_range(portion_range)?;
        check_price_range(price_range)?;

        let price_modifier = rng.roll_inclusive(price_range.0, price_range.1);
        let mut portions = PortionSet::with_capacity(level);
        let mut previous = None;
        for _ in 0..level {
            let portion = different_random(previous, portion_range, rng);
            previous = Some(portion);
            portions.push(portion);
        }
        log::debug!(
            target: LOG_TARGET,
            "generated cycle level={level} price_modifier={price_modifier} portions={portions:?}"
        );
        Ok(Self {
            price_modifier,
            portions,
            completed_index: BoundedCounter::default(),
            config,
        })
    }

    /// First cycle for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid.
    pub fn from_config<R: RandomSource + ?Sized>(
        config: CycleConfig,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Self::generate(
            config,
            config.base_level,
            config.price_range,
            config.portion_range,
            rng,
        )
    }

    /// Rebuild a cycle from known values, e.g. for fixtures or imports.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Inconsistent`] for an empty portion list, a
    /// portion below 1, or a completed index outside `0..=len`.
    pub fn from_parts(
        price_modifier: i64,
        portions: impl IntoIterator<Item = i64>,
        completed: usize,
    ) -> Result<Self, ConfigError> {
        let cycle = Self {
            price_modifier,
            portions: portions.into_iter().collect(),
            completed_index: BoundedCounter::new(usize_to_f64(completed)),
            config: CycleConfig::default(),
        };
        cycle.check_consistent()?;
        Ok(cycle)
    }

    fn check_consistent(&self) -> Result<(), ConfigError> {
        if self.portions.is_empty() {
            return Err(ConfigError::Inconsistent("cycle has no portions"));
        }
        if self.portions.iter().any(|portion| *portion < 1) {
            return Err(ConfigError::Inconsistent("portions must be at least 1"));
        }
        let completed = self.completed_index.get_f64();
        if !completed.is_finite()
            || completed < 0.0
            || completed.fract() != 0.0
            || completed > usize_to_f64(self.portions.len())
        {
            return Err(ConfigError::Inconsistent(
                "completed index outside the portion list",
            ));
        }
        Ok(())
    }

    /// Redraw one portion so it differs from its current value.
    ///
    /// Defaults to the slot at the completed index. The draw uses the current
    /// level's bounds and leaves every other slot and the completed index alone.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PortionOutOfRange`] for an index past the end.
    pub fn replace_random<R: RandomSource + ?Sized>(
        &mut self,
        index: Option<usize>,
        rng: &mut R,
    ) -> Result<(), GameError> {
        let index = index.unwrap_or_else(|| self.completed());
        let len = self.portions.len();
        let bounds = (self.nums_min(None), self.nums_max(None));
        let Some(slot) = self.portions.get_mut(index) else {
            return Err(GameError::PortionOutOfRange { index, len });
        };
        let previous = *slot;
        *slot = different_random(Some(previous), bounds, rng);
        log::debug!(target: LOG_TARGET, "replaced portion {index}: {previous} -> {}", *slot);
        Ok(())
    }

    /// Mark the current portion done. Never moves past the last portion.
    pub fn advance(&mut self) {
        if !self.is_complete() {
            self.completed_index.increment(Direction::Up);
        }
    }

    /// Regenerate for the next cycle.
    ///
    /// Below max difficulty the level rises by 0, 1 or 2 with probabilities
    /// 3/4, 1/6 and 1/12, capped at the configured maximum. Price and portion
    /// ranges shift with the new level.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Config`] if the scaled ranges are invalid; `self`
    /// is untouched either way.
    pub fn next_cycle<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<Self, GameError> {
        let mut level = self.level();
        if !self.is_max_difficulty() && chance_of(rng, LEVEL_UP_CHANCE.0, LEVEL_UP_CHANCE.1)? {
            level += if chance_of(rng, DOUBLE_LEVEL_UP_CHANCE.0, DOUBLE_LEVEL_UP_CHANCE.1)? {
                2
            } else {
                1
            };
        }
        let level = level.min(self.config.max_difficulty.max(self.level()));

        let shift = self.levels_above_base(level) * self.config.price_shift_per_level;
        let price_range = (
            self.config.price_range.0 + shift,
            self.config.price_range.1 + shift,
        );
        let portion_range = (self.nums_min(Some(level)), self.nums_max(Some(level)));
        let next = Self::generate(self.config, level, price_range, portion_range, rng)?;
        log::info!(
            target: LOG_TARGET,
            "cycle regenerated: level {} -> {}",
            self.level(),
            next.level()
        );
        Ok(next)
    }

    fn levels_above_base(&self, level: usize) -> i64 {
        usize_to_i64(level) - usize_to_i64(self.config.base_level)
    }

    /// Largest portion value at `level` (defaults to the current level).
    #[must_use]
    pub fn nums_max(&self, level: Option<usize>) -> i64 {
        let level = level.unwrap_or_else(|| self.level());
        self.config.portion_range.1 + self.levels_above_base(level)
    }

    /// Smallest portion value at `level` (defaults to the current level).
    #[must_use]
    pub fn nums_min(&self, level: Option<usize>) -> i64 {
        let level = level.unwrap_or_else(|| self.level());
        let steps = i64_to_f64(self.levels_above_base(level)) / LEVELS_PER_MIN_PORTION_STEP;
        self.config.portion_range.0 + round_f64_to_i64(steps)
    }

    #[must_use]
    pub fn is_max_difficulty(&self) -> bool {
        self.level() >= self.config.max_difficulty
    }

    /// Number of portions, i.e. the difficulty.
    #[must_use]
    pub fn level(&self) -> usize {
        self.portions.len()
    }

    #[must_use]
    pub fn portions(&self) -> &[i64] {
        &self.portions
    }

    #[must_use]
    pub const fn price_modifier(&self) -> i64 {
        self.price_modifier
    }

    #[must_use]
    pub const fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Portions completed so far in this cycle.
    #[must_use]
    pub fn completed(&self) -> usize {
        i64_to_usize(self.completed_index.get_int())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed() >= self.level()
    }

    /// Portion value of the next turn, `None` once the cycle is complete.
    #[must_use]
    pub fn current_portion(&self) -> Option<i64> {
        self.portions.get(self.completed()).copied()
    }

    #[must_use]
    pub fn completion_fraction(&self) -> f64 {
        divide(usize_to_f64(self.completed()), usize_to_f64(self.level()))
    }

    #[must_use]
    pub fn max_difficulty_fraction(&self) -> f64 {
        divide(
            usize_to_f64(self.level()),
            usize_to_f64(self.config.max_difficulty),
        )
    }

    /// Expected turn length at the current level's widest portion range.
    #[must_use]
    pub fn average_time_difficulty(&self) -> Minutes {
        let worst_case = i64_to_f64(self.nums_max(None));
        Minutes::new(round_f64_to_i64(
            i64_to_f64(MINUTES_PER_PORTION) * worst_case / 2.0,
        ))
    }
}

/// Draw from `[min, max]`, never returning `previous`.
///
/// A collision is redrawn once from `[min, max - 1]` and shifted up by one
/// when it lands at or above `previous`, which skips the excluded value
/// without retry loops.
fn different_random<R: RandomSource + ?Sized>(
    previous: Option<i64>,
    (min, max): (i64, i64),
    rng: &mut R,
) -> i64 {
    let drawn = rng.roll_inclusive(min, max);
    match previous {
        Some(previous) if drawn == previous => {
            let redrawn = rng.roll_inclusive(min, max - 1);
            if redrawn >= previous {
                redrawn + 1
            } else {
                redrawn
            }
        }
        _ => drawn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{GameRng, ScriptedRandom};

    fn default_cycle(rng: &mut impl RandomSource) -> DifficultyCycle {
        DifficultyCycle::from_config(CycleConfig::default(), rng).unwrap()
    }

    #[test]
    fn bounds_scale_with_level() {
        let cycle = DifficultyCycle::from_parts(5, [2], 0).unwrap();
        assert_eq!(cycle.nums_max(Some(1)), 4);
        assert_eq!(cycle.nums_min(Some(1)), 1);
        assert_eq!(cycle.nums_max(Some(5)), 8);
        assert_eq!(cycle.nums_min(Some(3)), 2);
        assert_eq!(cycle.nums_min(Some(5)), 2);
        assert_eq!(cycle.nums_min(Some(16)), 5);
        assert_eq!(cycle.nums_max(Some(16)), 19);
    }

    #[test]
    fn min_bound_rounds_half_steps_up() {
        let cycle = DifficultyCycle::from_parts(5, [2], 0).unwrap();
        // (3 - 1) / 4 = 0.5 and (11 - 1) / 4 = 2.5
        assert_eq!(cycle.nums_min(Some(3)), 2);
        assert_eq!(cycle.nums_min(Some(11)), 4);
        assert_eq!(cycle.nums_min(Some(7)), 3);
    }

    #[test]
    fn degenerate_ranges_fail_before_drawing() {
        let mut rng = ScriptedRandom::default();
        let err = DifficultyCycle::generate(CycleConfig::default(), 1, (5, 105), (3, 3), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DegenerateRange { .. }));
        let err = DifficultyCycle::generate(CycleConfig::default(), 1, (9, 5), (1, 4), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { .. }));
        let err = DifficultyCycle::generate(CycleConfig::default(), 0, (5, 105), (1, 4), &mut rng)
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroLevel);
    }

    #[test]
    fn collisions_are_shifted_past_previous() {
        // price, first portion 3, collision 3 -> redraw 3 (>= 3) -> 4
        let mut rng = ScriptedRandom::new([40, 3, 3, 3, 2], []);
        let cycle =
            DifficultyCycle::generate(CycleConfig::default(), 3, (5, 105), (1, 4), &mut rng)
                .unwrap();
        assert_eq!(cycle.price_modifier(), 40);
        assert_eq!(cycle.portions(), &[3, 4, 2]);
        assert!(rng.is_exhausted());
    }

    #[test]
    fn adjacent_portions_always_differ() {
        let mut rng = GameRng::from_user_seed(11);
        for level in 1..=MAX_DIFFICULTY {
            let cycle =
                DifficultyCycle::generate(CycleConfig::default(), level, (5, 105), (1, 4), &mut rng)
                    .unwrap();
            assert_eq!(cycle.level(), level);
            for pair in cycle.portions().windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
            assert!(cycle.portions().iter().all(|p| (1..=4).contains(p)));
        }
    }

    #[test]
    fn replace_random_changes_the_slot() {
        let mut rng = GameRng::from_user_seed(3);
        for _ in 0..200 {
            let mut cycle = default_cycle(&mut rng);
            let before = cycle.portions()[0];
            cycle.replace_random(None, &mut rng).unwrap();
            assert_ne!(cycle.portions()[0], before);
            assert_eq!(cycle.completed(), 0);
        }
    }

    #[test]
    fn replace_random_rejects_out_of_range_index() {
        let mut cycle = DifficultyCycle::from_parts(5, [1, 2], 0).unwrap();
        let mut rng = ScriptedRandom::default();
        let err = cycle.replace_random(Some(2), &mut rng).unwrap_err();
        assert!(matches!(
            err,
            GameError::PortionOutOfRange { index: 2, len: 2 }
        ));
    }

    #[test]
    fn advance_is_capped_at_length() {
        let mut cycle = DifficultyCycle::from_parts(5, [1, 2], 0).unwrap();
        cycle.advance();
        assert_eq!(cycle.current_portion(), Some(2));
        cycle.advance();
        cycle.advance();
        assert_eq!(cycle.completed(), 2);
        assert!(cycle.is_complete());
        assert_eq!(cycle.current_portion(), None);
        assert!((cycle.completion_fraction() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn next_cycle_levels_up_and_shifts_ranges() {
        let cycle = DifficultyCycle::from_parts(5, [1], 1).unwrap();
        // level-up roll hits, double roll hits: level 1 -> 3
        let mut rng = ScriptedRandom::new([200, 1, 1, 2, 9], [0.1, 0.1]);
        let next = cycle.next_cycle(&mut rng).unwrap();
        assert_eq!(next.level(), 3);
        assert_eq!(next.completed(), 0);
        // price range shifted by 20 -> clamp 200 to 125
        assert_eq!(next.price_modifier(), 125);
        // portion range at level 3 is [2, 6]
        assert_eq!(next.portions(), &[2, 3, 6]);
    }

    #[test]
    fn next_cycle_without_level_up_keeps_level() {
        let cycle = DifficultyCycle::from_parts(5, [1, 3], 2).unwrap();
        let mut rng = ScriptedRandom::new([50, 2, 4], [0.9]);
        let next = cycle.next_cycle(&mut rng).unwrap();
        assert_eq!(next.level(), 2);
        assert_eq!(next.portions(), &[2, 4]);
    }

    #[test]
    fn max_difficulty_never_rolls_or_grows() {
        let portions: Vec<i64> = (0..16).map(|i| 5 + (i % 2)).collect();
        let cycle = DifficultyCycle::from_parts(155, portions, 16).unwrap();
        assert!(cycle.is_max_difficulty());
        let mut rng = GameRng::from_user_seed(99);
        let next = cycle.next_cycle(&mut rng).unwrap();
        assert_eq!(next.level(), MAX_DIFFICULTY);
    }

    #[test]
    fn level_is_capped_at_max_difficulty() {
        let portions: Vec<i64> = (0..15).map(|i| 5 + (i % 2)).collect();
        let cycle = DifficultyCycle::from_parts(150, portions, 15).unwrap();
        let mut rng = GameRng::from_user_seed(5);
        for _ in 0..50 {
            let mut probe = rng.clone();
            let next = cycle.next_cycle(&mut probe).unwrap();
            assert!(next.level() <= MAX_DIFFICULTY);
            rng.unit();
        }
    }

    #[test]
    fn stored_cycles_are_validated() {
        let ok: DifficultyCycle =
            serde_json::from_str(r#"{"price_modifier":7,"portions":[1,3],"completed_index":1}"#)
                .unwrap();
        assert_eq!(ok.completed(), 1);
        assert!(
            serde_json::from_str::<DifficultyCycle>(
                r#"{"price_modifier":7,"portions":[1,3],"completed_index":3}"#
            )
            .is_err()
        );
        assert!(
            serde_json::from_str::<DifficultyCycle>(r#"{"price_modifier":7,"portions":[]}"#)
                .is_err()
        );
    }

    #[test]
    fn average_time_difficulty_uses_worst_case_portion() {
        let cycle = DifficultyCycle::from_parts(5, [1], 0).unwrap();
        assert_eq!(cycle.average_time_difficulty(), Minutes::new(30));
        let cycle = DifficultyCycle::from_parts(5, [1, 2], 0).unwrap();
        assert_eq!(cycle.average_time_difficulty(), Minutes::new(38));
    }

    #[test]
    fn config_validation() {
        assert!(CycleConfig::default().validate().is_ok());
        let cfg: CycleConfig = serde_json::from_str(r#"{"portion_range":[2,2]}"#).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DegenerateRange { .. })
        ));
        let cfg = CycleConfig {
            base_level: 0,
            ..CycleConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroLevel));
    }
}
