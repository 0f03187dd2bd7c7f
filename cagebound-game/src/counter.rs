//! Bounded counters for spendable resources.
use serde::{Deserialize, Serialize};

use crate::constants::LOG_TARGET;
use crate::numbers::round_f64_to_i64;

/// Step direction for [`BoundedCounter::increment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Up,
    Down,
}

/// A real-valued balance that spending can never drive below zero.
///
/// The seed value is not validated; only `purchase` and
/// `subtract_above_zero` guarantee a non-negative result. Serialized as a
/// bare number.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundedCounter {
    amount: f64,
}

impl BoundedCounter {
    #[must_use]
    pub const fn new(amount: f64) -> Self {
        Self { amount }
    }

    /// Add a non-negative delta. Negative or non-finite deltas are ignored.
    pub fn add(&mut self, delta: f64) {
        if !delta.is_finite() || delta < 0.0 {
            log::warn!(target: LOG_TARGET, "ignoring invalid counter delta {delta}");
            return;
        }
        self.amount += delta;
    }

    pub fn increment(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.amount += 1.0,
            Direction::Down => self.amount -= 1.0,
        }
    }

    pub const fn clear(&mut self) {
        self.amount = 0.0;
    }

    /// Spend `cost` if the balance covers it.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    pub fn purchase(&mut self, cost: f64) -> bool {
        let affordable = self.amount - cost >= 0.0;
        if affordable {
            self.amount -= cost;
        }
        affordable
    }

    /// Subtract `cost`, flooring the balance at zero.
    pub fn subtract_above_zero(&mut self, cost: f64) {
        self.amount = if cost >= self.amount {
            0.0
        } else {
            self.amount - cost
        };
    }

    /// True when the amount is zero or above.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount >= 0.0
    }

    /// True when the amount is zero or below.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount <= 0.0
    }

    /// Balance rounded half away from zero.
    #[must_use]
    pub fn get_int(&self) -> i64 {
        round_f64_to_i64(self.amount)
    }

    #[must_use]
    pub const fn get_f64(&self) -> f64 {
        self.amount
    }
}
