//! Append-only statistics ledger.
//!
//! Every leaf is an [`AddOnly`] value that can only grow. Group totals and
//! percentages are recomputed from the leaves on each call and are never
//! stored, so they cannot drift from the values they summarize.
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use thiserror::Error;

use crate::numbers::{divide, i64_to_f64};

/// Errors raised when a ledger leaf is asked to shrink.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LedgerError {
    #[error("ledger values only grow (attempted to add {0})")]
    NegativeDelta(f64),
}

/// Whole-minute duration used for caging periods and time statistics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Minutes(i64);

impl Minutes {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(minutes: i64) -> Self {
        Self(minutes)
    }

    #[must_use]
    pub const fn as_minutes(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whole minutes of a `TimeDelta`, truncated toward zero.
    #[must_use]
    pub fn from_time_delta(delta: TimeDelta) -> Self {
        Self(delta.num_minutes())
    }

    #[must_use]
    pub fn to_time_delta(self) -> TimeDelta {
        TimeDelta::try_minutes(self.0).unwrap_or_else(TimeDelta::zero)
    }

    /// Split into `(days, hours, minutes)`.
    #[must_use]
    pub const fn days_hours_minutes(self) -> (i64, i64, i64) {
        let total = self.0;
        (total / (24 * 60), (total / 60) % 24, total % 60)
    }
}

impl Add for Minutes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// Numeric types a ledger leaf can hold.
pub trait Tally: Copy + Default + PartialOrd + Add<Output = Self> {
    fn is_negative(self) -> bool;
    fn to_f64(self) -> f64;
}

impl Tally for i64 {
    fn is_negative(self) -> bool {
        self < 0
    }

    fn to_f64(self) -> f64 {
        i64_to_f64(self)
    }
}

impl Tally for Minutes {
    fn is_negative(self) -> bool {
        self.0 < 0
    }

    fn to_f64(self) -> f64 {
        i64_to_f64(self.0)
    }
}

/// Mutable monotonic value: starts at zero and only accepts non-negative deltas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddOnly<T>(T);

impl<T: Tally> AddOnly<T> {
    #[must_use]
    pub fn new() -> Self {
        Self(T::default())
    }

    /// Grow the value by `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeDelta`] and leaves the value unchanged
    /// when `delta` is negative.
    pub fn add(&mut self, delta: T) -> Result<(), LedgerError> {
        if delta.is_negative() {
            return Err(LedgerError::NegativeDelta(delta.to_f64()));
        }
        self.0 = self.0 + delta;
        Ok(())
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.0
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64()
    }

    /// Read-only snapshot of this value.
    #[must_use]
    pub fn snapshot(&self) -> Derived<T> {
        Derived(self.0)
    }
}

/// Read-only value derived from other ledger values. It has no mutators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived<T>(T);

impl<T: Tally> Derived<T> {
    fn sum(parts: &[T]) -> Self {
        Self(parts.iter().fold(T::default(), |acc, part| acc + *part))
    }

    #[must_use]
    pub fn get(&self) -> T {
        self.0
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.0.to_f64()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenSpending {
    #[serde(default)]
    pub begging: AddOnly<i64>,
    #[serde(default, rename = "bathroom")]
    pub bathroom_break: AddOnly<i64>,
}

impl TokenSpending {
    #[must_use]
    pub fn total(&self) -> Derived<i64> {
        Derived::sum(&[self.begging.get(), self.bathroom_break.get()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenStats {
    #[serde(default)]
    pub earned: AddOnly<i64>,
    #[serde(default)]
    pub spent: TokenSpending,
    #[serde(default)]
    pub lost: AddOnly<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhotoStats {
    #[serde(default)]
    pub earned: AddOnly<i64>,
    #[serde(default)]
    pub spent: AddOnly<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RefusalStats {
    #[serde(default)]
    pub earned: AddOnly<i64>,
    #[serde(default)]
    pub successfully: AddOnly<i64>,
    #[serde(default)]
    pub unsuccessfully: AddOnly<i64>,
}

impl RefusalStats {
    #[must_use]
    pub fn attempted(&self) -> Derived<i64> {
        Derived::sum(&[self.successfully.get(), self.unsuccessfully.get()])
    }

    /// Every attempt spends a refusal, successful or not.
    #[must_use]
    pub fn spent(&self) -> Derived<i64> {
        self.attempted()
    }
}

/// Time split by how the caging began.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitTime {
    #[serde(default)]
    pub purchased: AddOnly<Minutes>,
    #[serde(default)]
    pub commanded: AddOnly<Minutes>,
}

impl SplitTime {
    #[must_use]
    pub fn total(&self) -> Derived<Minutes> {
        Derived::sum(&[self.purchased.get(), self.commanded.get()])
    }

    /// Credit `period` to the purchased or commanded leaf.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeDelta`] for a negative period.
    pub fn attribute(&mut self, purchased: bool, period: Minutes) -> Result<(), LedgerError> {
        if purchased {
            self.purchased.add(period)
        } else {
            self.commanded.add(period)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeStats {
    #[serde(flatten)]
    pub assigned: SplitTime,
    #[serde(default)]
    pub max_difficulty_successful: AddOnly<Minutes>,
}

impl TimeStats {
    #[must_use]
    pub fn total(&self) -> Derived<Minutes> {
        self.assigned.total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RefusedTime {
    #[serde(default)]
    pub successfully: AddOnly<Minutes>,
    #[serde(default)]
    pub unsuccessfully: AddOnly<Minutes>,
}

impl RefusedTime {
    #[must_use]
    pub fn attempted(&self) -> Derived<Minutes> {
        Derived::sum(&[self.successfully.get(), self.unsuccessfully.get()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnStats {
    #[serde(default)]
    pub successfully: AddOnly<i64>,
    #[serde(default)]
    pub unsuccessfully: AddOnly<i64>,
}

impl TurnStats {
    #[must_use]
    pub fn attempted(&self) -> Derived<i64> {
        Derived::sum(&[self.successfully.get(), self.unsuccessfully.get()])
    }
}

/// Full statistics record of a profile.
///
/// Groups are readable by anyone but only mutable inside the crate, so the
/// only way to change a leaf from outside is through the profile's actions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressLedger {
    #[serde(default)]
    tokens: TokenStats,
    #[serde(default)]
    photos: PhotoStats,
    #[serde(default)]
    refusals: RefusalStats,
    #[serde(default)]
    time: TimeStats,
    #[serde(default)]
    time_failed: SplitTime,
    #[serde(default)]
    time_refused: RefusedTime,
    #[serde(default)]
    turns: TurnStats,
}

impl ProgressLedger {
    #[must_use]
    pub const fn tokens(&self) -> &TokenStats {
        &self.tokens
    }

    #[must_use]
    pub const fn photos(&self) -> &PhotoStats {
        &self.photos
    }

    #[must_use]
    pub const fn refusals(&self) -> &RefusalStats {
        &self.refusals
    }

    #[must_use]
    pub const fn time(&self) -> &TimeStats {
        &self.time
    }

    #[must_use]
    pub const fn time_failed(&self) -> &SplitTime {
        &self.time_failed
    }

    #[must_use]
    pub const fn time_refused(&self) -> &RefusedTime {
        &self.time_refused
    }

    #[must_use]
    pub const fn turns(&self) -> &TurnStats {
        &self.turns
    }

    /// Prestige-counter alias: refusals are only earned by completing cycles.
    #[must_use]
    pub fn cycles_completed(&self) -> Derived<i64> {
        self.refusals.earned.snapshot()
    }

    pub(crate) const fn tokens_mut(&mut self) -> &mut TokenStats {
        &mut self.tokens
    }

    pub(crate) const fn photos_mut(&mut self) -> &mut PhotoStats {
        &mut self.photos
    }

    pub(crate) const fn refusals_mut(&mut self) -> &mut RefusalStats {
        &mut self.refusals
    }

    pub(crate) const fn time_mut(&mut self) -> &mut TimeStats {
        &mut self.time
    }

    pub(crate) const fn time_failed_mut(&mut self) -> &mut SplitTime {
        &mut self.time_failed
    }

    pub(crate) const fn time_refused_mut(&mut self) -> &mut RefusedTime {
        &mut self.time_refused
    }

    pub(crate) const fn turns_mut(&mut self) -> &mut TurnStats {
        &mut self.turns
    }

    // Tokens -----------------------------------------------------------------

    #[must_use]
    pub fn tokens_spent_pct(&self) -> f64 {
        divide(
            self.tokens.spent.total().as_f64(),
            self.tokens.earned.as_f64(),
        )
    }

    #[must_use]
    pub fn tokens_spent_begging_pct(&self) -> f64 {
        divide(
            self.tokens.spent.begging.as_f64(),
            self.tokens.spent.total().as_f64(),
        )
    }

    #[must_use]
    pub fn tokens_spent_bathroom_pct(&self) -> f64 {
        divide(
            self.tokens.spent.bathroom_break.as_f64(),
            self.tokens.spent.total().as_f64(),
        )
    }

    /// Share of earned tokens taken by failure penalties.
    #[must_use]
    pub fn tokens_lost_pct(&self) -> f64 {
        divide(self.tokens.lost.as_f64(), self.tokens.earned.as_f64())
    }

    // Photos -----------------------------------------------------------------

    #[must_use]
    pub fn photos_spent_pct(&self) -> f64 {
        divide(self.photos.spent.as_f64(), self.photos.earned.as_f64())
    }

    // Refusals ---------------------------------------------------------------

    #[must_use]
    pub fn refusals_spent_pct(&self) -> f64 {
        divide(
            self.refusals.spent().as_f64(),
            self.refusals.earned.as_f64(),
        )
    }

    #[must_use]
    pub fn refusals_successful_pct(&self) -> f64 {
        divide(
            self.refusals.successfully.as_f64(),
            self.refusals.attempted().as_f64(),
        )
    }

    // Time -------------------------------------------------------------------

    #[must_use]
    pub fn time_purchased_pct(&self) -> f64 {
        divide(
            self.time.assigned.purchased.as_f64(),
            self.time.total().as_f64(),
        )
    }

    #[must_use]
    pub fn time_commanded_pct(&self) -> f64 {
        divide(
            self.time.assigned.commanded.as_f64(),
            self.time.total().as_f64(),
        )
    }

    #[must_use]
    pub fn time_failed_purchased_pct(&self) -> f64 {
        divide(
            self.time_failed.purchased.as_f64(),
            self.time.assigned.purchased.as_f64(),
        )
    }

    #[must_use]
    pub fn time_failed_commanded_pct(&self) -> f64 {
        divide(
            self.time_failed.commanded.as_f64(),
            self.time.assigned.commanded.as_f64(),
        )
    }

    #[must_use]
    pub fn time_failed_total_pct(&self) -> f64 {
        divide(
            self.time_failed.total().as_f64(),
            self.time.total().as_f64(),
        )
    }

    #[must_use]
    pub fn time_refused_attempted_pct(&self) -> f64 {
        divide(
            self.time_refused.attempted().as_f64(),
            self.time.total().as_f64(),
        )
    }

    #[must_use]
    pub fn time_refused_successful_pct(&self) -> f64 {
        divide(
            self.time_refused.successfully.as_f64(),
            self.time.total().as_f64(),
        )
    }

    #[must_use]
    pub fn time_failed_or_refused_successfully_pct(&self) -> f64 {
        divide(
            self.time_failed.total().as_f64() + self.time_refused.successfully.as_f64(),
            self.time.total().as_f64(),
        )
    }

    #[must_use]
    pub fn time_failed_or_refused_attempted_pct(&self) -> f64 {
        divide(
            self.time_failed.total().as_f64() + self.time_refused.attempted().as_f64(),
            self.time.total().as_f64(),
        )
    }

    /// Average refused minutes per refusal attempt.
    #[must_use]
    pub fn refused_time_weight_attempted(&self) -> Minutes {
        weight(
            self.time_refused.attempted().as_f64(),
            self.refusals.attempted().as_f64(),
        )
    }

    /// Average refused minutes per successful refusal.
    #[must_use]
    pub fn refused_time_weight_successful(&self) -> Minutes {
        weight(
            self.time_refused.successfully.as_f64(),
            self.refusals.successfully.as_f64(),
        )
    }

    // Turns ------------------------------------------------------------------

    #[must_use]
    pub fn cycle_turn_pct(&self) -> f64 {
        divide(
            self.cycles_completed().as_f64(),
            self.turns.successfully.as_f64(),
        )
    }

    #[must_use]
    pub fn turns_failed_pct(&self) -> f64 {
        divide(
            self.turns.unsuccessfully.as_f64(),
            self.turns.attempted().as_f64(),
        )
    }

    #[must_use]
    pub fn turns_failed_or_refused_successfully_pct(&self) -> f64 {
        divide(
            self.turns.unsuccessfully.as_f64() + self.refusals.successfully.as_f64(),
            self.turns.attempted().as_f64(),
        )
    }

    #[must_use]
    pub fn turns_failed_or_refused_attempted_pct(&self) -> f64 {
        divide(
            self.turns.unsuccessfully.as_f64() + self.refusals.attempted().as_f64(),
            self.turns.attempted().as_f64(),
        )
    }
}

fn weight(minutes: f64, count: f64) -> Minutes {
    Minutes::new(crate::numbers::floor_f64_to_i64(divide(minutes, count)))
}
