//! Player profile: economy balances, caging state, cycle and ledger.
//!
//! Actions live in [`caging`] (state transitions) and [`economy`] (pricing,
//! rewards and side purchases). Every action validates first and mutates
//! second, so an `Err` always means the profile is unchanged.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::counter::BoundedCounter;
use crate::cycle::{CycleConfig, DifficultyCycle};
use crate::error::GameError;
use crate::ledger::{Minutes, ProgressLedger};
use crate::outcome::{Action, CagingState};
use crate::rng::RandomSource;

mod caging;
mod economy;

/// Starting balances for a new profile.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileSeed {
    #[serde(default)]
    pub tokens: f64,
    #[serde(default)]
    pub photos: f64,
    #[serde(default)]
    pub coin_bonus: f64,
    #[serde(default)]
    pub refusals: f64,
    #[serde(default)]
    pub prestige: f64,
}

/// One player's persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    name: String,
    #[serde(default)]
    tokens: BoundedCounter,
    #[serde(default)]
    photos: BoundedCounter,
    #[serde(default, rename = "bonus")]
    coin_bonus: BoundedCounter,
    #[serde(default)]
    refusals: BoundedCounter,
    #[serde(default)]
    prestige: BoundedCounter,
    #[serde(default, rename = "started")]
    caging_started: Option<NaiveDateTime>,
    #[serde(default, rename = "period")]
    caging_period: Minutes,
    #[serde(default)]
    last_caging_was_purchased: bool,
    cycle: DifficultyCycle,
    #[serde(default)]
    stats: ProgressLedger,
}

impl Profile {
    /// Build an uncaged profile from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] for a blank name.
    pub fn new(name: &str, seed: ProfileSeed, cycle: DifficultyCycle) -> Result<Self, GameError> {
        Ok(Self {
            name: normalize_name(name)?,
            tokens: BoundedCounter::new(seed.tokens),
            photos: BoundedCounter::new(seed.photos),
            coin_bonus: BoundedCounter::new(seed.coin_bonus),
            refusals: BoundedCounter::new(seed.refusals),
            prestige: BoundedCounter::new(seed.prestige),
            caging_started: None,
            caging_period: Minutes::ZERO,
            last_caging_was_purchased: false,
            cycle,
            stats: ProgressLedger::default(),
        })
    }

    /// Default profile with a freshly drawn first cycle.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] for a blank name.
    pub fn fresh<R: RandomSource + ?Sized>(name: &str, rng: &mut R) -> Result<Self, GameError> {
        Self::with_config(name, ProfileSeed::default(), CycleConfig::default(), rng)
    }

    /// Profile seeded with `seed` and a first cycle drawn from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidInput`] for a blank name and
    /// [`GameError::Config`] for an unusable cycle configuration.
    pub fn with_config<R: RandomSource + ?Sized>(
        name: &str,
        seed: ProfileSeed,
        config: CycleConfig,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let name = normalize_name(name)?;
        let cycle = DifficultyCycle::from_config(config, rng)?;
        Self::new(&name, seed, cycle)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn state(&self) -> CagingState {
        if self.caging_started.is_some() {
            CagingState::Caged
        } else {
            CagingState::Uncaged
        }
    }

    #[must_use]
    pub const fn is_caged(&self) -> bool {
        self.caging_started.is_some()
    }

    /// Actions legal in the current state, in menu order.
    #[must_use]
    pub fn available_actions(&self) -> Vec<Action> {
        let state = self.state();
        Action::ALL
            .into_iter()
            .filter(|action| action.required_state().is_none_or(|required| required == state))
            .collect()
    }

    pub(crate) fn require_state(
        &self,
        action: Action,
        required: CagingState,
    ) -> Result<(), GameError> {
        let state = self.state();
        if state == required {
            Ok(())
        } else {
            Err(GameError::InvalidState { action, state })
        }
    }

    #[must_use]
    pub fn tokens(&self) -> i64 {
        self.tokens.get_int()
    }

    #[must_use]
    pub fn photos(&self) -> i64 {
        self.photos.get_int()
    }

    #[must_use]
    pub fn refusals(&self) -> i64 {
        self.refusals.get_int()
    }

    #[must_use]
    pub fn prestige(&self) -> i64 {
        self.prestige.get_int()
    }

    /// Coin bonus in percent.
    #[must_use]
    pub const fn coin_bonus(&self) -> f64 {
        self.coin_bonus.get_f64()
    }

    #[must_use]
    pub const fn caging_started(&self) -> Option<NaiveDateTime> {
        self.caging_started
    }

    #[must_use]
    pub const fn caging_period(&self) -> Minutes {
        self.caging_period
    }

    #[must_use]
    pub fn caging_ends(&self) -> Option<NaiveDateTime> {
        self.caging_started
            .map(|started| started + self.caging_period.to_time_delta())
    }

    #[must_use]
    pub const fn last_caging_was_purchased(&self) -> bool {
        self.last_caging_was_purchased
    }

    #[must_use]
    pub const fn cycle(&self) -> &DifficultyCycle {
        &self.cycle
    }

    /// `(completed, total)` portions of the current cycle.
    #[must_use]
    pub fn cycle_completion(&self) -> (usize, usize) {
        (self.cycle.completed(), self.cycle.level())
    }

    #[must_use]
    pub const fn stats(&self) -> &ProgressLedger {
        &self.stats
    }
}

/// Trim and capitalize a player name: first letter upper case, rest lower.
///
/// # Errors
///
/// Returns [`GameError::InvalidInput`] when nothing but whitespace remains.
pub fn normalize_name(raw: &str) -> Result<String, GameError> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return Err(GameError::InvalidInput("name must not be blank".to_string()));
    };
    Ok(first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
}
