//! Reports returned by profile actions.
//!
//! The engine never prints; callers render these.
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ledger::Minutes;
use crate::numbers::{floor_f64_to_i64, round_f64_to_i64};

/// Spendable balances a purchase or penalty can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Tokens,
    Photos,
    Refusals,
}

impl Resource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tokens => "tokens",
            Self::Photos => "photos",
            Self::Refusals => "refusals",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CagingState {
    #[default]
    Uncaged,
    Caged,
}

impl CagingState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Uncaged => "uncaged",
            Self::Caged => "caged",
        }
    }
}

impl fmt::Display for CagingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mutating player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CommandCaging,
    BuyCaging,
    MarkSuccess,
    MarkFailure,
    RefuseCaging,
    BuyBathroomBreak,
    RedeemPhoto,
}

impl Action {
    pub const ALL: [Self; 7] = [
        Self::CommandCaging,
        Self::BuyCaging,
        Self::MarkSuccess,
        Self::MarkFailure,
        Self::RefuseCaging,
        Self::BuyBathroomBreak,
        Self::RedeemPhoto,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommandCaging => "command_caging",
            Self::BuyCaging => "buy_caging",
            Self::MarkSuccess => "mark_success",
            Self::MarkFailure => "mark_failure",
            Self::RefuseCaging => "refuse_caging",
            Self::BuyBathroomBreak => "buy_bathroom_break",
            Self::RedeemPhoto => "redeem_photo",
        }
    }

    /// State the action requires, `None` when it is legal in both.
    #[must_use]
    pub const fn required_state(self) -> Option<CagingState> {
        match self {
            Self::CommandCaging | Self::BuyCaging => Some(CagingState::Uncaged),
            Self::MarkSuccess | Self::MarkFailure | Self::RefuseCaging | Self::BuyBathroomBreak => {
                Some(CagingState::Caged)
            }
            Self::RedeemPhoto => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or(())
    }
}

/// A caging that just began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CagingStarted {
    pub started: NaiveDateTime,
    pub period: Minutes,
    pub purchased: bool,
    /// Tokens charged, for purchased cagings.
    pub cost: Option<i64>,
}

impl CagingStarted {
    #[must_use]
    pub fn ends_at(&self) -> NaiveDateTime {
        self.started + self.period.to_time_delta()
    }
}

/// Everything granted by a successful turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Rewards {
    pub cycle_completed: bool,
    pub refusals: i64,
    pub tokens: i64,
    pub photo: bool,
    /// Raw coin bonus percentage added this turn.
    pub coin_bonus_increase: f64,
    pub prestige: bool,
    /// Level of the freshly generated cycle when this turn completed one.
    pub next_level: Option<usize>,
}

impl Rewards {
    /// Coin bonus increase worth telling the player about.
    ///
    /// Increases that floor to zero still apply, they just go unannounced.
    #[must_use]
    pub fn announced_coin_bonus(&self) -> Option<i64> {
        (floor_f64_to_i64(self.coin_bonus_increase) != 0)
            .then(|| round_f64_to_i64(self.coin_bonus_increase))
    }
}

/// What a failed turn took away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum Loss {
    /// The whole penalty was paid in tokens.
    Tokens(i64),
    /// The penalty exceeded the balance; every remaining token went.
    AllTokens(i64),
    Refusals(i64),
    AllPhotos(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UncageOutcome {
    Completed(Rewards),
    Penalized { penalty: i64, loss: Loss },
    /// Every resource was exhausted. The profile must be deleted and the
    /// session ended without another save.
    Eliminated { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RefusalOutcome {
    /// The caging was refused and the turn counts as completed.
    Refused(Rewards),
    StillCaged,
}

/// A successful side purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Purchase {
    pub resource: Resource,
    pub cost: i64,
    pub remaining: i64,
}

/// Result of one engine action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionReport {
    Caged(CagingStarted),
    Uncaged(UncageOutcome),
    Refusal(RefusalOutcome),
    Purchased(Purchase),
}

impl ActionReport {
    #[must_use]
    pub const fn is_eliminated(&self) -> bool {
        matches!(self, Self::Uncaged(UncageOutcome::Eliminated { .. }))
    }
}
