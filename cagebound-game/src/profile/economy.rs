//! Pricing, rewards, penalties and side purchases.
use crate::chance::chance_of;
use crate::constants::{
    BATHROOM_BREAK_BASE_PRICE, CAGING_BASE_PRICE, COIN_BONUS_MAX, COIN_BONUS_PER_CYCLE,
    FAILURE_REFUSAL_COST, LOG_TARGET, PHOTO_CHANCE_OUT_OF, REFUSAL_REWARD_RATE,
    TURN_REWARD_GUARANTEED, TURNS_PER_CAGING,
};
use crate::error::GameError;
use crate::ledger::Minutes;
use crate::numbers::{
    ceil_f64_to_i64, divide, floor_f64_to_i64, i64_to_f64, round_f64_to_i64, usize_to_f64,
};
use crate::outcome::{Action, CagingState, Loss, Purchase, Resource, Rewards};
use crate::rng::RandomSource;

use super::Profile;

/// `base × (1 + modifier/100)`, rounded, never negative.
pub(super) fn scaled_price(base: i64, price_modifier: i64) -> i64 {
    let scaled = i64_to_f64(base) * (1.0 + i64_to_f64(price_modifier) / 100.0);
    round_f64_to_i64(scaled).max(0)
}

/// Convex remap of a time-difficulty fraction: 0 → 0.5, 0.5 → 1, 1 → 2.
fn reward_weight(time_difficulty: f64) -> f64 {
    time_difficulty.powi(2) + 0.5 * time_difficulty + 0.5
}

impl Profile {
    #[must_use]
    pub fn caging_cost(&self) -> i64 {
        scaled_price(CAGING_BASE_PRICE, self.cycle.price_modifier())
    }

    #[must_use]
    pub fn bathroom_break_cost(&self) -> i64 {
        scaled_price(BATHROOM_BREAK_BASE_PRICE, self.cycle.price_modifier())
    }

    /// Expected caging price over the whole base price-modifier range.
    #[must_use]
    pub fn average_caging_cost(&self) -> i64 {
        let (min, max) = self.cycle.config().price_range;
        let midpoint = (max - min) / 2;
        scaled_price(CAGING_BASE_PRICE, midpoint)
    }

    /// How long the portion at `index` is relative to the current level's
    /// portion span. Not clamped: the longest portions exceed 1.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PortionOutOfRange`] for an index past the end.
    pub fn time_difficulty_percent(&self, index: usize) -> Result<f64, GameError> {
        let portions = self.cycle.portions();
        let Some(portion) = portions.get(index) else {
            return Err(GameError::PortionOutOfRange {
                index,
                len: portions.len(),
            });
        };
        let span = self.cycle.nums_max(None) - self.cycle.nums_min(None);
        Ok(divide(i64_to_f64(*portion), i64_to_f64(span)))
    }

    /// Random token amount averaging a quarter of the average caging cost,
    /// scaled by how long the portion at `index` is.
    ///
    /// `guaranteed` is the share paid out deterministically; the rest is a
    /// uniform draw. Defaults to the slot at the completed index.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PortionOutOfRange`] for an index past the end.
    pub fn random_price<R: RandomSource + ?Sized>(
        &self,
        guaranteed: f64,
        index: Option<usize>,
        rng: &mut R,
    ) -> Result<i64, GameError> {
        let index = index.unwrap_or_else(|| self.cycle.completed());
        let alteration = self.time_difficulty_percent(index)? + 0.5;
        let average = i64_to_f64(self.average_caging_cost()) / TURNS_PER_CAGING;
        let altered = average * alteration;
        let fixed = floor_f64_to_i64(altered * guaranteed * 2.0);
        let span = ceil_f64_to_i64(altered * (1.0 - guaranteed));
        Ok(fixed + rng.roll_inclusive(0, span))
    }

    #[must_use]
    pub fn apply_coin_bonus(&self, amount: i64) -> i64 {
        floor_f64_to_i64(i64_to_f64(amount) * (1.0 + self.coin_bonus.get_f64() / 100.0))
    }

    /// Draw the rewards for finishing the portion at `index`.
    ///
    /// Reads only; [`Profile::apply_rewards`] commits the result.
    pub(crate) fn plan_rewards<R: RandomSource + ?Sized>(
        &self,
        index: usize,
        cycle_completed: bool,
        reward_user: bool,
        rng: &mut R,
    ) -> Result<Rewards, GameError> {
        let weight = reward_weight(self.time_difficulty_percent(index)?);
        let level = usize_to_f64(self.cycle.level());
        let mut rewards = Rewards {
            cycle_completed,
            ..Rewards::default()
        };

        if cycle_completed {
            rewards.refusals = round_f64_to_i64(REFUSAL_REWARD_RATE * weight * level).max(1);
        }
        if !reward_user {
            return Ok(rewards);
        }

        let base = self.random_price(TURN_REWARD_GUARANTEED, Some(index), rng)?;
        rewards.tokens = self.apply_coin_bonus(base);
        // A weight at or above the denominator is a sure photo.
        rewards.photo =
            weight >= PHOTO_CHANCE_OUT_OF || chance_of(rng, weight, PHOTO_CHANCE_OUT_OF)?;

        if self.cycle.is_max_difficulty() {
            rewards.prestige = true;
        } else {
            let headroom = COIN_BONUS_MAX - self.coin_bonus.get_f64();
            if headroom > 0.0 {
                rewards.coin_bonus_increase = (COIN_BONUS_PER_CYCLE / level).min(headroom);
            }
        }
        Ok(rewards)
    }

    /// Credit planned rewards. `period` is the caging that earned them.
    pub(crate) fn apply_rewards(
        &mut self,
        rewards: &Rewards,
        period: Minutes,
    ) -> Result<(), GameError> {
        if rewards.refusals > 0 {
            self.refusals.add(i64_to_f64(rewards.refusals));
            self.stats.refusals_mut().earned.add(rewards.refusals)?;
            log::info!(
                target: LOG_TARGET,
                "{} completed a cycle (+{} refusals)",
                self.name,
                rewards.refusals
            );
        }
        if rewards.tokens > 0 {
            self.tokens.add(i64_to_f64(rewards.tokens));
            self.stats.tokens_mut().earned.add(rewards.tokens)?;
        }
        if rewards.photo {
            self.photos.add(1.0);
            self.stats.photos_mut().earned.add(1)?;
        }
        if rewards.coin_bonus_increase > 0.0 {
            self.coin_bonus.add(rewards.coin_bonus_increase);
        }
        if rewards.prestige {
            self.stats.time_mut().max_difficulty_successful.add(period)?;
            self.prestige.add(1.0);
        }
        Ok(())
    }

    /// Decide what a failed turn costs, without touching balances.
    ///
    /// Tries, in order: the whole penalty in tokens, every remaining token,
    /// two refusals, every photo. `None` means nothing is left to take.
    #[must_use]
    pub fn plan_loss(&self, penalty: i64) -> Option<Loss> {
        let tokens = self.tokens.get_f64();
        if tokens - i64_to_f64(penalty) >= 0.0 {
            Some(Loss::Tokens(penalty))
        } else if tokens > 0.0 {
            Some(Loss::AllTokens(self.tokens.get_int()))
        } else if self.refusals.get_f64() - i64_to_f64(FAILURE_REFUSAL_COST) >= 0.0 {
            Some(Loss::Refusals(FAILURE_REFUSAL_COST))
        } else if self.photos.get_f64() > 0.0 {
            Some(Loss::AllPhotos(self.photos.get_int()))
        } else {
            None
        }
    }

    pub(crate) fn apply_loss(&mut self, loss: Loss) -> Result<(), GameError> {
        match loss {
            Loss::Tokens(amount) => {
                self.tokens.subtract_above_zero(i64_to_f64(amount));
                self.stats.tokens_mut().lost.add(amount)?;
            }
            Loss::AllTokens(amount) => {
                self.tokens.clear();
                self.stats.tokens_mut().lost.add(amount.max(0))?;
            }
            Loss::Refusals(amount) => self.refusals.subtract_above_zero(i64_to_f64(amount)),
            Loss::AllPhotos(_) => self.photos.clear(),
        }
        log::debug!(target: LOG_TARGET, "{} lost {loss:?}", self.name);
        Ok(())
    }

    /// Pay for a bathroom break. Only allowed while caged.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] while uncaged and
    /// [`GameError::InsufficientResources`] when tokens fall short.
    pub fn buy_bathroom_break(&mut self) -> Result<Purchase, GameError> {
        self.require_state(Action::BuyBathroomBreak, CagingState::Caged)?;
        let cost = self.bathroom_break_cost();
        self.spend_tokens(cost)?;
        self.stats.tokens_mut().spent.bathroom_break.add(cost)?;
        Ok(Purchase {
            resource: Resource::Tokens,
            cost,
            remaining: self.tokens(),
        })
    }

    /// Redeem one photo.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientResources`] when no photo is available.
    pub fn redeem_photo(&mut self) -> Result<Purchase, GameError> {
        if !self.photos.purchase(1.0) {
            log::warn!(target: LOG_TARGET, "{} has no photo to redeem", self.name);
            return Err(GameError::InsufficientResources {
                resource: Resource::Photos,
                required: 1,
                available: self.photos(),
            });
        }
        self.stats.photos_mut().spent.add(1)?;
        Ok(Purchase {
            resource: Resource::Photos,
            cost: 1,
            remaining: self.photos(),
        })
    }

    pub(crate) fn spend_tokens(&mut self, cost: i64) -> Result<(), GameError> {
        if self.tokens.purchase(i64_to_f64(cost)) {
            return Ok(());
        }
        log::warn!(
            target: LOG_TARGET,
            "{} cannot afford {cost} tokens (has {})",
            self.name,
            self.tokens()
        );
        Err(GameError::InsufficientResources {
            resource: Resource::Tokens,
            required: cost,
            available: self.tokens(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileSeed;
    use crate::profile::tests::profile_with;
    use crate::rng::ScriptedRandom;

    fn seeded(tokens: f64, refusals: f64, photos: f64) -> ProfileSeed {
        ProfileSeed {
            tokens,
            refusals,
            photos,
            ..ProfileSeed::default()
        }
    }

    #[test]
    fn prices_scale_with_modifier() {
        let profile = profile_with(ProfileSeed::default(), 5, &[2]);
        assert_eq!(profile.caging_cost(), 16);
        assert_eq!(profile.bathroom_break_cost(), 8);
        let profile = profile_with(ProfileSeed::default(), 105, &[2]);
        assert_eq!(profile.caging_cost(), 31);
        assert_eq!(profile.bathroom_break_cost(), 16);
        assert_eq!(profile.average_caging_cost(), 23);
    }

    #[test]
    fn time_difficulty_is_relative_to_level_span() {
        let profile = profile_with(ProfileSeed::default(), 5, &[3]);
        assert!((profile.time_difficulty_percent(0).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(matches!(
            profile.time_difficulty_percent(1),
            Err(GameError::PortionOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn random_price_splits_guaranteed_and_random() {
        // portion 3 of span 3: alteration 1.5, altered 5.75 * 1.5 = 8.625
        let profile = profile_with(ProfileSeed::default(), 5, &[3]);
        let mut rng = ScriptedRandom::new([0, 100], []);
        // guaranteed floor(8.625) = 8, span ceil(4.3125) = 5
        assert_eq!(profile.random_price(0.5, None, &mut rng).unwrap(), 8);
        assert_eq!(profile.random_price(0.5, None, &mut rng).unwrap(), 13);
    }

    #[test]
    fn coin_bonus_floors_the_result() {
        let seed = ProfileSeed {
            coin_bonus: 50.0,
            ..ProfileSeed::default()
        };
        let profile = profile_with(seed, 5, &[2]);
        assert_eq!(profile.apply_coin_bonus(5), 7);
        assert_eq!(profile.apply_coin_bonus(0), 0);
    }

    #[test]
    fn loss_cascade_order() {
        assert_eq!(
            profile_with(seeded(12.0, 5.0, 1.0), 5, &[2]).plan_loss(10),
            Some(Loss::Tokens(10))
        );
        assert_eq!(
            profile_with(seeded(3.0, 5.0, 1.0), 5, &[2]).plan_loss(10),
            Some(Loss::AllTokens(3))
        );
        assert_eq!(
            profile_with(seeded(0.0, 2.0, 1.0), 5, &[2]).plan_loss(10),
            Some(Loss::Refusals(2))
        );
        assert_eq!(
            profile_with(seeded(0.0, 1.0, 4.0), 5, &[2]).plan_loss(10),
            Some(Loss::AllPhotos(4))
        );
        assert_eq!(
            profile_with(seeded(0.0, 1.0, 0.0), 5, &[2]).plan_loss(10),
            None
        );
    }

    #[test]
    fn applied_token_losses_are_recorded() {
        let mut profile = profile_with(seeded(3.0, 0.0, 0.0), 5, &[2]);
        profile.apply_loss(Loss::AllTokens(3)).unwrap();
        assert_eq!(profile.tokens(), 0);
        assert_eq!(profile.stats().tokens().lost.get(), 3);
    }

    #[test]
    fn cycle_reward_grants_at_least_one_refusal() {
        let profile = profile_with(ProfileSeed::default(), 5, &[1]);
        let mut rng = ScriptedRandom::default();
        let rewards = profile.plan_rewards(0, true, false, &mut rng).unwrap();
        assert_eq!(rewards.refusals, 1);
        assert_eq!(rewards.tokens, 0);
        assert!(!rewards.photo);
        assert!(rng.is_exhausted());
    }

    #[test]
    fn coin_bonus_never_passes_the_cap() {
        let seed = ProfileSeed {
            coin_bonus: 198.0,
            ..ProfileSeed::default()
        };
        let profile = profile_with(seed, 5, &[1]);
        let mut rng = ScriptedRandom::new([0], [0.99]);
        let rewards = profile.plan_rewards(0, false, true, &mut rng).unwrap();
        assert!((rewards.coin_bonus_increase - 2.0).abs() < f64::EPSILON);
        assert!(!rewards.photo);
    }

    #[test]
    fn side_purchases() {
        let mut profile = profile_with(seeded(20.0, 0.0, 1.0), 5, &[2]);
        assert!(matches!(
            profile.buy_bathroom_break(),
            Err(GameError::InvalidState { .. })
        ));
        let purchase = profile.redeem_photo().unwrap();
        assert_eq!(purchase.remaining, 0);
        assert_eq!(profile.stats().photos().spent.get(), 1);
        assert!(matches!(
            profile.redeem_photo(),
            Err(GameError::InsufficientResources {
                resource: Resource::Photos,
                ..
            })
        ));
    }
}
