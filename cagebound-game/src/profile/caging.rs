//! Caged/uncaged transitions.
use chrono::{NaiveDateTime, TimeDelta, Timelike};

use crate::chance::chance_of;
use crate::constants::{
    CAGING_BASE_PRICE, FAILURE_PENALTY_GUARANTEED, LOG_TARGET, MINUTES_PER_PORTION,
    REFUSAL_FAIL_CHANCE, ROUND_UP_SECOND,
};
use crate::cycle::{ConfigError, DifficultyCycle};
use crate::error::GameError;
use crate::ledger::Minutes;
use crate::outcome::{
    Action, CagingStarted, CagingState, RefusalOutcome, Resource, Rewards, UncageOutcome,
};
use crate::rng::RandomSource;

use super::Profile;
use super::economy::scaled_price;

/// Drop seconds, moving to the next minute from the half-minute on.
fn round_to_minute(now: NaiveDateTime) -> NaiveDateTime {
    let truncated = now
        - TimeDelta::seconds(i64::from(now.second()))
        - TimeDelta::nanoseconds(i64::from(now.nanosecond()));
    if now.second() >= ROUND_UP_SECOND {
        truncated + TimeDelta::minutes(1)
    } else {
        truncated
    }
}

impl Profile {
    /// Start a free caging.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] when already caged.
    pub fn command_caging<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
        now: NaiveDateTime,
    ) -> Result<CagingStarted, GameError> {
        self.begin_caging(Action::CommandCaging, rng, now)
    }

    /// Start a caging paid for with tokens.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] when already caged and
    /// [`GameError::InsufficientResources`] when the caging is unaffordable.
    pub fn buy_caging<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
        now: NaiveDateTime,
    ) -> Result<CagingStarted, GameError> {
        self.begin_caging(Action::BuyCaging, rng, now)
    }

    fn begin_caging<R: RandomSource + ?Sized>(
        &mut self,
        action: Action,
        rng: &mut R,
        now: NaiveDateTime,
    ) -> Result<CagingStarted, GameError> {
        self.require_state(action, CagingState::Uncaged)?;

        // A finished cycle is replaced before its next turn begins.
        let replacement = if self.cycle.is_complete() {
            Some(self.cycle.next_cycle(rng)?)
        } else {
            None
        };
        let cycle = replacement.as_ref().unwrap_or(&self.cycle);
        let Some(portion) = cycle.current_portion() else {
            return Err(GameError::PortionOutOfRange {
                index: cycle.completed(),
                len: cycle.level(),
            });
        };
        let period = Minutes::new(MINUTES_PER_PORTION * portion);
        let price = scaled_price(CAGING_BASE_PRICE, cycle.price_modifier());

        let purchased = action == Action::BuyCaging;
        let cost = if purchased {
            self.spend_tokens(price)?;
            self.stats.tokens_mut().spent.begging.add(price)?;
            Some(price)
        } else {
            None
        };

        if let Some(cycle) = replacement {
            self.cycle = cycle;
        }
        let started = round_to_minute(now);
        self.last_caging_was_purchased = purchased;
        self.caging_period = period;
        self.caging_started = Some(started);
        log::debug!(
            target: LOG_TARGET,
            "{} caged for {period} at {started} (purchased: {purchased})",
            self.name
        );
        Ok(CagingStarted {
            started,
            period,
            purchased,
            cost,
        })
    }

    /// End the current caging.
    ///
    /// A success advances the cycle and pays out rewards (only the cycle
    /// reward when `reward_user` is false). A failure takes a penalty through
    /// the loss cascade and redraws the failed portion. When the cascade finds
    /// nothing left to take the result is [`UncageOutcome::Eliminated`] and the
    /// profile is left untouched for the caller to delete.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] while uncaged; [`GameError::Config`] when
    /// the stored cycle is already complete.
    pub fn uncage<R: RandomSource + ?Sized>(
        &mut self,
        successful: bool,
        reward_user: bool,
        rng: &mut R,
    ) -> Result<UncageOutcome, GameError> {
        let action = if successful {
            Action::MarkSuccess
        } else {
            Action::MarkFailure
        };
        self.require_state(action, CagingState::Caged)?;
        self.require_open_cycle()?;

        if successful {
            let rewards = self.finish_success(reward_user, rng)?;
            Ok(UncageOutcome::Completed(rewards))
        } else {
            self.finish_failure(rng)
        }
    }

    /// Spend a refusal to try to skip the current caging.
    ///
    /// Fails one time in four, leaving the player caged. A successful refusal
    /// completes the turn without the regular turn reward.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidState`] while uncaged and
    /// [`GameError::InsufficientResources`] without a refusal to spend.
    pub fn refuse_caging<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<RefusalOutcome, GameError> {
        self.require_state(Action::RefuseCaging, CagingState::Caged)?;
        self.require_open_cycle()?;
        if self.refusals.get_f64() - 1.0 < 0.0 {
            log::warn!(target: LOG_TARGET, "{} has no refusal to spend", self.name);
            return Err(GameError::InsufficientResources {
                resource: Resource::Refusals,
                required: 1,
                available: self.refusals(),
            });
        }

        let period = self.caging_period;
        if chance_of(rng, REFUSAL_FAIL_CHANCE.0, REFUSAL_FAIL_CHANCE.1)? {
            self.refusals.subtract_above_zero(1.0);
            self.stats.refusals_mut().unsuccessfully.add(1)?;
            self.stats.time_refused_mut().unsuccessfully.add(period)?;
            log::debug!(target: LOG_TARGET, "{} failed to refuse", self.name);
            return Ok(RefusalOutcome::StillCaged);
        }

        let rewards = self.finish_success(false, rng)?;
        self.refusals.subtract_above_zero(1.0);
        self.stats.refusals_mut().successfully.add(1)?;
        self.stats.time_refused_mut().successfully.add(period)?;
        Ok(RefusalOutcome::Refused(rewards))
    }

    fn require_open_cycle(&self) -> Result<(), GameError> {
        if self.cycle.is_complete() {
            return Err(ConfigError::Inconsistent("caged on a completed cycle").into());
        }
        Ok(())
    }

    fn finish_success<R: RandomSource + ?Sized>(
        &mut self,
        reward_user: bool,
        rng: &mut R,
    ) -> Result<Rewards, GameError> {
        let index = self.cycle.completed();
        let cycle_completed = index + 1 >= self.cycle.level();
        let mut rewards = self.plan_rewards(index, cycle_completed, reward_user, rng)?;
        let next = if cycle_completed {
            Some(self.cycle.next_cycle(rng)?)
        } else {
            None
        };
        rewards.next_level = next.as_ref().map(DifficultyCycle::level);

        let period = self.caging_period;
        self.attribute_time(period)?;
        self.cycle.advance();
        self.stats.turns_mut().successfully.add(1)?;
        self.apply_rewards(&rewards, period)?;
        if let Some(next) = next {
            self.cycle = next;
        }
        self.close_caging();
        Ok(rewards)
    }

    fn finish_failure<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<UncageOutcome, GameError> {
        let base = self.random_price(FAILURE_PENALTY_GUARANTEED, None, rng)?;
        let penalty = self.apply_coin_bonus(base);
        let Some(loss) = self.plan_loss(penalty) else {
            log::info!(target: LOG_TARGET, "{} has nothing left and is eliminated", self.name);
            return Ok(UncageOutcome::Eliminated {
                name: self.name.clone(),
            });
        };
        let mut cycle = self.cycle.clone();
        cycle.replace_random(None, rng)?;

        let period = self.caging_period;
        self.attribute_time(period)?;
        self.apply_loss(loss)?;
        self.cycle = cycle;
        self.stats.turns_mut().unsuccessfully.add(1)?;
        self.stats
            .time_failed_mut()
            .attribute(self.last_caging_was_purchased, period)?;
        self.close_caging();
        Ok(UncageOutcome::Penalized { penalty, loss })
    }

    fn attribute_time(&mut self, period: Minutes) -> Result<(), GameError> {
        let purchased = self.last_caging_was_purchased;
        self.stats
            .time_mut()
            .assigned
            .attribute(purchased, period)?;
        Ok(())
    }

    fn close_caging(&mut self) {
        self.caging_started = None;
        self.caging_period = Minutes::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Loss;
    use crate::profile::ProfileSeed;
    use crate::profile::tests::profile_with;
    use crate::rng::ScriptedRandom;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn tokens(amount: f64) -> ProfileSeed {
        ProfileSeed {
            tokens: amount,
            ..ProfileSeed::default()
        }
    }

    #[test]
    fn start_time_rounds_to_the_minute() {
        assert_eq!(round_to_minute(at(10, 4, 29)), at(10, 4, 0));
        assert_eq!(round_to_minute(at(10, 4, 30)), at(10, 5, 0));
        assert_eq!(round_to_minute(at(23, 59, 45)).time(), at(0, 0, 0).time());
    }

    #[test]
    fn command_caging_is_free() {
        let mut profile = profile_with(ProfileSeed::default(), 5, &[3, 1]);
        let mut rng = ScriptedRandom::default();
        let started = profile.command_caging(&mut rng, at(9, 0, 10)).unwrap();
        assert_eq!(started.period, Minutes::new(45));
        assert_eq!(started.cost, None);
        assert!(!started.purchased);
        assert_eq!(profile.state(), CagingState::Caged);
        assert_eq!(profile.caging_ends(), Some(at(9, 45, 0)));
        assert!(matches!(
            profile.command_caging(&mut rng, at(9, 1, 0)),
            Err(GameError::InvalidState {
                action: Action::CommandCaging,
                state: CagingState::Caged
            })
        ));
    }

    #[test]
    fn unaffordable_caging_changes_nothing() {
        let mut profile = profile_with(tokens(15.0), 5, &[2]);
        let before = profile.clone();
        let mut rng = ScriptedRandom::default();
        let err = profile.buy_caging(&mut rng, at(9, 0, 0)).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientResources {
                resource: Resource::Tokens,
                required: 16,
                available: 15,
            }
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn successful_turn_pays_rewards() {
        let mut profile = profile_with(tokens(0.0), 5, &[2, 4]);
        let mut rng = ScriptedRandom::new([1], [0.0]);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let outcome = profile.uncage(true, true, &mut rng).unwrap();
        // portion 2 of span 4: 0.5 -> altered 5.75, fixed 5, roll 1
        let UncageOutcome::Completed(rewards) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert!(!rewards.cycle_completed);
        assert_eq!(rewards.tokens, 6);
        assert!(rewards.photo);
        assert!((rewards.coin_bonus_increase - 2.5).abs() < f64::EPSILON);
        assert_eq!(profile.tokens(), 6);
        assert_eq!(profile.photos(), 1);
        assert_eq!(profile.cycle().completed(), 1);
        assert_eq!(profile.state(), CagingState::Uncaged);
        assert_eq!(profile.caging_period(), Minutes::ZERO);
        let stats = profile.stats();
        assert_eq!(stats.turns().successfully.get(), 1);
        assert_eq!(stats.time().assigned.commanded.get(), Minutes::new(30));
        assert_eq!(stats.tokens().earned.get(), 6);
    }

    #[test]
    fn completing_the_last_portion_regenerates() {
        let mut profile = profile_with(ProfileSeed::default(), 5, &[1]);
        // reward roll, photo miss, no level-up, price, portion
        let mut rng = ScriptedRandom::new([0, 40, 3], [0.9, 0.9]);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let UncageOutcome::Completed(rewards) = profile.uncage(true, true, &mut rng).unwrap()
        else {
            panic!("expected completion");
        };
        assert!(rewards.cycle_completed);
        assert_eq!(rewards.refusals, 1);
        assert_eq!(rewards.next_level, Some(1));
        assert_eq!(profile.refusals(), 1);
        assert_eq!(profile.stats().cycles_completed().get(), 1);
        assert_eq!(profile.cycle().completed(), 0);
        assert_eq!(profile.cycle().portions(), &[3]);
        assert_eq!(profile.cycle().price_modifier(), 40);
        assert!(rng.is_exhausted());
    }

    #[test]
    fn failed_turn_takes_penalty_and_redraws() {
        let mut profile = profile_with(tokens(20.0), 5, &[4, 2]);
        // penalty span 9, roll 7; replacement draw 4 collides -> redraw 1
        let mut rng = ScriptedRandom::new([7, 4, 1], []);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let outcome = profile.uncage(false, true, &mut rng).unwrap();
        assert_eq!(
            outcome,
            UncageOutcome::Penalized {
                penalty: 7,
                loss: Loss::Tokens(7)
            }
        );
        assert_eq!(profile.tokens(), 13);
        assert_eq!(profile.cycle().portions(), &[1, 2]);
        assert_eq!(profile.cycle().completed(), 0);
        let stats = profile.stats();
        assert_eq!(stats.turns().unsuccessfully.get(), 1);
        assert_eq!(stats.time_failed().commanded.get(), Minutes::new(60));
        assert_eq!(stats.tokens().lost.get(), 7);
        assert_eq!(profile.state(), CagingState::Uncaged);
    }

    #[test]
    fn elimination_leaves_profile_untouched() {
        let mut profile = profile_with(ProfileSeed::default(), 5, &[4]);
        let mut rng = ScriptedRandom::new([5], []);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let before = profile.clone();
        let outcome = profile.uncage(false, true, &mut rng).unwrap();
        assert_eq!(
            outcome,
            UncageOutcome::Eliminated {
                name: "Tester".to_string()
            }
        );
        assert_eq!(profile, before);
    }

    #[test]
    fn zero_penalty_is_paid_by_an_empty_profile() {
        let mut profile = profile_with(ProfileSeed::default(), 5, &[4]);
        // penalty roll 0, replacement draw 2
        let mut rng = ScriptedRandom::new([0, 2], []);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let outcome = profile.uncage(false, true, &mut rng).unwrap();
        assert_eq!(
            outcome,
            UncageOutcome::Penalized {
                penalty: 0,
                loss: Loss::Tokens(0)
            }
        );
        assert_eq!(profile.tokens(), 0);
        assert_eq!(profile.refusals(), 0);
        assert_eq!(profile.photos(), 0);
        assert_eq!(profile.cycle().portions(), &[2]);
        assert_eq!(profile.stats().turns().unsuccessfully.get(), 1);
        assert_eq!(profile.stats().tokens().lost.get(), 0);
        assert_eq!(profile.state(), CagingState::Uncaged);
        assert!(rng.is_exhausted());
    }

    #[test]
    fn refusal_needs_a_refusal() {
        let mut profile = profile_with(ProfileSeed::default(), 5, &[2]);
        let mut rng = ScriptedRandom::default();
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let err = profile.refuse_caging(&mut rng).unwrap_err();
        assert!(matches!(
            err,
            GameError::InsufficientResources {
                resource: Resource::Refusals,
                required: 1,
                available: 0
            }
        ));
        assert_eq!(profile.state(), CagingState::Caged);
    }

    #[test]
    fn failed_refusal_stays_caged() {
        let seed = ProfileSeed {
            refusals: 2.0,
            ..ProfileSeed::default()
        };
        let mut profile = profile_with(seed, 5, &[2, 3]);
        let mut rng = ScriptedRandom::new([], [0.1]);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        assert_eq!(
            profile.refuse_caging(&mut rng).unwrap(),
            RefusalOutcome::StillCaged
        );
        assert_eq!(profile.refusals(), 1);
        assert_eq!(profile.state(), CagingState::Caged);
        assert_eq!(profile.stats().refusals().unsuccessfully.get(), 1);
        assert_eq!(
            profile.stats().time_refused().unsuccessfully.get(),
            Minutes::new(30)
        );
    }

    #[test]
    fn successful_refusal_skips_turn_reward() {
        let seed = ProfileSeed {
            refusals: 1.0,
            ..ProfileSeed::default()
        };
        let mut profile = profile_with(seed, 5, &[2, 3]);
        let mut rng = ScriptedRandom::new([], [0.5]);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let RefusalOutcome::Refused(rewards) = profile.refuse_caging(&mut rng).unwrap() else {
            panic!("expected refusal");
        };
        assert_eq!(rewards.tokens, 0);
        assert!(!rewards.cycle_completed);
        assert_eq!(profile.refusals(), 0);
        assert_eq!(profile.tokens(), 0);
        assert_eq!(profile.cycle().completed(), 1);
        assert_eq!(profile.state(), CagingState::Uncaged);
        let stats = profile.stats();
        assert_eq!(stats.refusals().successfully.get(), 1);
        assert_eq!(stats.time_refused().successfully.get(), Minutes::new(30));
        assert_eq!(stats.turns().successfully.get(), 1);
    }

    #[test]
    fn max_difficulty_success_grants_prestige() {
        let portions: Vec<i64> = (0..16).map(|i| 5 + (i % 2)).collect();
        let mut profile = profile_with(ProfileSeed::default(), 155, &portions);
        let mut rng = ScriptedRandom::new([0], [0.99]);
        profile.command_caging(&mut rng, at(8, 0, 0)).unwrap();
        let UncageOutcome::Completed(rewards) = profile.uncage(true, true, &mut rng).unwrap()
        else {
            panic!("expected completion");
        };
        assert!(rewards.prestige);
        assert!(rewards.coin_bonus_increase.abs() < f64::EPSILON);
        assert_eq!(profile.prestige(), 1);
        assert_eq!(
            profile.stats().time().max_difficulty_successful.get(),
            Minutes::new(75)
        );
    }
}
