//! Session driver tying profile actions to persistence.
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::ProfileStorage;
use crate::constants::LOG_TARGET;
use crate::cycle::CycleConfig;
use crate::error::GameError;
use crate::outcome::{Action, ActionReport};
use crate::profile::{Profile, ProfileSeed, normalize_name};
use crate::rng::RandomSource;

/// Failures while driving a session.
#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("profile storage failed")]
    Storage(#[source] E),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("{0} was eliminated; the session is over")]
    SessionTerminated(String),
}

/// One player's live session.
#[derive(Debug, Clone)]
pub struct Session {
    profile: Profile,
    created: bool,
    terminated: bool,
}

impl Session {
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    /// True when the profile did not exist and was created for this session.
    #[must_use]
    pub const fn was_created(&self) -> bool {
        self.created
    }

    /// True after an elimination. Nothing more is saved for this session.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }
}

/// Runs one action at a time and persists after each.
pub struct ProgressionEngine<S, R>
where
    S: ProfileStorage,
    R: RandomSource,
{
    storage: S,
    rng: R,
    seed: ProfileSeed,
    config: CycleConfig,
}

impl<S, R> ProgressionEngine<S, R>
where
    S: ProfileStorage,
    R: RandomSource,
{
    /// Engine creating default profiles.
    pub fn new(storage: S, rng: R) -> Self {
        Self::with_defaults(storage, rng, ProfileSeed::default(), CycleConfig::default())
    }

    /// Engine creating profiles from `seed` balances and `config` cycles.
    pub const fn with_defaults(
        storage: S,
        rng: R,
        seed: ProfileSeed,
        config: CycleConfig,
    ) -> Self {
        Self {
            storage,
            rng,
            seed,
            config,
        }
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn rng(&self) -> &R {
        &self.rng
    }

    /// Load `name`, or create and immediately save a fresh profile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Game`] for a blank name or unusable cycle
    /// configuration, and [`EngineError::Storage`] when loading or the
    /// initial save fails.
    pub fn load_or_create(&mut self, name: &str) -> Result<Session, EngineError<S::Error>> {
        let name = normalize_name(name)?;
        if let Some(profile) = self
            .storage
            .load_profile(&name)
            .map_err(EngineError::Storage)?
        {
            log::debug!(target: LOG_TARGET, "loaded profile {name}");
            return Ok(Session {
                profile,
                created: false,
                terminated: false,
            });
        }

        let profile = Profile::with_config(&name, self.seed, self.config, &mut self.rng)?;
        self.storage
            .save_profile(&name, &profile)
            .map_err(EngineError::Storage)?;
        log::info!(target: LOG_TARGET, "created profile {name}");
        Ok(Session {
            profile,
            created: true,
            terminated: false,
        })
    }

    /// Run one action, then save; on elimination delete instead and end the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionTerminated`] once the session has ended,
    /// [`EngineError::Game`] when the action is rejected (nothing is saved
    /// then), and [`EngineError::Storage`] when the save or delete fails.
    pub fn perform(
        &mut self,
        session: &mut Session,
        action: Action,
        now: NaiveDateTime,
    ) -> Result<ActionReport, EngineError<S::Error>> {
        ensure_live(session)?;
        let rng = &mut self.rng;
        let profile = &mut session.profile;
        let report = match action {
            Action::CommandCaging => ActionReport::Caged(profile.command_caging(rng, now)?),
            Action::BuyCaging => ActionReport::Caged(profile.buy_caging(rng, now)?),
            Action::MarkSuccess => ActionReport::Uncaged(profile.uncage(true, true, rng)?),
            Action::MarkFailure => ActionReport::Uncaged(profile.uncage(false, true, rng)?),
            Action::RefuseCaging => ActionReport::Refusal(profile.refuse_caging(rng)?),
            Action::BuyBathroomBreak => ActionReport::Purchased(profile.buy_bathroom_break()?),
            Action::RedeemPhoto => ActionReport::Purchased(profile.redeem_photo()?),
        };

        if report.is_eliminated() {
            session.terminated = true;
            let existed = self
                .storage
                .delete_profile(session.profile.name())
                .map_err(EngineError::Storage)?;
            log::info!(
                target: LOG_TARGET,
                "deleted eliminated profile {} (existed: {existed})",
                session.profile.name()
            );
        } else {
            self.save(session)?;
        }
        Ok(report)
    }

    /// Persist the session's profile.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionTerminated`] after an elimination and
    /// [`EngineError::Storage`] when the write fails.
    pub fn save(&self, session: &Session) -> Result<(), EngineError<S::Error>> {
        ensure_live(session)?;
        self.storage
            .save_profile(session.profile.name(), &session.profile)
            .map_err(EngineError::Storage)
    }
}

fn ensure_live<E: std::error::Error + 'static>(session: &Session) -> Result<(), EngineError<E>> {
    if session.terminated {
        return Err(EngineError::SessionTerminated(
            session.profile.name().to_string(),
        ));
    }
    Ok(())
}
