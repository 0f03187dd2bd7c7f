//! Cagebound Progression Engine
//!
//! Platform-agnostic core rules for the Cagebound turn-based caging game:
//! difficulty cycles, the caged/uncaged state machine, the token economy and
//! the append-only statistics ledger. No terminal or file handling lives here.

pub mod chance;
pub mod constants;
pub mod counter;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod numbers;
pub mod outcome;
pub mod profile;
pub mod rng;

// Re-export commonly used types
pub use chance::{ChanceError, chance_of};
pub use counter::{BoundedCounter, Direction};
pub use cycle::{ConfigError, CycleConfig, DifficultyCycle, PortionSet};
pub use engine::{EngineError, ProgressionEngine, Session};
pub use error::GameError;
pub use ledger::{AddOnly, Derived, LedgerError, Minutes, ProgressLedger, Tally};
pub use outcome::{
    Action, ActionReport, CagingStarted, CagingState, Loss, Purchase, RefusalOutcome, Resource,
    Rewards, UncageOutcome,
};
pub use profile::{Profile, ProfileSeed, normalize_name};
pub use rng::{GameRng, RandomSource, ScriptedRandom};

/// Trait for abstracting profile persistence
/// Platform-specific implementations should provide this
pub trait ProfileStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a profile, `None` when no profile is stored under `name`
    ///
    /// # Errors
    ///
    /// Returns an error if a stored profile exists but cannot be read.
    fn load_profile(&self, name: &str) -> Result<Option<Profile>, Self::Error>;

    /// Save a profile, replacing any previous copy as a whole
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be saved.
    fn save_profile(&self, name: &str, profile: &Profile) -> Result<(), Self::Error>;

    /// Delete a stored profile, returning whether one existed
    ///
    /// # Errors
    ///
    /// Returns an error if the profile exists but cannot be deleted.
    fn delete_profile(&self, name: &str) -> Result<bool, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, Profile>>>,
        writes: Rc<RefCell<usize>>,
    }

    impl ProfileStorage for MemoryStorage {
        type Error = Infallible;

        fn load_profile(&self, name: &str) -> Result<Option<Profile>, Self::Error> {
            Ok(self.saves.borrow().get(name).cloned())
        }

        fn save_profile(&self, name: &str, profile: &Profile) -> Result<(), Self::Error> {
            *self.writes.borrow_mut() += 1;
            self.saves
                .borrow_mut()
                .insert(name.to_string(), profile.clone());
            Ok(())
        }

        fn delete_profile(&self, name: &str) -> Result<bool, Self::Error> {
            Ok(self.saves.borrow_mut().remove(name).is_some())
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn load_or_create_saves_new_profiles() {
        let storage = MemoryStorage::default();
        let mut engine = ProgressionEngine::new(storage.clone(), GameRng::from_user_seed(1));
        let session = engine.load_or_create("  robin ").unwrap();
        assert!(session.was_created());
        assert_eq!(session.profile().name(), "Robin");
        assert!(storage.saves.borrow().contains_key("Robin"));

        let again = engine.load_or_create("ROBIN").unwrap();
        assert!(!again.was_created());
        assert_eq!(again.profile(), session.profile());
    }

    #[test]
    fn actions_are_saved_after_success_only() {
        let storage = MemoryStorage::default();
        let mut engine = ProgressionEngine::new(storage.clone(), GameRng::from_user_seed(2));
        let mut session = engine.load_or_create("sam").unwrap();
        let writes = *storage.writes.borrow();

        let err = engine
            .perform(&mut session, Action::BuyCaging, noon())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Game(GameError::InsufficientResources { .. })
        ));
        assert_eq!(*storage.writes.borrow(), writes);

        let report = engine
            .perform(&mut session, Action::CommandCaging, noon())
            .unwrap();
        assert!(matches!(report, ActionReport::Caged(_)));
        assert_eq!(*storage.writes.borrow(), writes + 1);
        let stored = storage.saves.borrow().get("Sam").cloned().unwrap();
        assert!(stored.is_caged());
    }

    #[test]
    fn elimination_deletes_and_ends_the_session() {
        let storage = MemoryStorage::default();
        let cycle = DifficultyCycle::from_parts(5, [4], 0).unwrap();
        let profile = Profile::new("Kit", ProfileSeed::default(), cycle).unwrap();
        storage.save_profile("Kit", &profile).unwrap();

        let mut engine = ProgressionEngine::new(storage.clone(), ScriptedRandom::new([6], []));
        let mut session = engine.load_or_create("kit").unwrap();
        engine
            .perform(&mut session, Action::CommandCaging, noon())
            .unwrap();
        let writes = *storage.writes.borrow();

        let report = engine
            .perform(&mut session, Action::MarkFailure, noon())
            .unwrap();
        assert!(report.is_eliminated());
        assert!(session.is_terminated());
        assert!(!storage.saves.borrow().contains_key("Kit"));
        assert_eq!(*storage.writes.borrow(), writes);

        assert!(matches!(
            engine.perform(&mut session, Action::RedeemPhoto, noon()),
            Err(EngineError::SessionTerminated(name)) if name == "Kit"
        ));
        assert!(matches!(
            engine.save(&session),
            Err(EngineError::SessionTerminated(_))
        ));
        assert_eq!(*storage.writes.borrow(), writes);
    }
}
