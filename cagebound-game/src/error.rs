use thiserror::Error;

use crate::chance::ChanceError;
use crate::cycle::ConfigError;
use crate::ledger::LedgerError;
use crate::outcome::{Action, CagingState, Resource};

/// Errors surfaced by profile operations.
///
/// None of these leave a profile half-updated: every check runs before the
/// first mutation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not enough {resource}: need {required}, have {available}")]
    InsufficientResources {
        resource: Resource,
        required: i64,
        available: i64,
    },
    #[error("cannot {action} while {state}")]
    InvalidState { action: Action, state: CagingState },
    #[error("portion index {index} is out of range for {len} portions")]
    PortionOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Chance(#[from] ChanceError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
