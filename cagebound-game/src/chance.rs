//! Weighted coin flips.
use thiserror::Error;

use crate::rng::RandomSource;

/// Rejected chance parameters.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ChanceError {
    #[error("chance parameters must not be negative (chance {chance}, out of {out_of})")]
    Negative { chance: f64, out_of: f64 },
    #[error("chance {chance} out of {out_of} is certain; use a plain branch instead")]
    Certain { chance: f64, out_of: f64 },
}

/// Succeeds with probability `chance / out_of`.
///
/// Draws one unit float `u` and returns `u * out_of <= chance`.
///
/// # Errors
///
/// Returns [`ChanceError`] when either argument is negative or `chance`
/// reaches `out_of`. No draw is consumed in that case.
pub fn chance_of<R: RandomSource + ?Sized>(
    rng: &mut R,
    chance: f64,
    out_of: f64,
) -> Result<bool, ChanceError> {
    if chance < 0.0 || out_of < 0.0 {
        return Err(ChanceError::Negative { chance, out_of });
    }
    if chance >= out_of {
        return Err(ChanceError::Certain { chance, out_of });
    }
    Ok(rng.unit() * out_of <= chance)
}
