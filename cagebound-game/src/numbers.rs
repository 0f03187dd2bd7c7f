//! Numeric conversion helpers centralizing safe numeric casts.
//!
//! Every rounding in the engine goes through this module. Rounding is
//! half-away-from-zero (`f64::round`), so a displayed cost of `22.5` becomes
//! `23`.

use num_traits::cast::cast;

/// Divide two values, returning 0.0 whenever the quotient is NaN or infinite.
#[must_use]
pub fn divide(numerator: f64, denominator: f64) -> f64 {
    let result = numerator / denominator;
    if result.is_finite() { result } else { 0.0 }
}

/// Round a f64 (half away from zero) and clamp it to the i64 range, returning 0 for NaN.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    clamp_to_i64(value, f64::round)
}

/// Floor a f64 and clamp it to the i64 range, returning 0 for NaN.
#[must_use]
pub fn floor_f64_to_i64(value: f64) -> i64 {
    clamp_to_i64(value, f64::floor)
}

/// Ceil a f64 and clamp it to the i64 range, returning 0 for NaN.
#[must_use]
pub fn ceil_f64_to_i64(value: f64) -> i64 {
    clamp_to_i64(value, f64::ceil)
}

fn clamp_to_i64(value: f64, op: fn(f64) -> f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = op(value).clamp(min, max);
    cast::<f64, i64>(clamped).unwrap_or(if clamped > 0.0 { i64::MAX } else { i64::MIN })
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Convert usize to i64, saturating at `i64::MAX`.
#[must_use]
pub fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Convert i64 to usize, mapping negative values to 0.
#[must_use]
pub fn i64_to_usize(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}
