//! Centralized balance and tuning constants for Cagebound progression logic.
//!
//! These values define the economy and difficulty math. Keeping them
//! together ensures that balance can only be adjusted via code changes
//! reviewed in version control, rather than through edited save files.

// Logging ------------------------------------------------------------------
pub(crate) const LOG_TARGET: &str = "cagebound::engine";

// Difficulty cycle -----------------------------------------------------------
/// Level (portion count) of the very first cycle.
pub const BASE_LEVEL: usize = 1;
/// Inclusive range of the first cycle's price modifier, in percent.
pub const PRICE_RANGE: (i64, i64) = (5, 105);
/// Inclusive range of the first cycle's portion values.
pub const PORTION_RANGE: (i64, i64) = (1, 4);
/// Level at which the cycle stops growing and prestige becomes the reward.
pub const MAX_DIFFICULTY: usize = 16;
/// Price modifier shift applied per level above [`BASE_LEVEL`].
pub const PRICE_SHIFT_PER_LEVEL: i64 = 10;
/// Each level adds one unit to the minimum portion every this many levels.
pub const LEVELS_PER_MIN_PORTION_STEP: f64 = 4.0;
/// Level-up roll: chance of any increase.
pub(crate) const LEVEL_UP_CHANCE: (f64, f64) = (1.0, 4.0);
/// Level-up roll: chance the increase is two levels instead of one.
pub(crate) const DOUBLE_LEVEL_UP_CHANCE: (f64, f64) = (1.0, 3.0);

// Caging ---------------------------------------------------------------------
/// Minutes of caging per portion unit.
pub const MINUTES_PER_PORTION: i64 = 15;
/// Seconds past which a caging start is rounded up to the next minute.
pub(crate) const ROUND_UP_SECOND: u32 = 30;

// Economy --------------------------------------------------------------------
/// Base token price of a purchased caging before the price modifier.
pub const CAGING_BASE_PRICE: i64 = 15;
/// Base token price of a bathroom break before the price modifier.
pub const BATHROOM_BREAK_BASE_PRICE: i64 = 8;
/// Upper bound of the coin bonus, in percent.
pub const COIN_BONUS_MAX: f64 = 200.0;
/// Coin bonus accrued over a whole cycle; each turn earns this divided by the level.
pub(crate) const COIN_BONUS_PER_CYCLE: f64 = 10.0 * 0.5;
/// Average refusals granted per completed turn.
pub(crate) const REFUSAL_REWARD_RATE: f64 = 1.0 / 7.0;
/// Turns it should take on average to earn one purchased caging.
pub(crate) const TURNS_PER_CAGING: f64 = 4.0;
/// Guaranteed share of a turn reward.
pub(crate) const TURN_REWARD_GUARANTEED: f64 = 0.5;
/// Guaranteed share of a failure penalty.
pub(crate) const FAILURE_PENALTY_GUARANTEED: f64 = 0.0;
/// Denominator of the photo reward roll.
pub(crate) const PHOTO_CHANCE_OUT_OF: f64 = 4.0;
/// Chance that a refusal attempt fails.
pub(crate) const REFUSAL_FAIL_CHANCE: (f64, f64) = (1.0, 4.0);
/// Refusals forfeited on a failed turn once tokens are gone.
pub(crate) const FAILURE_REFUSAL_COST: i64 = 2;
