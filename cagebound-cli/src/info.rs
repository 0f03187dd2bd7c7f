use cagebound_game::constants::{BATHROOM_BREAK_BASE_PRICE, CAGING_BASE_PRICE, COIN_BONUS_MAX};

/// Help text for the Show Info menu entry.
pub fn info_text() -> String {
    format!(
        "\
--- Info ---
-- Turns --
Every turn has two periods.
Uncaged: nothing is required of you. You can view stats, redeem photos, or
start the next caging yourself [Beg] or wait to be commanded [Be Commanded].
Caged: stay in the cage for the assigned period (give or take 3 minutes).
Staying the course is a success [Be Praised]; anything else is a failure
[Be Punished]. You may also try to refuse [Grovel] or pay for a bathroom
break [Relief].

-- Cycles --
A cycle is a run of turns, one per portion. Difficulty adds portions to later
cycles, and some rewards are only given when a cycle is completed.

-- Tokens --
The main currency. Successful turns pay tokens; begging, bathroom breaks and
failures cost them.

-- Photos --
A redeemable reward [Admire], sometimes earned with a successful turn.

-- Refusals --
Earned only by completing cycles, more at higher difficulty. A refusal
[Grovel] fails one time in four and leaves you caged. A successful refusal
ends the caging and still completes the turn.

-- Coin Bonus --
Multiplies every token reward and penalty. It grows with each successful turn
and never exceeds {COIN_BONUS_MAX}%.

-- Prices --
Begging costs {CAGING_BASE_PRICE} tokens and a bathroom break
{BATHROOM_BREAK_BASE_PRICE} tokens before the cycle's price modifier applies.

-- Punishment --
A failure takes, in order: the penalty in tokens if you can pay it, otherwise
all of your tokens; with no tokens, 2 refusals; with fewer than 2 refusals,
all of your photos. With nothing left at all, the profile is ERASED.

-- Subjectivity --
Your keyholder decides whether a caging counts as complete.

"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_mentions_live_limits() {
        let text = info_text();
        assert!(text.starts_with("--- Info ---"));
        assert!(text.contains("200%"));
        assert!(text.contains("Begging costs 15 tokens"));
        assert!(text.contains("ERASED"));
    }
}
