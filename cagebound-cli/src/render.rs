//! Text rendering for status blocks, stat sheets and action outcomes.
use cagebound_game::numbers::{divide, floor_f64_to_i64, i64_to_f64};
use cagebound_game::{
    ActionReport, CagingStarted, Loss, Minutes, Profile, Purchase, RefusalOutcome, Resource,
    Rewards, UncageOutcome,
};
use chrono::NaiveDateTime;
use std::fmt::Write as _;

const STATUS_PADDING: usize = 40;
const DETAIL_PADDING: usize = 60;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn line(out: &mut String, padding: usize, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "{label:<padding$}{value}");
}

/// Percent with up to two decimals, truncated and without trailing zeros.
pub fn format_percent(fraction: f64) -> String {
    let hundredths = floor_f64_to_i64((fraction * 100.0 * 100.0).trunc());
    let whole = hundredths / 100;
    let decimals = (hundredths % 100).abs();
    if decimals == 0 {
        format!("{whole}%")
    } else if decimals % 10 == 0 {
        format!("{whole}.{}%", decimals / 10)
    } else {
        format!("{whole}.{decimals:02}%")
    }
}

/// "D days, H hours and M minutes", omitting zero parts, or "None".
pub fn format_minutes(minutes: Minutes) -> String {
    if minutes.is_zero() {
        return "None".to_string();
    }
    let (days, hours, mins) = minutes.days_hours_minutes();
    let mut result = String::new();
    for (joiner, value, unit) in [("", days, "day"), (", ", hours, "hour"), (" and ", mins, "minute")]
    {
        if value <= 0 {
            continue;
        }
        if !result.is_empty() {
            result.push_str(joiner);
        }
        let plural = if value > 1 { "s" } else { "" };
        let _ = write!(result, "{value} {unit}{plural}");
    }
    result
}

fn format_time(time: Option<NaiveDateTime>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.format(TIME_FORMAT).to_string())
}

/// Short status shown above every menu.
pub fn status(profile: &Profile) -> String {
    let mut out = format!("--- {}'s Stats ---\n", profile.name());
    let (completed, total) = profile.cycle_completion();
    let p = STATUS_PADDING;
    line(&mut out, p, "Tokens:", profile.tokens());
    line(&mut out, p, "Photos:", profile.photos());
    line(&mut out, p, "Refusals:", profile.refusals());
    line(&mut out, p, "Coin Bonus:", format!("{:.0}%", profile.coin_bonus()));
    line(&mut out, p, "Current Cost of Caging:", format!("{} tokens", profile.caging_cost()));
    line(
        &mut out,
        p,
        "Current Cost of Bathroom Break:",
        format!("{} tokens", profile.bathroom_break_cost()),
    );
    line(
        &mut out,
        p,
        "Current Cycle Completion:",
        format!(
            "{completed} of {total} portions (aka {:.0}%)",
            100.0 * profile.cycle().completion_fraction()
        ),
    );
    if profile.is_caged() {
        line(&mut out, p, "Caged at:", format_time(profile.caging_started()));
        line(&mut out, p, "Caging period length:", format_minutes(profile.caging_period()));
        line(&mut out, p, "Estimated uncaging at:", format_time(profile.caging_ends()));
    }
    if profile.cycle().is_max_difficulty() {
        line(&mut out, p, "Prestige:", profile.prestige());
    }
    out
}

/// Full statistics sheet.
pub fn detailed_stats(profile: &Profile) -> String {
    let stats = profile.stats();
    let cycle = profile.cycle();
    let tokens = stats.tokens();
    let photos = stats.photos();
    let refusals = stats.refusals();
    let time = stats.time();
    let failed = stats.time_failed();
    let refused = stats.time_refused();
    let turns = stats.turns();
    let average = cycle.average_time_difficulty();
    let weight_ratio = |weight: Minutes| {
        divide(
            i64_to_f64(weight.as_minutes()),
            i64_to_f64(average.as_minutes()),
        )
    };

    let p = DETAIL_PADDING;
    let mut out = format!("--- {}'s Detailed Stats ---\n", profile.name());
    out.push_str("-- Token Stats --\n");
    line(&mut out, p, "Tokens Earned:", tokens.earned.get());
    line(&mut out, p, "Tokens Spent:", tokens.spent.total().get());
    line(&mut out, p, "Tokens Spent %:", format_percent(stats.tokens_spent_pct()));
    line(&mut out, p, "Tokens Spent Begging:", tokens.spent.begging.get());
    line(
        &mut out,
        p,
        "Tokens Spent Begging %:",
        format_percent(stats.tokens_spent_begging_pct()),
    );
    line(&mut out, p, "Tokens Spent Bathroom Break:", tokens.spent.bathroom_break.get());
    line(
        &mut out,
        p,
        "Tokens Spent Bathroom Break %:",
        format_percent(stats.tokens_spent_bathroom_pct()),
    );
    line(&mut out, p, "Tokens Lost:", tokens.lost.get());
    line(&mut out, p, "Tokens Lost %:", format_percent(stats.tokens_lost_pct()));

    out.push_str("-- Photo Stats --\n");
    line(&mut out, p, "Photos Earned:", photos.earned.get());
    line(&mut out, p, "Photos Spent:", photos.spent.get());
    line(&mut out, p, "Photos Spent %:", format_percent(stats.photos_spent_pct()));

    out.push_str("-- Refusal Stats --\n");
    line(&mut out, p, "Refusals Earned:", refusals.earned.get());
    line(&mut out, p, "Refusals Spent:", refusals.spent().get());
    line(&mut out, p, "Refusals Spent %:", format_percent(stats.refusals_spent_pct()));
    line(&mut out, p, "Refusals Attempted:", refusals.attempted().get());
    line(&mut out, p, "Refusals Successful:", refusals.successfully.get());
    line(&mut out, p, "Refusals Unsuccessful:", refusals.unsuccessfully.get());
    line(
        &mut out,
        p,
        "Refusals Successful %:",
        format_percent(stats.refusals_successful_pct()),
    );

    out.push_str("-- Time Total Stats --\n");
    line(&mut out, p, "Assigned Caging Time Total:", format_minutes(time.total().get()));
    line(
        &mut out,
        p,
        "Assigned Caging Time Purchased:",
        format_minutes(time.assigned.purchased.get()),
    );
    line(
        &mut out,
        p,
        "Assigned Caging Time Purchased %:",
        format_percent(stats.time_purchased_pct()),
    );
    line(
        &mut out,
        p,
        "Assigned Caging Time Commanded:",
        format_minutes(time.assigned.commanded.get()),
    );
    line(
        &mut out,
        p,
        "Assigned Caging Time Commanded %:",
        format_percent(stats.time_commanded_pct()),
    );

    out.push_str("-- Time Failed Stats --\n");
    line(&mut out, p, "Failed Caging Time Total:", format_minutes(failed.total().get()));
    line(
        &mut out,
        p,
        "Failed Caging Time Total %:",
        format_percent(stats.time_failed_total_pct()),
    );
    line(
        &mut out,
        p,
        "Failed Caging Time Purchased:",
        format_minutes(failed.purchased.get()),
    );
    line(
        &mut out,
        p,
        "Failed Caging Time Purchased %:",
        format_percent(stats.time_failed_purchased_pct()),
    );
    line(
        &mut out,
        p,
        "Failed Caging Time Commanded:",
        format_minutes(failed.commanded.get()),
    );
    line(
        &mut out,
        p,
        "Failed Caging Time Commanded %:",
        format_percent(stats.time_failed_commanded_pct()),
    );

    out.push_str("-- Time Refused Stats --\n");
    line(
        &mut out,
        p,
        "Refused Caging Time Attempted:",
        format_minutes(refused.attempted().get()),
    );
    line(
        &mut out,
        p,
        "Refused Caging Time Attempted %:",
        format_percent(stats.time_refused_attempted_pct()),
    );
    line(
        &mut out,
        p,
        "Refused Caging Time Attempted Weight:",
        format_minutes(stats.refused_time_weight_attempted()),
    );
    out.push_str("   The average time one refusal is worth (all attempted refusals)\n");
    line(
        &mut out,
        p,
        "Refused Caging Time Successful:",
        format_minutes(refused.successfully.get()),
    );
    line(
        &mut out,
        p,
        "Refused Caging Time Successful %:",
        format_percent(stats.time_refused_successful_pct()),
    );
    line(
        &mut out,
        p,
        "Refused Caging Time Successful Weight:",
        format_minutes(stats.refused_time_weight_successful()),
    );
    out.push_str("   The average time one refusal is worth (successful refusals)\n");
    line(
        &mut out,
        p,
        "Refused Caging Time Unsuccessful:",
        format_minutes(refused.unsuccessfully.get()),
    );

    out.push_str("-- Turn and Cycle Stats --\n");
    line(&mut out, p, "Cycles Completed:", stats.cycles_completed().get());
    line(&mut out, p, "Turns Attempted:", turns.attempted().get());
    line(&mut out, p, "Turns Successful:", turns.successfully.get());
    line(&mut out, p, "Turns Failed:", turns.unsuccessfully.get());
    line(&mut out, p, "Turns Failed %:", format_percent(stats.turns_failed_pct()));
    line(&mut out, p, "Cycle Completion Turns %:", format_percent(stats.cycle_turn_pct()));
    out.push_str("   The relative difficulty acceleration of your profile\n");

    out.push_str("-- Time Failed or Refused Stats --\n");
    line(
        &mut out,
        p,
        "Turns Failed or Refused Attempted %:",
        format_percent(stats.turns_failed_or_refused_attempted_pct()),
    );
    line(
        &mut out,
        p,
        "Time Failed or Refused Attempted %:",
        format_percent(stats.time_failed_or_refused_attempted_pct()),
    );
    line(
        &mut out,
        p,
        "Turns Failed or Refused Successfully %:",
        format_percent(stats.turns_failed_or_refused_successfully_pct()),
    );
    line(
        &mut out,
        p,
        "Time Failed or Refused Successfully %:",
        format_percent(stats.time_failed_or_refused_successfully_pct()),
    );

    out.push_str("-- Difficulty Stats --\n");
    line(&mut out, p, "Current Difficulty:", cycle.level());
    line(&mut out, p, "Current Minimum Difficulty:", cycle.nums_min(None));
    line(&mut out, p, "Average Time Difficulty:", format_minutes(average));
    line(
        &mut out,
        p,
        "Current Portion of Max Difficulty %:",
        format_percent(cycle.max_difficulty_fraction()),
    );
    line(
        &mut out,
        p,
        "Refusal Weight Attempted to Average Time Difficulty %:",
        format_percent(weight_ratio(stats.refused_time_weight_attempted())),
    );
    line(
        &mut out,
        p,
        "Refusal Weight Successful to Average Time Difficulty %:",
        format_percent(weight_ratio(stats.refused_time_weight_successful())),
    );
    out.push_str("   How your refusal weight compares to the average time difficulty (100% is even)\n");
    if cycle.is_max_difficulty() {
        line(
            &mut out,
            p,
            "Max Difficulty Time Successfully Completed:",
            format_minutes(time.max_difficulty_successful.get()),
        );
    }
    out
}

fn describe_started(started: &CagingStarted) -> String {
    let mut out = String::new();
    if let Some(cost) = started.cost {
        let _ = writeln!(out, "You spent {cost} tokens to be caged.");
    }
    let _ = writeln!(
        out,
        "Caged at {} for {}, until about {}.",
        started.started.format(TIME_FORMAT),
        format_minutes(started.period),
        started.ends_at().format(TIME_FORMAT)
    );
    out
}

fn describe_rewards(rewards: &Rewards) -> String {
    let mut out = String::new();
    if rewards.cycle_completed {
        let _ = writeln!(
            out,
            "Cycle complete! You earned {} refusal{}.",
            rewards.refusals,
            if rewards.refusals == 1 { "" } else { "s" }
        );
    }
    if rewards.tokens > 0 {
        let _ = writeln!(out, "You earned {} tokens.", rewards.tokens);
    }
    if rewards.photo {
        out.push_str("You earned a photo.\n");
    }
    if let Some(bonus) = rewards.announced_coin_bonus() {
        let _ = writeln!(out, "Your coin bonus rose by {bonus}%.");
    }
    if rewards.prestige {
        out.push_str("You gained a prestige point.\n");
    }
    if let Some(level) = rewards.next_level {
        let _ = writeln!(out, "The next cycle has {level} portions.");
    }
    out
}

fn describe_loss(penalty: i64, loss: Loss) -> String {
    match loss {
        Loss::Tokens(amount) => format!("You failed and lost {amount} tokens.\n"),
        Loss::AllTokens(amount) => format!(
            "You failed and owed {penalty} tokens, so you lost all {amount} of your tokens.\n"
        ),
        Loss::Refusals(amount) => {
            format!("You failed with no tokens left and lost {amount} refusals.\n")
        }
        Loss::AllPhotos(amount) => format!(
            "You failed with no tokens or spare refusals and lost all {amount} photos.\n"
        ),
    }
}

fn describe_purchase(purchase: &Purchase) -> String {
    match purchase.resource {
        Resource::Photos => format!(
            "You redeemed a photo ({} remaining).\n",
            purchase.remaining
        ),
        Resource::Tokens | Resource::Refusals => format!(
            "You spent {} {} on a bathroom break ({} remaining).\n",
            purchase.cost, purchase.resource, purchase.remaining
        ),
    }
}

/// Player-facing summary of one action.
pub fn describe_report(report: &ActionReport) -> String {
    match report {
        ActionReport::Caged(started) => describe_started(started),
        ActionReport::Uncaged(UncageOutcome::Completed(rewards)) => {
            format!("Well done, the caging is complete.\n{}", describe_rewards(rewards))
        }
        ActionReport::Uncaged(UncageOutcome::Penalized { penalty, loss }) => {
            describe_loss(*penalty, *loss)
        }
        ActionReport::Uncaged(UncageOutcome::Eliminated { name }) => format!(
            "You failed with nothing left to lose. {name}'s profile has been erased.\n"
        ),
        ActionReport::Refusal(RefusalOutcome::Refused(rewards)) => {
            format!("Your refusal was accepted.\n{}", describe_rewards(rewards))
        }
        ActionReport::Refusal(RefusalOutcome::StillCaged) => {
            "Your refusal was rejected. You remain caged.\n".to_string()
        }
        ActionReport::Purchased(purchase) => describe_purchase(purchase),
    }
}
