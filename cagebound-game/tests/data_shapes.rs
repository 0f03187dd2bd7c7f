use cagebound_game::{
    Action, CycleConfig, DifficultyCycle, GameRng, Minutes, Profile, ProfileSeed, ScriptedRandom,
    UncageOutcome,
};
use chrono::NaiveDate;
use serde_json::json;

fn played_profile() -> Profile {
    let cycle = DifficultyCycle::from_parts(5, [2, 4], 0).unwrap();
    let mut profile = Profile::new("saved", ProfileSeed::default(), cycle).unwrap();
    let mut rng = ScriptedRandom::new([1], [0.0]);
    let now = NaiveDate::from_ymd_opt(2024, 5, 4)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap();
    profile.command_caging(&mut rng, now).unwrap();
    let outcome = profile.uncage(true, true, &mut rng).unwrap();
    assert!(matches!(outcome, UncageOutcome::Completed(_)));
    profile.command_caging(&mut rng, now).unwrap();
    profile
}

#[test]
fn played_profile_survives_a_json_round_trip() {
    let profile = played_profile();
    let text = serde_json::to_string_pretty(&profile).unwrap();
    let back: Profile = serde_json::from_str(&text).unwrap();
    assert_eq!(back, profile);
    assert!(back.is_caged());
    assert_eq!(back.caging_period(), Minutes::new(60));
    assert_eq!(back.cycle().completed(), 1);
}

#[test]
fn saved_layout_uses_stable_keys() {
    let value = serde_json::to_value(played_profile()).unwrap();
    assert_eq!(value["name"], "Saved");
    assert_eq!(value["tokens"], 6.0);
    assert_eq!(value["photos"], 1.0);
    assert_eq!(value["bonus"], 2.5);
    assert_eq!(value["started"], "2024-05-04T18:00:00");
    assert_eq!(value["period"], 60);
    assert_eq!(value["cycle"]["price_modifier"], 5);
    assert_eq!(value["cycle"]["portions"], json!([2, 4]));
    assert_eq!(value["cycle"]["completed_index"], 1.0);
    assert_eq!(value["cycle"]["config"]["max_difficulty"], 16);
    assert_eq!(value["stats"]["tokens"]["earned"], 6);
    assert_eq!(value["stats"]["time"]["commanded"], 30);
    assert_eq!(value["stats"]["turns"]["successfully"], 1);
}

#[test]
fn missing_fields_fall_back_to_defaults() {
    let profile: Profile = serde_json::from_value(json!({
        "name": "Legacy",
        "tokens": 40.0,
        "cycle": { "price_modifier": 12, "portions": [1, 3, 2] }
    }))
    .unwrap();
    assert_eq!(profile.tokens(), 40);
    assert_eq!(profile.photos(), 0);
    assert!(!profile.is_caged());
    assert_eq!(profile.cycle().level(), 3);
    assert_eq!(profile.cycle().completed(), 0);
    assert_eq!(profile.cycle().config(), &CycleConfig::default());
    assert_eq!(profile.stats().turns().attempted().get(), 0);
    assert_eq!(
        profile.available_actions(),
        vec![Action::CommandCaging, Action::BuyCaging, Action::RedeemPhoto]
    );
}

#[test]
fn custom_cycle_config_survives_a_json_round_trip() {
    let config = CycleConfig {
        max_difficulty: 4,
        price_range: (50, 60),
        ..CycleConfig::default()
    };
    let mut rng = GameRng::from_user_seed(31);
    let profile = Profile::with_config("keeper", ProfileSeed::default(), config, &mut rng).unwrap();
    let cost = profile.average_caging_cost();

    let text = serde_json::to_string(&profile).unwrap();
    let back: Profile = serde_json::from_str(&text).unwrap();
    assert_eq!(back, profile);
    assert_eq!(back.cycle().config(), &config);
    assert_eq!(back.average_caging_cost(), cost);

    // regeneration keeps honouring the stored cap
    let mut cycle = back.cycle().clone();
    for _ in 0..200 {
        cycle = cycle.next_cycle(&mut rng).unwrap();
        assert!(cycle.level() <= 4);
    }
}

#[test]
fn invalid_stored_config_is_rejected_on_load() {
    let degenerate = json!({
        "name": "Broken",
        "cycle": {
            "price_modifier": 5,
            "portions": [1, 2],
            "config": { "portion_range": [3, 3] }
        }
    });
    assert!(serde_json::from_value::<Profile>(degenerate).is_err());
}

#[test]
fn inconsistent_cycles_are_rejected_on_load() {
    let past_end = json!({
        "name": "Broken",
        "cycle": { "price_modifier": 5, "portions": [1, 2], "completed_index": 3.0 }
    });
    assert!(serde_json::from_value::<Profile>(past_end).is_err());

    let empty = json!({
        "name": "Broken",
        "cycle": { "price_modifier": 5, "portions": [] }
    });
    assert!(serde_json::from_value::<Profile>(empty).is_err());
}

#[test]
fn cycle_config_fills_missing_ranges() {
    let config: CycleConfig = serde_json::from_value(json!({ "max_difficulty": 8 })).unwrap();
    assert_eq!(config.max_difficulty, 8);
    assert_eq!(config, CycleConfig {
        max_difficulty: 8,
        ..CycleConfig::default()
    });
    assert!(config.validate().is_ok());

    let bad: CycleConfig = serde_json::from_value(json!({ "portion_range": [3, 3] })).unwrap();
    assert!(bad.validate().is_err());
}
