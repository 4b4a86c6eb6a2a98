//! Integration tests for headless encounter execution
//!
//! These verify that:
//! - Scripted encounters run to completion without a window
//! - Outcomes are accessible programmatically
//! - Seeded loot rolls are deterministic
//! - The turn cap aborts scripts that can never win

use thornvale::headless::{run_headless_encounter, HeadlessEncounterConfig};

fn scenario(json: &str) -> HeadlessEncounterConfig {
    serde_json::from_str(json).expect("test scenario must parse")
}

#[test]
fn test_attack_script_wins_in_three_turns() {
    let config = scenario(
        r#"{
            "player": { "health": 500, "attack_power": 30 },
            "foe": {
                "name": "Thicket Boar",
                "health": 50,
                "attack_power": 20,
                "exp_reward": 35,
                "loot": "Tough Hide",
                "drop_chance": 1.0
            },
            "script": ["Attack"],
            "random_seed": 7
        }"#,
    );

    let outcome = run_headless_encounter(config).expect("encounter must complete");

    assert!(outcome.victory);
    assert!(!outcome.timed_out);
    // Player attack, foe attack, player attack
    assert_eq!(outcome.turns, 3);
    assert_eq!(outcome.foe_health, 0.0);
    assert_eq!(outcome.player_health, 480.0);
    assert_eq!(outcome.player_exp_to_next, 65);
    assert_eq!(outcome.loot.as_deref(), Some("Tough Hide"));
    assert_eq!(outcome.random_seed, Some(7));
}

#[test]
fn test_overwhelmed_player_loses() {
    let config = scenario(
        r#"{
            "player": { "health": 1 },
            "foe": { "health": 1000, "attack_power": 20 },
            "script": ["Defend"]
        }"#,
    );

    let outcome = run_headless_encounter(config).expect("encounter must complete");

    assert!(!outcome.victory);
    assert!(!outcome.timed_out);
    assert_eq!(outcome.player_health, 0.0);
}

#[test]
fn test_turn_cap_aborts_a_stalling_script() {
    // Defending forever can never win; the cap must fire
    let config = scenario(
        r#"{
            "player": { "health": 100000 },
            "foe": { "health": 1000, "attack_power": 20 },
            "script": ["Defend"],
            "max_turns": 10
        }"#,
    );

    let outcome = run_headless_encounter(config).expect("encounter must complete");

    assert!(outcome.timed_out);
    assert!(!outcome.victory);
    assert!(outcome.turns >= 10);
    assert_eq!(outcome.foe_health, 1000.0);
}

#[test]
fn test_seeded_loot_rolls_are_deterministic() {
    let json = r#"{
        "player": { "health": 500 },
        "foe": {
            "health": 50,
            "loot": "Pale Ember",
            "drop_chance": 0.5
        },
        "script": ["Attack"],
        "random_seed": 1234
    }"#;

    let first = run_headless_encounter(scenario(json)).expect("encounter must complete");
    let second = run_headless_encounter(scenario(json)).expect("encounter must complete");

    assert!(first.victory && second.victory);
    assert_eq!(first.loot, second.loot);
    assert_eq!(first.turns, second.turns);
}
