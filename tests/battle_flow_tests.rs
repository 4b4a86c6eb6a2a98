//! End-to-end encounter tests
//!
//! These drive the full stack - overworld entry, the turn loop, terminal
//! detection, and the handoff back to the world - on a windowless App
//! with instant pacing, one scheduler tick per `app.update()`.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use thornvale::battle::combatant::{Combatant, Side};
use thornvale::battle::events::PlayerCommand;
use thornvale::battle::log::{BattleLog, BattleLogEventType};
use thornvale::battle::items::Inventory;
use thornvale::battle::strategy::{FoeBrain, ScriptedFoe};
use thornvale::battle::{BattlePacing, BattlePlugin, CommandGate, GameRng};
use thornvale::handoff::{EncounterHandoff, HandoffPlugin};
use thornvale::world::{FoeRecord, LootPickup, PlayerRecord, WorldPlugin, WorldRecord};
use thornvale::{BattlePhase, BattleState, GameState};

fn test_record(player_health: f32, foe_health: f32, foe_adjacent: bool) -> WorldRecord {
    WorldRecord {
        player: PlayerRecord {
            name: "Rowan".to_string(),
            health: player_health,
            max_health: 500.0,
            focus: 30.0,
            max_focus: 30.0,
            attack_power: 30.0,
            level: 1,
            exp_to_next: 100,
            portrait: String::new(),
            position: Vec2::ZERO,
        },
        foes: vec![FoeRecord {
            name: "Thicket Boar".to_string(),
            max_health: foe_health,
            attack_power: 20.0,
            level: 1,
            portrait: String::new(),
            exp_reward: 35,
            loot: Some("Tough Hide".to_string()),
            drop_chance: 1.0,
            position: if foe_adjacent {
                Vec2::new(10.0, 0.0)
            } else {
                Vec2::new(1000.0, 0.0)
            },
            defeated: false,
        }],
    }
}

fn test_app(record: WorldRecord) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(StatesPlugin)
        .add_plugins(TransformPlugin)
        .add_plugins((WorldPlugin, HandoffPlugin, BattlePlugin))
        .insert_resource(record)
        .insert_resource(BattlePacing::instant())
        .insert_resource(FoeBrain(Box::new(ScriptedFoe { think_time: 0.0 })))
        .insert_resource(GameRng::from_seed(7))
        .init_state::<GameState>();
    app
}

fn run_until(app: &mut App, max_frames: usize, pred: impl Fn(&mut App) -> bool) -> bool {
    for _ in 0..max_frames {
        app.update();
        if pred(app) {
            return true;
        }
    }
    false
}

fn phase(app: &App) -> BattlePhase {
    app.world().resource::<BattleState>().phase()
}

fn game_state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

fn combatant_health(app: &mut App, side: Side) -> Option<f32> {
    app.world_mut()
        .query::<&Combatant>()
        .iter(app.world())
        .find(|c| c.side == side)
        .map(|c| c.current_health)
}

fn wait_for_player_turn(app: &mut App) -> bool {
    run_until(app, 50, |app| phase(app) == BattlePhase::PlayerTurn)
}

#[test]
fn adjacency_starts_a_battle_and_opening_hands_over_the_first_turn() {
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));
    assert_eq!(game_state(&app), GameState::Battle);
    assert_eq!(combatant_health(&mut app, Side::Player), Some(500.0));
    assert_eq!(combatant_health(&mut app, Side::Foe), Some(50.0));
}

#[test]
fn two_attacks_defeat_the_boar() {
    // Scenario: 500/500 player, 50/50 foe, fixed 30 attack damage
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    app.world_mut().send_event(PlayerCommand::Attack);
    assert!(run_until(&mut app, 50, |app| {
        combatant_health(app, Side::Foe) == Some(20.0)
    }));

    // Foe turn runs, then it's ours again
    assert!(wait_for_player_turn(&mut app));
    assert_eq!(combatant_health(&mut app, Side::Player), Some(480.0));

    app.world_mut().send_event(PlayerCommand::Attack);
    assert!(run_until(&mut app, 50, |app| phase(app).is_terminal()));
    assert_eq!(phase(&app), BattlePhase::Victory);
    assert_eq!(combatant_health(&mut app, Side::Foe), Some(0.0));
}

#[test]
fn victory_pays_out_and_retires_the_foe() {
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    app.world_mut().send_event(PlayerCommand::Attack);
    assert!(wait_for_player_turn(&mut app));
    app.world_mut().send_event(PlayerCommand::Attack);

    // Closing sequence runs, then the world context is restored
    assert!(run_until(&mut app, 100, |app| {
        game_state(app) == GameState::Overworld
            && !app.world().resource::<EncounterHandoff>().is_active()
    }));

    let record = app.world().resource::<WorldRecord>();
    assert!(record.foes[0].defeated);
    assert_eq!(record.player.health, 480.0);
    // 100 exp to next, minus the boar's 35
    assert_eq!(record.player.exp_to_next, 65);

    // drop_chance 1.0: the loot pickup is guaranteed
    let loot: Vec<&LootPickup> = app
        .world_mut()
        .query::<&LootPickup>()
        .iter(app.world())
        .collect();
    assert_eq!(loot.len(), 1);
    assert_eq!(loot[0].item, "Tough Hide");
}

#[test]
fn one_hit_at_low_health_is_a_defeat() {
    // Scenario: player at 1/500 takes the foe's fixed 20 damage
    let mut app = test_app(test_record(1.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    app.world_mut().send_event(PlayerCommand::Defend);
    assert!(run_until(&mut app, 50, |app| phase(app).is_terminal()));
    assert_eq!(phase(&app), BattlePhase::Defeat);
    // Floored at zero, since 1 - 20 < 0
    assert_eq!(combatant_health(&mut app, Side::Player), Some(0.0));

    assert!(run_until(&mut app, 100, |app| {
        game_state(app) == GameState::Overworld
    }));
    let record = app.world().resource::<WorldRecord>();
    assert_eq!(record.player.health, 0.0);
    assert!(!record.foes[0].defeated);
}

#[test]
fn duplicate_clicks_land_exactly_one_hit() {
    // Scenario: two rapid attack presses while the first is mid-flight
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    app.world_mut().send_event(PlayerCommand::Attack);
    app.world_mut().send_event(PlayerCommand::Attack);

    assert!(run_until(&mut app, 50, |app| {
        phase(app) == BattlePhase::FoeTurn
    }));
    assert_eq!(combatant_health(&mut app, Side::Foe), Some(20.0));

    let log = app.world().resource::<BattleLog>();
    let player_hits = log
        .filter_by_type(BattleLogEventType::Damage)
        .iter()
        .filter(|e| e.message.starts_with("Rowan"))
        .count();
    assert_eq!(player_hits, 1);
}

#[test]
fn healing_item_restores_without_hurting_the_foe() {
    let mut app = test_app(test_record(400.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    // Slot 0 is the Meadow Tonic (+50)
    app.world_mut().send_event(PlayerCommand::UseItem(0));
    assert!(run_until(&mut app, 50, |app| {
        combatant_health(app, Side::Player) == Some(450.0)
    }));
    // No damage to the foe from a healing item
    assert_eq!(combatant_health(&mut app, Side::Foe), Some(50.0));

    // The item is consumed: the turn comes back around and the slot is empty
    assert!(wait_for_player_turn(&mut app));
    app.world_mut().send_event(PlayerCommand::UseItem(0));
    assert!(run_until(&mut app, 50, |app| {
        phase(app) == BattlePhase::FoeTurn
    }));
    // Empty slot degrades to a pass: nobody took damage from it
    assert_eq!(combatant_health(&mut app, Side::Foe), Some(50.0));
}

#[test]
fn damaging_item_hurts_the_foe_and_is_consumed() {
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    // Slot 1 is the Thorn Flask (25 damage)
    app.world_mut().send_event(PlayerCommand::UseItem(1));
    assert!(run_until(&mut app, 50, |app| {
        combatant_health(app, Side::Foe) == Some(25.0)
    }));
    // The player is untouched and the flask is spent
    assert_eq!(combatant_health(&mut app, Side::Player), Some(500.0));
    assert!(app.world().resource::<Inventory>().get(1).is_none());

    let log = app.world().resource::<BattleLog>();
    assert_eq!(log.filter_by_type(BattleLogEventType::ItemUsed).len(), 1);
}

#[test]
fn commands_through_a_closed_gate_are_dropped() {
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    app.world_mut().resource_mut::<CommandGate>().accepting = false;
    app.world_mut().send_event(PlayerCommand::Attack);
    for _ in 0..5 {
        app.update();
    }
    // Nothing happened: no hit, the turn did not pass
    assert_eq!(phase(&app), BattlePhase::PlayerTurn);
    assert_eq!(combatant_health(&mut app, Side::Foe), Some(50.0));

    app.world_mut().resource_mut::<CommandGate>().accepting = true;
    app.world_mut().send_event(PlayerCommand::Attack);
    assert!(run_until(&mut app, 50, |app| {
        combatant_health(app, Side::Foe) == Some(20.0)
    }));
}

#[test]
fn experience_reward_reaches_the_live_player_during_the_closing() {
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));
    app.world_mut().send_event(PlayerCommand::Attack);
    assert!(wait_for_player_turn(&mut app));
    app.world_mut().send_event(PlayerCommand::Attack);

    // The reward lands on the snapshot and is mirrored back onto the
    // battle entity, so the HUD can show it before the context exits
    let player_exp = |app: &mut App| {
        app.world_mut()
            .query::<&Combatant>()
            .iter(app.world())
            .find(|c| c.side == Side::Player)
            .map(|c| c.exp_to_next)
    };
    assert!(run_until(&mut app, 100, |app| player_exp(app) == Some(65)));
    // The battle entity still exists, so this happened pre-exit
    assert_eq!(game_state(&app), GameState::Battle);
}

#[test]
fn special_attack_spends_focus_for_double_damage() {
    let mut app = test_app(test_record(500.0, 80.0, true));
    assert!(wait_for_player_turn(&mut app));

    app.world_mut().send_event(PlayerCommand::Special);
    assert!(run_until(&mut app, 50, |app| {
        combatant_health(app, Side::Foe) == Some(20.0)
    }));
    let focus = app
        .world_mut()
        .query::<&Combatant>()
        .iter(app.world())
        .find(|c| c.side == Side::Player)
        .map(|c| c.current_focus);
    assert_eq!(focus, Some(20.0));
}

#[test]
fn attack_only_script_always_terminates() {
    let mut app = test_app(test_record(500.0, 50.0, true));
    assert!(wait_for_player_turn(&mut app));

    // Strictly decreasing foe health against finite max health: the
    // loop must end in bounded frames
    for _ in 0..500 {
        if phase(&app) == BattlePhase::PlayerTurn {
            app.world_mut().send_event(PlayerCommand::Attack);
        }
        app.update();
        if game_state(&app) == GameState::Overworld
            && !app.world().resource::<EncounterHandoff>().is_active()
        {
            break;
        }
    }
    assert_eq!(game_state(&app), GameState::Overworld);
    assert!(app.world().resource::<WorldRecord>().foes[0].defeated);
}

#[test]
fn entering_battle_with_an_empty_store_fails_closed() {
    // Foe far away: nothing stores a snapshot
    let mut app = test_app(test_record(500.0, 50.0, false));
    app.update();
    assert_eq!(game_state(&app), GameState::Overworld);

    // Force the context switch with no snapshot pair stored
    app.world_mut()
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Battle);
    assert!(run_until(&mut app, 10, |app| {
        game_state(app) == GameState::Overworld
    }));

    // No battle ran, nothing was mutated
    assert_eq!(phase(&app), BattlePhase::Idle);
    assert!(!app.world().resource::<EncounterHandoff>().is_active());
    let record = app.world().resource::<WorldRecord>();
    assert_eq!(record.player.health, 500.0);
    assert!(!record.foes[0].defeated);
}
