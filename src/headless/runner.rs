//! Headless encounter execution
//!
//! Builds a windowless App with the same world/handoff/battle plugins as
//! the graphical game, parks the player next to the foe so the real entry
//! path triggers, and feeds the scripted commands through the same
//! `PlayerCommand` events the HUD buttons would send. Pacing is zeroed so
//! every suspension point resolves on its first scheduler tick.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::battle::events::PlayerCommand;
use crate::battle::log::BattleLog;
use crate::battle::state::{BattlePhase, BattleState};
use crate::battle::strategy::{FoeBrain, ScriptedFoe};
use crate::battle::turns::ActionRunner;
use crate::battle::{BattlePacing, BattlePlugin, CommandGate, GameRng};
use crate::battle::combatant::{Combatant, Side};
use crate::handoff::transition::cleanup_battle;
use crate::handoff::{EncounterHandoff, HandoffPlugin};
use crate::states::GameState;
use crate::world::WorldPlugin;

use super::config::HeadlessEncounterConfig;

/// Result of a completed headless encounter
#[derive(Debug, Clone)]
pub struct EncounterOutcome {
    /// Whether the player won
    pub victory: bool,
    /// True when the turn cap aborted the encounter
    pub timed_out: bool,
    /// Completed turns (both sides counted)
    pub turns: u32,
    /// Player health at the end
    pub player_health: f32,
    /// Player focus at the end
    pub player_focus: f32,
    /// Experience still needed after the reward
    pub player_exp_to_next: u32,
    /// Foe health at the end
    pub foe_health: f32,
    /// Loot that dropped, if the roll succeeded
    pub loot: Option<String>,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// Resource tracking headless completion
#[derive(Resource)]
pub struct HeadlessState {
    pub max_turns: u32,
    pub random_seed: Option<u64>,
    pub complete: bool,
    pub outcome: Option<EncounterOutcome>,
}

/// The scripted stand-in for the player: one command per player turn,
/// cycling through the scenario's list.
#[derive(Resource)]
struct ScriptedDriver {
    commands: Vec<PlayerCommand>,
    cursor: usize,
    last_sent_turn: Option<u32>,
}

/// Plugin for headless encounter execution
pub struct HeadlessPlugin {
    pub config: HeadlessEncounterConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => GameRng::from_entropy(),
        };

        app.insert_resource(self.config.to_world_record())
            .insert_resource(BattlePacing::instant())
            .insert_resource(rng)
            // Zero think time so foe turns also resolve in two ticks
            .insert_resource(FoeBrain(Box::new(ScriptedFoe { think_time: 0.0 })))
            .insert_resource(ScriptedDriver {
                commands: self.config.commands(),
                cursor: 0,
                last_sent_turn: None,
            })
            .insert_resource(HeadlessState {
                max_turns: self.config.max_turns,
                random_seed: self.config.random_seed,
                complete: false,
                outcome: None,
            })
            .add_systems(
                Update,
                (drive_script, enforce_turn_cap).run_if(in_state(GameState::Battle)),
            )
            .add_systems(
                OnExit(GameState::Battle),
                capture_outcome.before(cleanup_battle),
            );
    }
}

/// Feed the next scripted command whenever a new player turn opens.
fn drive_script(
    battle_state: Res<BattleState>,
    gate: Res<CommandGate>,
    runner: Res<ActionRunner>,
    battle_log: Res<BattleLog>,
    mut driver: ResMut<ScriptedDriver>,
    mut commands: EventWriter<PlayerCommand>,
) {
    if battle_state.phase() != BattlePhase::PlayerTurn || !gate.accepting || runner.is_busy() {
        return;
    }
    if driver.commands.is_empty() || driver.last_sent_turn == Some(battle_log.turn) {
        return;
    }
    let command = driver.commands[driver.cursor % driver.commands.len()];
    driver.cursor += 1;
    driver.last_sent_turn = Some(battle_log.turn);
    commands.send(command);
}

/// Abort runaway scripts once the turn cap is hit.
fn enforce_turn_cap(
    battle_state: Res<BattleState>,
    battle_log: Res<BattleLog>,
    handoff: Res<EncounterHandoff>,
    combatants: Query<&Combatant>,
    mut state: ResMut<HeadlessState>,
) {
    if state.complete
        || battle_state.phase().is_terminal()
        || battle_log.turn < state.max_turns
    {
        return;
    }
    warn!(
        "Encounter hit the {}-turn cap, aborting",
        state.max_turns
    );
    let outcome = build_outcome(&battle_state, &battle_log, &handoff, &combatants, &state, true);
    state.outcome = Some(outcome);
    state.complete = true;
}

/// Record the outcome while the battle entities and phase still exist.
fn capture_outcome(
    battle_state: Res<BattleState>,
    battle_log: Res<BattleLog>,
    handoff: Res<EncounterHandoff>,
    combatants: Query<&Combatant>,
    mut state: ResMut<HeadlessState>,
) {
    if state.complete {
        return;
    }
    let outcome = build_outcome(&battle_state, &battle_log, &handoff, &combatants, &state, false);
    state.outcome = Some(outcome);
    state.complete = true;
}

fn build_outcome(
    battle_state: &BattleState,
    battle_log: &BattleLog,
    handoff: &EncounterHandoff,
    combatants: &Query<&Combatant>,
    state: &HeadlessState,
    timed_out: bool,
) -> EncounterOutcome {
    let snapshot = handoff.player();
    let foe_health = combatants
        .iter()
        .find(|c| c.side == Side::Foe)
        .map(|c| c.current_health)
        .unwrap_or(0.0);

    EncounterOutcome {
        victory: battle_state.phase() == BattlePhase::Victory,
        timed_out,
        turns: battle_log.turn,
        player_health: snapshot.map(|s| s.health).unwrap_or(0.0),
        player_focus: snapshot.map(|s| s.focus).unwrap_or(0.0),
        player_exp_to_next: snapshot.map(|s| s.exp_to_next).unwrap_or(0),
        foe_health,
        loot: handoff.pending_loot().map(|l| l.item.clone()),
        random_seed: state.random_seed,
    }
}

/// Assemble the windowless app. Shared by the CLI entry point and the
/// integration tests.
pub fn build_headless_app(config: HeadlessEncounterConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(StatesPlugin)
        .add_plugins(TransformPlugin)
        .add_plugins((WorldPlugin, HandoffPlugin, BattlePlugin))
        .add_plugins(HeadlessPlugin { config })
        .init_state::<GameState>();
    app
}

/// Run a scripted encounter to completion and report the outcome.
pub fn run_headless_encounter(
    config: HeadlessEncounterConfig,
) -> Result<EncounterOutcome, String> {
    config.validate()?;

    println!("Starting headless encounter...");
    println!("  Player: {} ({} hp)", config.player.name, config.player.health);
    println!("  Foe: {} ({} hp)", config.foe.name, config.foe.health);
    println!("  Script: {:?}", config.script);
    println!("  Max turns: {}", config.max_turns);

    let max_turns = config.max_turns;
    let mut app = build_headless_app(config);

    // Every turn resolves in a bounded number of ticks with instant
    // pacing; the frame cap only guards against wiring mistakes
    let frame_cap = 100 + 40 * max_turns as usize;
    for _ in 0..frame_cap {
        app.update();
        if app.world().resource::<HeadlessState>().complete {
            break;
        }
    }

    for entry in &app.world().resource::<BattleLog>().entries {
        println!("  [{}] {}", entry.turn, entry.message);
    }

    let outcome = app
        .world_mut()
        .resource_mut::<HeadlessState>()
        .outcome
        .take()
        .ok_or_else(|| "encounter did not complete within the frame cap".to_string())?;

    if outcome.timed_out {
        println!("Encounter aborted after {} turns", outcome.turns);
    } else if outcome.victory {
        println!(
            "Victory in {} turns ({:.0} hp remaining)",
            outcome.turns, outcome.player_health
        );
    } else {
        println!("Defeat after {} turns", outcome.turns);
    }
    if let Some(loot) = &outcome.loot {
        println!("Loot: {}", loot);
    }

    Ok(outcome)
}
