//! Flow controller
//!
//! Drives the whole encounter: the opening pacing before the first turn,
//! the terminal-condition checks while the turn loop runs, and the closing
//! sequence (outcome line, rewards, context switch back to the overworld).
//!
//! Terminal detection is deliberately doubled: a poll check every frame
//! and a death-event watcher. Both funnel into the idempotent
//! `BattleState::finish`, so whichever fires first wins and the other is
//! absorbed without double side effects.

use bevy::prelude::*;

use super::combatant::{Combatant, Side};
use super::events::{CombatantDied, HealthChanged, ResourceChanged, SnapshotChanged};
use super::log::{BattleLog, BattleLogEventType};
use super::state::{BattlePhase, BattleState, PhaseEvent};
use super::{BattlePacing, CommandGate, GameRng};
use crate::handoff::{EncounterHandoff, LootDrop, SnapshotField};
use crate::states::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClosingStage {
    /// Pause before the outcome line
    OutcomePause,
    /// Pause before the reward is applied (victory only), so the defeat
    /// line displays first
    RewardPause,
    /// Pause before leaving the battle context
    ExitPause,
}

#[derive(Debug)]
struct ClosingSequence {
    stage: ClosingStage,
    wait: f32,
}

/// Countdown state for the opening and closing sequences.
#[derive(Resource, Debug, Default)]
pub struct FlowTimers {
    opening: Option<f32>,
    closing: Option<ClosingSequence>,
}

impl FlowTimers {
    /// Arm the opening countdown for a fresh battle.
    pub fn start_opening(&mut self, wait: f32) {
        self.opening = Some(wait);
        self.closing = None;
    }

    pub fn reset(&mut self) {
        self.opening = None;
        self.closing = None;
    }
}

/// Tick the opening pause, then hand the first turn to the player.
pub fn run_opening(
    time: Res<Time>,
    mut battle_state: ResMut<BattleState>,
    mut timers: ResMut<FlowTimers>,
    mut gate: ResMut<CommandGate>,
) {
    if battle_state.phase() != BattlePhase::Opening {
        return;
    }
    let Some(wait) = timers.opening.as_mut() else {
        return;
    };
    *wait -= time.delta_secs();
    if *wait > 0.0 {
        return;
    }
    timers.opening = None;

    match battle_state.advance(PhaseEvent::OpeningDone) {
        Ok(_) => gate.accepting = true,
        Err(e) => warn!("opening could not hand over the first turn: {}", e),
    }
}

/// Mirror player-side change events into the handoff snapshot, so the
/// store always holds the player's latest stats. Fires `SnapshotChanged`
/// for fields that actually moved.
pub fn sync_snapshot(
    mut health_events: EventReader<HealthChanged>,
    mut resource_events: EventReader<ResourceChanged>,
    mut handoff: ResMut<EncounterHandoff>,
    mut snapshot_events: EventWriter<SnapshotChanged>,
) {
    for event in health_events.read() {
        if event.side != Side::Player {
            continue;
        }
        for (field, value) in handoff.update_player(Some(event.current), None, None) {
            snapshot_events.send(SnapshotChanged { field, value });
        }
    }
    for event in resource_events.read() {
        if event.side != Side::Player {
            continue;
        }
        for (field, value) in handoff.update_player(None, Some(event.current), None) {
            snapshot_events.send(SnapshotChanged { field, value });
        }
    }
}

/// Mirror snapshot change notifications back onto the live player
/// entity. Values that originate outside the combat loop (the deferred
/// experience reward lands on the snapshot first) would otherwise never
/// reach the combatant the HUD renders.
pub fn apply_snapshot_changes(
    mut snapshot_events: EventReader<SnapshotChanged>,
    mut combatants: Query<&mut Combatant>,
) {
    for event in snapshot_events.read() {
        let Some(mut player) = combatants.iter_mut().find(|c| c.side == Side::Player) else {
            continue;
        };
        match event.field {
            SnapshotField::Health => player.current_health = event.value,
            SnapshotField::Focus => player.current_focus = event.value,
            SnapshotField::Experience => player.exp_to_next = event.value as u32,
        }
    }
}

/// Event-driven terminal detection: a death notification latches the
/// outcome immediately, even mid-turn.
pub fn watch_deaths(
    mut death_events: EventReader<CombatantDied>,
    mut battle_state: ResMut<BattleState>,
    mut gate: ResMut<CommandGate>,
) {
    for event in death_events.read() {
        let outcome = match event.side {
            Side::Player => BattlePhase::Defeat,
            Side::Foe => BattlePhase::Victory,
        };
        if battle_state.finish(outcome) {
            gate.accepting = false;
        }
    }
}

/// Poll-based terminal detection, checked after every frame's turn
/// processing as a backstop for the event path.
pub fn poll_terminal(
    mut battle_state: ResMut<BattleState>,
    mut gate: ResMut<CommandGate>,
    combatants: Query<&Combatant>,
) {
    if battle_state.phase() == BattlePhase::Idle || battle_state.phase().is_terminal() {
        return;
    }

    let player = combatants.iter().find(|c| c.side == Side::Player);
    let foe = combatants.iter().find(|c| c.side == Side::Foe);

    let outcome = if player.is_some_and(|p| p.current_health <= 0.0 || p.is_dead()) {
        Some(BattlePhase::Defeat)
    } else if foe.is_some_and(|f| f.current_health <= 0.0 || f.is_dead()) {
        Some(BattlePhase::Victory)
    } else {
        None
    };

    if let Some(outcome) = outcome {
        if battle_state.finish(outcome) {
            gate.accepting = false;
        }
    }
}

/// Run the end-of-battle sequence once a terminal phase is latched:
/// pause, outcome line, rewards on a victory, pause, context switch.
pub fn run_closing(
    time: Res<Time>,
    battle_state: Res<BattleState>,
    mut timers: ResMut<FlowTimers>,
    pacing: Res<BattlePacing>,
    mut battle_log: ResMut<BattleLog>,
    mut handoff: ResMut<EncounterHandoff>,
    mut rng: ResMut<GameRng>,
    mut snapshot_events: EventWriter<SnapshotChanged>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let outcome = battle_state.phase();
    if !outcome.is_terminal() {
        return;
    }

    let closing = timers.closing.get_or_insert(ClosingSequence {
        stage: ClosingStage::OutcomePause,
        wait: pacing.closing,
    });

    closing.wait -= time.delta_secs();
    if closing.wait > 0.0 {
        return;
    }

    match closing.stage {
        ClosingStage::OutcomePause => {
            let line = match outcome {
                BattlePhase::Victory => "Victory!".to_string(),
                _ => "Defeat...".to_string(),
            };
            battle_log.log(BattleLogEventType::Encounter, line);
            if outcome == BattlePhase::Victory {
                closing.stage = ClosingStage::RewardPause;
                closing.wait = pacing.reward_delay;
            } else {
                closing.stage = ClosingStage::ExitPause;
                closing.wait = pacing.exit_delay;
            }
        }
        ClosingStage::RewardPause => {
            apply_victory_rewards(
                &mut handoff,
                &mut battle_log,
                &mut rng,
                &mut snapshot_events,
            );
            closing.stage = ClosingStage::ExitPause;
            closing.wait = pacing.exit_delay;
        }
        ClosingStage::ExitPause => {
            timers.closing = None;
            handoff.set_victory(outcome == BattlePhase::Victory);
            next_state.set(GameState::Overworld);
        }
    }
}

/// Experience goes onto the snapshot (the live player entity is about to
/// be torn down with the battle context); loot is a single uniform roll
/// against the foe's drop chance, recorded for the overworld to spawn.
fn apply_victory_rewards(
    handoff: &mut EncounterHandoff,
    battle_log: &mut BattleLog,
    rng: &mut GameRng,
    snapshot_events: &mut EventWriter<SnapshotChanged>,
) {
    let Some(foe) = handoff.foe().cloned() else {
        warn!("victory with no foe snapshot, skipping rewards");
        return;
    };

    if let Some(player) = handoff.player() {
        let remaining = player.exp_to_next.saturating_sub(foe.exp_reward);
        battle_log.log(
            BattleLogEventType::Encounter,
            format!("Gained {} experience", foe.exp_reward),
        );
        for (field, value) in handoff.update_player(None, None, Some(remaining)) {
            snapshot_events.send(SnapshotChanged { field, value });
        }
    }

    if let Some(item) = foe.loot {
        if rng.random_f32() < foe.drop_chance {
            battle_log.log(
                BattleLogEventType::Encounter,
                format!("The {} dropped {}!", foe.name, item),
            );
            handoff.set_loot(LootDrop {
                item,
                position: foe.position,
            });
        }
    }
}
