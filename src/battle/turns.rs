//! Turn executor
//!
//! Realizes one turn as a two-stage countdown: windup (the pacing delay
//! before an action's effect lands) and recover (the hurt flinch before
//! the turn ends and the phase flips to the other side). At most one
//! action is ever in flight - the runner doubles as the re-entrancy guard
//! that swallows duplicate button presses.
//!
//! A missing combatant, a missing inventory item, or not enough focus is
//! never fatal: the turn degrades to a logged no-op that still performs
//! its phase transition, so the loop cannot stall.

use bevy::prelude::*;

use super::combatant::{Combatant, Side};
use super::events::{CombatantDied, HealthChanged, PlayerCommand, ResourceChanged};
use super::items::{Inventory, ItemEffect};
use super::log::{BattleLog, BattleLogEventType};
use super::state::{ActionState, BattlePhase, BattleState, PhaseEvent};
use super::strategy::{FoeAction, FoeBrain};
use super::{BattlePacing, CommandGate, GameRng, SPECIAL_DAMAGE_MULTIPLIER, SPECIAL_FOCUS_COST};

/// The action currently being resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    PlayerAttack,
    PlayerSpecial,
    PlayerDefend,
    PlayerItem(usize),
    FoeAttack(FoeAction),
    /// Degraded player turn: no effect, but the turn still passes
    PlayerPass,
    /// Degraded foe turn: no effect, but the turn still passes
    FoePass,
}

impl ActionKind {
    fn is_player(&self) -> bool {
        !matches!(self, ActionKind::FoeAttack(_) | ActionKind::FoePass)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Waiting for the effect to land
    Windup,
    /// Waiting out the hurt flinch before the turn ends
    Recover,
}

#[derive(Debug)]
struct RunningAction {
    kind: ActionKind,
    stage: Stage,
    wait: f32,
}

/// Holds the single in-flight action, if any.
#[derive(Resource, Debug, Default)]
pub struct ActionRunner {
    current: Option<RunningAction>,
}

impl ActionRunner {
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    fn start(&mut self, kind: ActionKind, windup: f32) {
        debug_assert!(self.current.is_none(), "an action is already in flight");
        self.current = Some(RunningAction {
            kind,
            stage: Stage::Windup,
            wait: windup,
        });
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

fn find_combatant<'a>(
    query: &'a mut Query<&mut Combatant>,
    side: Side,
) -> Option<Mut<'a, Combatant>> {
    query.iter_mut().find(|c| c.side == side)
}

/// Intake for player commands. A command is accepted only during the
/// player's turn, with the gate open and no action in flight; everything
/// else (double clicks, clicks during the foe turn) is dropped.
pub fn accept_player_commands(
    mut commands: EventReader<PlayerCommand>,
    mut battle_state: ResMut<BattleState>,
    mut runner: ResMut<ActionRunner>,
    mut gate: ResMut<CommandGate>,
    mut battle_log: ResMut<BattleLog>,
    mut resource_events: EventWriter<ResourceChanged>,
    pacing: Res<BattlePacing>,
    inventory: Res<Inventory>,
    mut combatants: Query<&mut Combatant>,
) {
    for command in commands.read() {
        if battle_state.phase() != BattlePhase::PlayerTurn {
            continue;
        }
        // Re-entrant guard: the gate closes the moment an action is
        // accepted, so one action per turn no matter how fast the
        // buttons are pressed
        if !gate.accepting || runner.is_busy() || battle_state.player_action() != ActionState::Idle
        {
            continue;
        }

        gate.accepting = false;

        let Some(mut player) = find_combatant(&mut combatants, Side::Player) else {
            warn!("player combatant missing, passing the turn");
            runner.start(ActionKind::PlayerPass, pacing.action_windup);
            continue;
        };

        match *command {
            PlayerCommand::Attack => {
                battle_state.set_player_action(ActionState::Attacking);
                runner.start(ActionKind::PlayerAttack, pacing.action_windup);
            }
            PlayerCommand::Special => {
                if player.spend_focus(SPECIAL_FOCUS_COST) {
                    resource_events.send(ResourceChanged {
                        side: Side::Player,
                        current: player.current_focus,
                        max: player.max_focus,
                    });
                    battle_state.set_player_action(ActionState::Attacking);
                    runner.start(ActionKind::PlayerSpecial, pacing.action_windup);
                } else {
                    battle_log.log(
                        BattleLogEventType::Encounter,
                        format!("{} lacks the focus for a special attack", player.name),
                    );
                    runner.start(ActionKind::PlayerPass, pacing.action_windup);
                }
            }
            PlayerCommand::Defend => {
                battle_state.set_player_action(ActionState::Defending);
                runner.start(ActionKind::PlayerDefend, pacing.action_windup);
            }
            PlayerCommand::UseItem(slot) => {
                if inventory.get(slot).is_some() {
                    battle_state.set_player_action(ActionState::UsingItem);
                    runner.start(ActionKind::PlayerItem(slot), pacing.action_windup);
                } else {
                    warn!("no item in slot {}, passing the turn", slot);
                    battle_log.log(
                        BattleLogEventType::Encounter,
                        format!("{} reaches for an empty slot", player.name),
                    );
                    runner.start(ActionKind::PlayerPass, pacing.action_windup);
                }
            }
        }
    }
}

/// Start the foe's turn once the phase flips to it: close the gate, ask
/// the strategy what to do, and queue the attack behind its think time.
pub fn begin_foe_turn(
    mut battle_state: ResMut<BattleState>,
    mut runner: ResMut<ActionRunner>,
    mut gate: ResMut<CommandGate>,
    mut brain: ResMut<FoeBrain>,
    mut rng: ResMut<GameRng>,
    mut combatants: Query<&mut Combatant>,
) {
    if battle_state.phase() != BattlePhase::FoeTurn || runner.is_busy() {
        return;
    }

    gate.accepting = false;

    let mut foe_ref = None;
    let mut player_ref = None;
    for combatant in combatants.iter_mut() {
        match combatant.side {
            Side::Foe => foe_ref = Some(combatant),
            Side::Player => player_ref = Some(combatant),
        }
    }

    let (Some(foe), Some(player)) = (foe_ref, player_ref) else {
        warn!("combatant missing on foe turn, passing");
        runner.start(ActionKind::FoePass, 0.0);
        return;
    };

    if foe.is_dead() {
        // Terminal detection will latch Victory; pass so the loop moves on
        runner.start(ActionKind::FoePass, 0.0);
        return;
    }

    let action = brain.0.choose_action(&foe, &player, &mut rng);
    battle_state.set_foe_action(ActionState::Attacking);
    runner.start(ActionKind::FoeAttack(action.clone()), action.think_time);
}

/// Tick the in-flight action through windup -> resolve -> recover -> turn
/// end. All mutations happen in program order between two suspension
/// points; the phase flips only when the recover stage has fully elapsed.
pub fn advance_action_runner(
    time: Res<Time>,
    mut runner: ResMut<ActionRunner>,
    mut battle_state: ResMut<BattleState>,
    mut battle_log: ResMut<BattleLog>,
    mut inventory: ResMut<Inventory>,
    mut gate: ResMut<CommandGate>,
    pacing: Res<BattlePacing>,
    mut combatants: Query<&mut Combatant>,
    mut health_events: EventWriter<HealthChanged>,
    mut death_events: EventWriter<CombatantDied>,
) {
    let Some(action) = runner.current.as_mut() else {
        return;
    };

    action.wait -= time.delta_secs();
    if action.wait > 0.0 {
        return;
    }

    match action.stage {
        Stage::Windup => {
            let kind = action.kind.clone();
            resolve_effect(
                &kind,
                &mut battle_state,
                &mut battle_log,
                &mut inventory,
                &mut combatants,
                &mut health_events,
                &mut death_events,
            );
            // Borrow of `runner` was released while resolving
            if let Some(action) = runner.current.as_mut() {
                action.stage = Stage::Recover;
                action.wait = pacing.hurt_flinch;
            }
        }
        Stage::Recover => {
            let was_player = action.kind.is_player();
            runner.current = None;
            battle_state.set_player_action(ActionState::Idle);
            battle_state.set_foe_action(ActionState::Idle);
            battle_log.turn += 1;

            if battle_state.phase().is_terminal() {
                // The death watcher latched the outcome mid-turn; nothing
                // left to hand the turn to
                return;
            }

            let event = if was_player {
                PhaseEvent::PlayerActed
            } else {
                PhaseEvent::FoeActed
            };
            match battle_state.advance(event) {
                Ok(BattlePhase::PlayerTurn) => gate.accepting = true,
                Ok(_) => {}
                Err(e) => warn!("turn end could not advance the phase: {}", e),
            }
        }
    }
}

/// Apply an action's effect. Runs exactly once per action, between the
/// windup and recover waits.
fn resolve_effect(
    kind: &ActionKind,
    battle_state: &mut BattleState,
    battle_log: &mut BattleLog,
    inventory: &mut Inventory,
    combatants: &mut Query<&mut Combatant>,
    health_events: &mut EventWriter<HealthChanged>,
    death_events: &mut EventWriter<CombatantDied>,
) {
    match kind {
        ActionKind::PlayerAttack | ActionKind::PlayerSpecial => {
            let Some(player) = find_combatant(combatants, Side::Player) else {
                warn!("player combatant missing, attack fizzles");
                return;
            };
            let attacker_name = player.name.clone();
            let mut damage = player.attack_power;
            if matches!(kind, ActionKind::PlayerSpecial) {
                damage *= SPECIAL_DAMAGE_MULTIPLIER;
            }

            let Some(mut foe) = find_combatant(combatants, Side::Foe) else {
                warn!("foe combatant missing, attack fizzles");
                return;
            };
            let outcome = foe.apply_damage(damage);
            battle_state.set_foe_action(ActionState::Hurt);
            battle_log.log_damage(&attacker_name, &foe.name, outcome.dealt);
            health_events.send(HealthChanged {
                side: Side::Foe,
                current: outcome.remaining,
                max: foe.max_health,
            });
            if outcome.died {
                battle_log.log(
                    BattleLogEventType::Death,
                    format!("{} is defeated!", foe.name),
                );
                death_events.send(CombatantDied { side: Side::Foe });
            }
        }
        ActionKind::PlayerItem(slot) => {
            let Some(item) = inventory.remove(*slot) else {
                warn!("item vanished from slot {}, turn fizzles", slot);
                return;
            };
            match item.effect {
                ItemEffect::Restore => {
                    let Some(mut player) = find_combatant(combatants, Side::Player) else {
                        warn!("player combatant missing, item fizzles");
                        return;
                    };
                    let restored = player.heal(item.potency);
                    battle_log.log(
                        BattleLogEventType::ItemUsed,
                        format!("{} uses {}", player.name, item.name),
                    );
                    battle_log.log_healing(&player.name, restored);
                    health_events.send(HealthChanged {
                        side: Side::Player,
                        current: player.current_health,
                        max: player.max_health,
                    });
                    // Healing does not put the foe in a hurt state
                }
                ItemEffect::Harm => {
                    let user_name = find_combatant(combatants, Side::Player)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| "Player".to_string());
                    let Some(mut foe) = find_combatant(combatants, Side::Foe) else {
                        warn!("foe combatant missing, item fizzles");
                        return;
                    };
                    let outcome = foe.apply_damage(item.potency);
                    battle_state.set_foe_action(ActionState::Hurt);
                    battle_log.log(
                        BattleLogEventType::ItemUsed,
                        format!("{} uses {}", user_name, item.name),
                    );
                    battle_log.log_damage(&item.name, &foe.name, outcome.dealt);
                    health_events.send(HealthChanged {
                        side: Side::Foe,
                        current: outcome.remaining,
                        max: foe.max_health,
                    });
                    if outcome.died {
                        battle_log.log(
                            BattleLogEventType::Death,
                            format!("{} is defeated!", foe.name),
                        );
                        death_events.send(CombatantDied { side: Side::Foe });
                    }
                }
            }
        }
        ActionKind::PlayerDefend => {
            if let Some(player) = find_combatant(combatants, Side::Player) {
                battle_log.log(
                    BattleLogEventType::Encounter,
                    format!("{} holds a defensive stance", player.name),
                );
            }
        }
        ActionKind::FoeAttack(foe_action) => {
            let Some(mut player) = find_combatant(combatants, Side::Player) else {
                warn!("player combatant missing, foe attack fizzles");
                return;
            };
            let outcome = player.apply_damage(foe_action.damage);
            battle_state.set_player_action(ActionState::Hurt);
            battle_log.log_damage(&foe_action.name, &player.name, outcome.dealt);
            health_events.send(HealthChanged {
                side: Side::Player,
                current: outcome.remaining,
                max: player.max_health,
            });
            if outcome.died {
                battle_log.log(
                    BattleLogEventType::Death,
                    format!("{} falls...", player.name),
                );
                death_events.send(CombatantDied { side: Side::Player });
            }
        }
        ActionKind::PlayerPass | ActionKind::FoePass => {}
    }
}
