//! Context entry and exit
//!
//! Entry: the overworld detects the player standing next to a foe, copies
//! both combatants into the handoff store, and switches to the battle
//! context. The battle reads the store on setup; if the foe snapshot is
//! missing the entry aborts straight back to the overworld without
//! touching any state (fail closed).
//!
//! Exit: the battle scene graph is despawned wholesale; back in the
//! overworld the final snapshot is applied to the persistent player, a
//! defeated foe is retired from the world record, pending loot is
//! spawned, and the store is cleared for the next encounter.

use bevy::prelude::*;

use crate::battle::combatant::{Combatant, Side};
use crate::battle::events::{HealthChanged, ResourceChanged};
use crate::battle::flow::FlowTimers;
use crate::battle::log::{BattleLog, BattleLogEventType};
use crate::battle::state::{BattleState, PhaseEvent};
use crate::battle::turns::ActionRunner;
use crate::battle::{BattlePacing, CommandGate};
use crate::states::{BattleEntity, GameState};
use crate::world::{spawn_overworld, EncounterTrigger, FoeProfile, LootPickup, WorldPlayer, WorldRecord};

use super::EncounterHandoff;

/// Plugin wiring the handoff store and the context transitions
pub struct HandoffPlugin;

impl Plugin for HandoffPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EncounterHandoff>()
            .add_systems(
                Update,
                detect_encounters.run_if(in_state(GameState::Overworld)),
            )
            .add_systems(OnEnter(GameState::Battle), setup_battle)
            .add_systems(OnExit(GameState::Battle), cleanup_battle)
            .add_systems(
                OnEnter(GameState::Overworld),
                resume_from_battle.after(spawn_overworld),
            );
    }
}

/// Watch for the player walking into a foe's trigger radius. The first
/// adjacent foe wins; the store only ever holds one snapshot pair.
fn detect_encounters(
    mut handoff: ResMut<EncounterHandoff>,
    mut next_state: ResMut<NextState<GameState>>,
    players: Query<(&Combatant, &Transform), With<WorldPlayer>>,
    foes: Query<(&Combatant, &FoeProfile, &EncounterTrigger, &Transform)>,
) {
    if handoff.is_active() {
        return;
    }
    let Ok((player, player_transform)) = players.get_single() else {
        return;
    };
    let player_pos = player_transform.translation.truncate();

    for (foe, profile, trigger, foe_transform) in foes.iter() {
        let foe_pos = foe_transform.translation.truncate();
        if player_pos.distance(foe_pos) > trigger.radius {
            continue;
        }

        info!("Encounter triggered: {} vs {}", player.name, foe.name);
        handoff.store_player(player, player_pos);
        handoff.store_foe(foe, profile, foe_pos);
        handoff.set_active(true);
        next_state.set(GameState::Battle);
        return;
    }
}

/// Build the battle context from the snapshot store.
fn setup_battle(
    mut commands: Commands,
    handoff: Res<EncounterHandoff>,
    mut battle_state: ResMut<BattleState>,
    mut battle_log: ResMut<BattleLog>,
    mut runner: ResMut<ActionRunner>,
    mut timers: ResMut<FlowTimers>,
    mut gate: ResMut<CommandGate>,
    pacing: Res<BattlePacing>,
    mut health_events: EventWriter<HealthChanged>,
    mut resource_events: EventWriter<ResourceChanged>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    // Fail closed: an empty store means nothing captured this entry
    let (Some(player_snapshot), Some(foe_snapshot)) = (handoff.player(), handoff.foe()) else {
        error!("battle entered with no snapshot pair, aborting entry");
        next_state.set(GameState::Overworld);
        return;
    };

    battle_state.reset();
    runner.reset();
    timers.reset();
    gate.accepting = false;
    battle_log.clear();

    let mut player = Combatant::new(
        player_snapshot.name.clone(),
        Side::Player,
        player_snapshot.max_health,
        player_snapshot.max_focus,
    );
    handoff.apply_player(&mut player);

    let mut foe = Combatant::new(
        foe_snapshot.name.clone(),
        Side::Foe,
        foe_snapshot.max_health,
        0.0,
    );
    foe.current_health = foe_snapshot.health.min(foe_snapshot.max_health);
    foe.attack_power = foe_snapshot.attack_power;
    foe.level = foe_snapshot.level;
    foe.portrait = foe_snapshot.portrait.clone();

    battle_log.log(
        BattleLogEventType::Encounter,
        format!("Battle started: a wild {} appears!", foe.name),
    );

    // Initial HUD push so the bars are right before the first tick
    health_events.send(HealthChanged {
        side: Side::Player,
        current: player.current_health,
        max: player.max_health,
    });
    resource_events.send(ResourceChanged {
        side: Side::Player,
        current: player.current_focus,
        max: player.max_focus,
    });
    health_events.send(HealthChanged {
        side: Side::Foe,
        current: foe.current_health,
        max: foe.max_health,
    });

    commands.spawn((player, BattleEntity));
    commands.spawn((foe, BattleEntity));

    if let Err(e) = battle_state.advance(PhaseEvent::BattleStarted) {
        warn!("battle setup found a stale phase: {}", e);
    }
    timers.start_opening(pacing.opening);
}

/// Tear the battle context down. The handoff store survives this; the
/// entities and per-battle state do not.
pub fn cleanup_battle(
    mut commands: Commands,
    query: Query<Entity, With<BattleEntity>>,
    mut battle_state: ResMut<BattleState>,
    mut runner: ResMut<ActionRunner>,
    mut timers: ResMut<FlowTimers>,
    mut gate: ResMut<CommandGate>,
) {
    for entity in query.iter() {
        commands.entity(entity).despawn_recursive();
    }
    battle_state.reset();
    runner.reset();
    timers.reset();
    gate.accepting = false;
}

/// Back in the overworld: apply the final snapshot to the persistent
/// player, retire a defeated foe, spawn pending loot, clear the store.
/// Runs after the overworld graph is respawned; a fresh launch (no active
/// handoff) is a no-op.
fn resume_from_battle(
    mut commands: Commands,
    mut handoff: ResMut<EncounterHandoff>,
    mut record: ResMut<WorldRecord>,
    mut players: Query<(&mut Combatant, &mut Transform), With<WorldPlayer>>,
    foes: Query<(Entity, &FoeProfile)>,
) {
    if !handoff.is_active() {
        return;
    }

    if let Some(snapshot) = handoff.player() {
        // Persist first, then mirror onto the freshly spawned entity
        record.player.health = snapshot.health;
        record.player.focus = snapshot.focus;
        record.player.level = snapshot.level;
        record.player.exp_to_next = snapshot.exp_to_next;
        record.player.position = snapshot.position;

        if let Ok((mut combatant, mut transform)) = players.get_single_mut() {
            handoff.apply_player(&mut combatant);
            transform.translation = snapshot.position.extend(0.0);
        } else {
            warn!("no persistent player entity to apply the snapshot to");
        }
    }

    if handoff.victory() == Some(true) {
        if let Some(foe_snapshot) = handoff.foe() {
            if let Some(foe_record) = record.foes.get_mut(foe_snapshot.record_index) {
                foe_record.defeated = true;
            }
            // The overworld respawn predates this mark, so retire the
            // live counterpart too
            for (entity, profile) in foes.iter() {
                if profile.record_index == foe_snapshot.record_index {
                    commands.entity(entity).despawn_recursive();
                }
            }
        }
    }

    if let Some(loot) = handoff.take_loot() {
        info!("Loot dropped: {} at {:?}", loot.item, loot.position);
        commands.spawn((
            LootPickup { item: loot.item },
            crate::states::OverworldEntity,
            Transform::from_translation(loot.position.extend(0.0)),
        ));
    }

    handoff.clear();
}
