//! Overworld context
//!
//! The persistent world the player explores between encounters. The
//! authoritative data lives in [`WorldRecord`] (the stand-in for the
//! external user-data store); entities are spawned from it every time the
//! overworld context is entered and despawned wholesale when it is left.
//! Movement, tiles and rendering are collaborator concerns - this module
//! only owns the state the combat core reads and writes.

use bevy::prelude::*;

use crate::battle::combatant::{Combatant, Side};
use crate::states::{GameState, OverworldEntity};

/// Marker for the persistent player entity in the overworld.
#[derive(Component)]
pub struct WorldPlayer;

/// Overworld-side data a foe carries into an encounter: the reward and
/// loot table, plus the index of its record so the exit systems can mark
/// it defeated.
#[derive(Component, Debug, Clone)]
pub struct FoeProfile {
    pub exp_reward: u32,
    pub loot: Option<String>,
    pub drop_chance: f32,
    pub record_index: usize,
}

/// A foe starts an encounter when the player comes within this radius.
#[derive(Component, Debug, Clone, Copy)]
pub struct EncounterTrigger {
    pub radius: f32,
}

/// Marker for a loot pickup dropped by a defeated foe.
#[derive(Component, Debug, Clone)]
pub struct LootPickup {
    pub item: String,
}

/// Persistent record of the player's stats between context switches.
#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub focus: f32,
    pub max_focus: f32,
    pub attack_power: f32,
    pub level: u32,
    pub exp_to_next: u32,
    pub portrait: String,
    pub position: Vec2,
}

/// Persistent record of one overworld foe.
#[derive(Debug, Clone)]
pub struct FoeRecord {
    pub name: String,
    pub max_health: f32,
    pub attack_power: f32,
    pub level: u32,
    pub portrait: String,
    pub exp_reward: u32,
    pub loot: Option<String>,
    pub drop_chance: f32,
    pub position: Vec2,
    pub defeated: bool,
}

/// The persistent world state, surviving every context switch. Stand-in
/// for the external save-data store.
#[derive(Resource, Debug, Clone)]
pub struct WorldRecord {
    pub player: PlayerRecord,
    pub foes: Vec<FoeRecord>,
}

impl Default for WorldRecord {
    fn default() -> Self {
        Self {
            player: PlayerRecord {
                name: "Rowan".to_string(),
                health: 500.0,
                max_health: 500.0,
                focus: 30.0,
                max_focus: 30.0,
                attack_power: 30.0,
                level: 1,
                exp_to_next: 100,
                portrait: "portraits/rowan".to_string(),
                position: Vec2::new(0.0, 0.0),
            },
            foes: vec![
                FoeRecord {
                    name: "Thicket Boar".to_string(),
                    max_health: 50.0,
                    attack_power: 20.0,
                    level: 1,
                    portrait: "portraits/boar".to_string(),
                    exp_reward: 35,
                    loot: Some("Tough Hide".to_string()),
                    drop_chance: 0.5,
                    position: Vec2::new(120.0, 40.0),
                    defeated: false,
                },
                FoeRecord {
                    name: "Marsh Wisp".to_string(),
                    max_health: 80.0,
                    attack_power: 20.0,
                    level: 2,
                    portrait: "portraits/wisp".to_string(),
                    exp_reward: 60,
                    loot: Some("Pale Ember".to_string()),
                    drop_chance: 0.25,
                    position: Vec2::new(-90.0, 150.0),
                    defeated: false,
                },
            ],
        }
    }
}

impl WorldRecord {
    /// Build a fresh player combatant from the record.
    pub fn player_combatant(&self) -> Combatant {
        let mut combatant = Combatant::new(
            self.player.name.clone(),
            Side::Player,
            self.player.max_health,
            self.player.max_focus,
        );
        combatant.current_health = self.player.health.min(self.player.max_health);
        combatant.current_focus = self.player.focus.min(self.player.max_focus);
        combatant.attack_power = self.player.attack_power;
        combatant.level = self.player.level;
        combatant.exp_to_next = self.player.exp_to_next;
        combatant.portrait = self.player.portrait.clone();
        combatant
    }

    /// Build a fresh foe combatant from the record at `index`.
    pub fn foe_combatant(&self, index: usize) -> Option<Combatant> {
        let record = self.foes.get(index)?;
        let mut combatant = Combatant::new(
            record.name.clone(),
            Side::Foe,
            record.max_health,
            0.0,
        );
        combatant.attack_power = record.attack_power;
        combatant.level = record.level;
        combatant.portrait = record.portrait.clone();
        Some(combatant)
    }
}

/// Plugin for the overworld context
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldRecord>()
            .add_systems(OnEnter(GameState::Overworld), spawn_overworld)
            .add_systems(OnExit(GameState::Overworld), cleanup_overworld);
    }
}

/// Rebuild the overworld scene graph from the persistent record.
pub fn spawn_overworld(mut commands: Commands, record: Res<WorldRecord>) {
    commands.spawn((
        record.player_combatant(),
        WorldPlayer,
        OverworldEntity,
        Transform::from_translation(record.player.position.extend(0.0)),
    ));

    for (index, foe) in record.foes.iter().enumerate() {
        if foe.defeated {
            continue;
        }
        let combatant = record
            .foe_combatant(index)
            .expect("index comes from enumerate");
        commands.spawn((
            combatant,
            FoeProfile {
                exp_reward: foe.exp_reward,
                loot: foe.loot.clone(),
                drop_chance: foe.drop_chance,
                record_index: index,
            },
            EncounterTrigger { radius: 24.0 },
            OverworldEntity,
            Transform::from_translation(foe.position.extend(0.0)),
        ));
    }

    info!(
        "Overworld restored: player at {:?}, {} foes standing",
        record.player.position,
        record.foes.iter().filter(|f| !f.defeated).count()
    );
}

fn cleanup_overworld(mut commands: Commands, query: Query<Entity, With<OverworldEntity>>) {
    for entity in query.iter() {
        commands.entity(entity).despawn_recursive();
    }
}
