//! Encounter handoff
//!
//! The one channel that crosses the overworld/battle boundary. Both scene
//! graphs are torn down wholesale on a context switch, so no entity
//! references survive it; instead the entry systems copy plain snapshots
//! of both combatants into this resource, the battle reads them on setup,
//! and the exit systems apply the (possibly mutated) player snapshot back
//! onto the persistent world state.
//!
//! The store is a regular Bevy resource passed to systems, not process
//! globals: its lifecycle is one encounter, opened by `set_active(true)`
//! and closed by `clear()`.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::battle::combatant::Combatant;
use crate::world::FoeProfile;

pub mod transition;

pub use transition::HandoffPlugin;

/// Snapshot of the player-controlled combatant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub focus: f32,
    pub max_focus: f32,
    pub attack_power: f32,
    pub level: u32,
    pub exp_to_next: u32,
    pub portrait: String,
    /// Overworld position, restored on return
    pub position: Vec2,
}

/// Snapshot of the foe the player walked into.
#[derive(Debug, Clone, PartialEq)]
pub struct FoeSnapshot {
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    pub attack_power: f32,
    pub level: u32,
    pub portrait: String,
    pub exp_reward: u32,
    /// Item dropped on a successful loot roll
    pub loot: Option<String>,
    /// Probability in [0,1] that the loot drops on victory
    pub drop_chance: f32,
    /// Last overworld position, where loot is spawned
    pub position: Vec2,
    /// Index into the world record, used to mark the foe defeated
    pub record_index: usize,
}

/// Fields of the player snapshot that [`EncounterHandoff::update_player`]
/// can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotField {
    Health,
    Focus,
    Experience,
}

/// A loot drop rolled during the battle, spawned in the overworld on
/// return (the battle scene graph is gone by then).
#[derive(Debug, Clone, PartialEq)]
pub struct LootDrop {
    pub item: String,
    pub position: Vec2,
}

/// The cross-context snapshot store. At most one snapshot pair is live at
/// a time, guarded by the same `active` flag that marks an encounter as
/// in progress.
#[derive(Resource, Debug, Default)]
pub struct EncounterHandoff {
    player: Option<PlayerSnapshot>,
    foe: Option<FoeSnapshot>,
    loot: Option<LootDrop>,
    /// Set by the closing sequence: Some(true) on a victory
    victory: Option<bool>,
    active: bool,
}

impl EncounterHandoff {
    /// Copy the live player combatant into the store.
    pub fn store_player(&mut self, combatant: &Combatant, position: Vec2) {
        self.player = Some(PlayerSnapshot {
            name: combatant.name.clone(),
            health: combatant.current_health,
            max_health: combatant.max_health,
            focus: combatant.current_focus,
            max_focus: combatant.max_focus,
            attack_power: combatant.attack_power,
            level: combatant.level,
            exp_to_next: combatant.exp_to_next,
            portrait: combatant.portrait.clone(),
            position,
        });
    }

    /// Copy the live foe combatant and its overworld profile into the store.
    pub fn store_foe(&mut self, combatant: &Combatant, profile: &FoeProfile, position: Vec2) {
        self.foe = Some(FoeSnapshot {
            name: combatant.name.clone(),
            health: combatant.current_health,
            max_health: combatant.max_health,
            attack_power: combatant.attack_power,
            level: combatant.level,
            portrait: combatant.portrait.clone(),
            exp_reward: profile.exp_reward,
            loot: profile.loot.clone(),
            drop_chance: profile.drop_chance,
            position,
            record_index: profile.record_index,
        });
    }

    /// Write the player snapshot back onto a live combatant.
    pub fn apply_player(&self, combatant: &mut Combatant) {
        if let Some(snapshot) = &self.player {
            combatant.name = snapshot.name.clone();
            combatant.current_health = snapshot.health.min(snapshot.max_health);
            combatant.max_health = snapshot.max_health;
            combatant.current_focus = snapshot.focus.min(snapshot.max_focus);
            combatant.max_focus = snapshot.max_focus;
            combatant.attack_power = snapshot.attack_power;
            combatant.level = snapshot.level;
            combatant.exp_to_next = snapshot.exp_to_next;
            combatant.portrait = snapshot.portrait.clone();
        }
    }

    /// Partial in-place update of the player snapshot. Untouched fields
    /// keep their values; fields whose new value equals the stored one are
    /// not reported. Returns the list of fields that actually changed so
    /// the caller can fire change notifications.
    pub fn update_player(
        &mut self,
        health: Option<f32>,
        focus: Option<f32>,
        exp_to_next: Option<u32>,
    ) -> SmallVec<[(SnapshotField, f32); 3]> {
        let mut changed = SmallVec::new();
        let Some(snapshot) = self.player.as_mut() else {
            warn!("update_player called with no player snapshot stored");
            return changed;
        };

        if let Some(health) = health {
            let health = health.clamp(0.0, snapshot.max_health);
            if health != snapshot.health {
                snapshot.health = health;
                changed.push((SnapshotField::Health, health));
            }
        }
        if let Some(focus) = focus {
            let focus = focus.clamp(0.0, snapshot.max_focus);
            if focus != snapshot.focus {
                snapshot.focus = focus;
                changed.push((SnapshotField::Focus, focus));
            }
        }
        if let Some(exp) = exp_to_next {
            if exp != snapshot.exp_to_next {
                snapshot.exp_to_next = exp;
                changed.push((SnapshotField::Experience, exp as f32));
            }
        }
        changed
    }

    pub fn player(&self) -> Option<&PlayerSnapshot> {
        self.player.as_ref()
    }

    pub fn foe(&self) -> Option<&FoeSnapshot> {
        self.foe.as_ref()
    }

    /// Record a rolled loot drop for the exit systems to spawn.
    pub fn set_loot(&mut self, loot: LootDrop) {
        self.loot = Some(loot);
    }

    pub fn take_loot(&mut self) -> Option<LootDrop> {
        self.loot.take()
    }

    pub fn pending_loot(&self) -> Option<&LootDrop> {
        self.loot.as_ref()
    }

    /// Record the battle outcome for the exit systems.
    pub fn set_victory(&mut self, victory: bool) {
        self.victory = Some(victory);
    }

    pub fn victory(&self) -> Option<bool> {
        self.victory
    }

    /// Mark an encounter handoff as in progress. Only the active context
    /// may mutate the store while this is set.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reset the store to empty. Idempotent: clearing an already empty
    /// store is a no-op, but forgetting to clear leaks a stale snapshot
    /// into the next encounter.
    pub fn clear(&mut self) {
        self.player = None;
        self.foe = None;
        self.loot = None;
        self.victory = None;
        self.active = false;
    }
}
