//! Battle events
//!
//! Notifications fired by the combat core and consumed by the flow
//! controller, the HUD, and the handoff store.

use bevy::prelude::*;

use super::combatant::Side;

/// Fired whenever a combatant's health changes (damage or healing).
#[derive(Event, Debug, Clone, Copy)]
pub struct HealthChanged {
    pub side: Side,
    pub current: f32,
    pub max: f32,
}

/// Fired whenever a combatant's focus changes.
#[derive(Event, Debug, Clone, Copy)]
pub struct ResourceChanged {
    pub side: Side,
    pub current: f32,
    pub max: f32,
}

/// Fired exactly once when a combatant's health reaches zero.
#[derive(Event, Debug, Clone, Copy)]
pub struct CombatantDied {
    pub side: Side,
}

/// Fired when a partial snapshot update actually changed a stored field.
/// Lets the HUD reflect values that originate outside the battle context
/// (for example the deferred experience reward).
#[derive(Event, Debug, Clone, Copy)]
pub struct SnapshotChanged {
    pub field: crate::handoff::SnapshotField,
    pub value: f32,
}

/// A player action request, sent by the HUD buttons or a headless script.
///
/// Requests arriving while an action is already in flight, or outside the
/// player's turn, are silently dropped by the turn executor.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Attack,
    /// Use the item in the given inventory slot
    UseItem(usize),
    Defend,
    Special,
}
