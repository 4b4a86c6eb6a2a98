//! Combatant model
//!
//! Health, focus, and death bookkeeping for the two fight participants.
//! A combatant is mutated only through [`Combatant::apply_damage`] and
//! [`Combatant::heal`]; callers turn the returned outcome into events, so
//! the model itself has no UI coupling.

use bevy::prelude::*;

/// Which side of the fight a combatant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The player-controlled combatant
    Player,
    /// The scripted foe
    Foe,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Player => write!(f, "Player"),
            Side::Foe => write!(f, "Foe"),
        }
    }
}

/// Result of a single damage application.
///
/// `died` is true exactly once per combatant: on the hit that drops health
/// to zero while the combatant was still alive. Later hits on a corpse
/// report `died: false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Damage actually subtracted from health (after the min-1 clamp and
    /// the zero floor)
    pub dealt: f32,
    /// Health remaining after the hit
    pub remaining: f32,
    /// Whether this hit killed the combatant
    pub died: bool,
}

/// One fight participant (player or foe).
#[derive(Component, Debug, Clone)]
pub struct Combatant {
    pub name: String,
    pub side: Side,
    pub current_health: f32,
    pub max_health: f32,
    /// Secondary resource spent by the special attack
    pub current_focus: f32,
    pub max_focus: f32,
    /// Fixed damage dealt by a basic attack
    pub attack_power: f32,
    pub level: u32,
    /// Experience still needed for the next level (player side only)
    pub exp_to_next: u32,
    /// Portrait asset key shown by the HUD
    pub portrait: String,
    dead: bool,
}

impl Combatant {
    pub fn new(name: impl Into<String>, side: Side, max_health: f32, max_focus: f32) -> Self {
        Self {
            name: name.into(),
            side,
            current_health: max_health,
            max_health,
            current_focus: max_focus,
            max_focus,
            attack_power: 30.0,
            level: 1,
            exp_to_next: 100,
            portrait: String::new(),
            dead: false,
        }
    }

    /// Apply a hit. The amount is clamped to a minimum of 1 so every hit
    /// has an effect; health floors at zero and never goes back up here.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        debug_assert!(
            self.current_health >= 0.0,
            "apply_damage: health already negative ({})",
            self.current_health
        );

        let amount = amount.max(1.0);
        let dealt = amount.min(self.current_health);
        self.current_health = (self.current_health - amount).max(0.0);

        let died = self.current_health <= 0.0 && !self.dead;
        if died {
            self.dead = true;
        }

        DamageOutcome {
            dealt,
            remaining: self.current_health,
            died,
        }
    }

    /// Restore health, clamped to max. Healing never clears the dead
    /// flag: a corpse stays a corpse even at full health.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let restored = (self.current_health + amount.max(0.0)).min(self.max_health)
            - self.current_health;
        self.current_health += restored;
        restored
    }

    /// Spend focus for the special attack. Returns false (and spends
    /// nothing) when there is not enough.
    pub fn spend_focus(&mut self, amount: f32) -> bool {
        if self.current_focus < amount {
            return false;
        }
        self.current_focus -= amount;
        true
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }
}
