//! Foe strategies
//!
//! The foe's turn is decided by a pluggable strategy so the fixed script
//! can later be swapped for random choice or difficulty scaling without
//! touching the flow controller.

use bevy::prelude::*;

use super::combatant::Combatant;
use super::GameRng;

/// What the foe does with its turn.
#[derive(Debug, Clone, PartialEq)]
pub struct FoeAction {
    /// Display name for the battle log
    pub name: String,
    /// Damage dealt to the player
    pub damage: f32,
    /// "Thinking" pause before the attack lands
    pub think_time: f32,
}

/// Decides the foe's action each turn.
pub trait FoeStrategy: Send + Sync {
    fn choose_action(&mut self, foe: &Combatant, player: &Combatant, rng: &mut GameRng)
        -> FoeAction;
}

/// Resource holding the active strategy.
#[derive(Resource)]
pub struct FoeBrain(pub Box<dyn FoeStrategy>);

impl Default for FoeBrain {
    fn default() -> Self {
        Self(Box::new(ScriptedFoe::default()))
    }
}

/// The fixed script: always the same attack for the foe's listed attack
/// power, after the same pause.
#[derive(Debug, Clone)]
pub struct ScriptedFoe {
    pub think_time: f32,
}

impl Default for ScriptedFoe {
    fn default() -> Self {
        Self { think_time: 1.2 }
    }
}

impl FoeStrategy for ScriptedFoe {
    fn choose_action(
        &mut self,
        foe: &Combatant,
        _player: &Combatant,
        _rng: &mut GameRng,
    ) -> FoeAction {
        FoeAction {
            name: format!("{}'s attack", foe.name),
            damage: foe.attack_power,
            think_time: self.think_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::combatant::Side;

    #[test]
    fn scripted_foe_uses_its_attack_power() {
        let mut strategy = ScriptedFoe::default();
        let mut foe = Combatant::new("Boar", Side::Foe, 50.0, 0.0);
        foe.attack_power = 20.0;
        let player = Combatant::new("Rowan", Side::Player, 500.0, 30.0);
        let mut rng = GameRng::from_seed(1);

        let action = strategy.choose_action(&foe, &player, &mut rng);
        assert_eq!(action.damage, 20.0);
        // Deterministic: same inputs, same action
        let again = strategy.choose_action(&foe, &player, &mut rng);
        assert_eq!(action, again);
    }
}
