//! Battle system
//!
//! The turn-based encounter core:
//! - Combatant health/focus bookkeeping and death detection
//! - A validated phase/action state machine
//! - The turn executor (player commands and the foe's scripted turn)
//! - The flow controller (opening, terminal detection, closing, rewards)
//! - Battle logging
//!
//! All waiting - pacing between observable steps, the foe "thinking", the
//! wait for player input - is a countdown ticked by the schedule; one
//! frame is one scheduler tick, and the chained system order below is the
//! total order of everything that happens inside a frame.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

pub mod combatant;
pub mod events;
pub mod flow;
pub mod items;
pub mod log;
pub mod state;
pub mod strategy;
pub mod turns;

use crate::states::GameState;
use events::*;

/// Focus cost of the special attack
pub const SPECIAL_FOCUS_COST: f32 = 10.0;
/// Damage multiplier of the special attack over a basic attack
pub const SPECIAL_DAMAGE_MULTIPLIER: f32 = 2.0;

/// Plugin for the battle system
pub struct BattlePlugin;

impl Plugin for BattlePlugin {
    fn build(&self, app: &mut App) {
        app
            // Battle events
            .add_event::<HealthChanged>()
            .add_event::<ResourceChanged>()
            .add_event::<CombatantDied>()
            .add_event::<SnapshotChanged>()
            .add_event::<PlayerCommand>()
            // Resources
            .init_resource::<state::BattleState>()
            .init_resource::<log::BattleLog>()
            .init_resource::<turns::ActionRunner>()
            .init_resource::<flow::FlowTimers>()
            .init_resource::<BattlePacing>()
            .init_resource::<CommandGate>()
            .init_resource::<items::Inventory>()
            .init_resource::<strategy::FoeBrain>()
            .init_resource::<GameRng>()
            // Systems, in deterministic in-frame order
            .add_systems(
                Update,
                (
                    flow::run_opening,
                    turns::accept_player_commands,
                    turns::begin_foe_turn,
                    turns::advance_action_runner,
                    flow::sync_snapshot,
                    flow::watch_deaths,
                    flow::poll_terminal,
                    flow::run_closing,
                    flow::apply_snapshot_changes,
                )
                    .chain()
                    .run_if(in_state(GameState::Battle)),
            );
    }
}

/// Fixed pacing delays (seconds) between observable combat steps.
#[derive(Resource, Debug, Clone)]
pub struct BattlePacing {
    /// Intro pause before the first turn
    pub opening: f32,
    /// Pause between starting an action and its effect landing
    pub action_windup: f32,
    /// How long the hurt flinch lasts before the turn ends
    pub hurt_flinch: f32,
    /// Pause after the terminal phase before the outcome line
    pub closing: f32,
    /// Pause before the experience reward is applied, so the defeat line
    /// displays first
    pub reward_delay: f32,
    /// Pause after the outcome line before leaving the battle context
    pub exit_delay: f32,
}

impl Default for BattlePacing {
    fn default() -> Self {
        Self {
            opening: 1.0,
            action_windup: 0.4,
            hurt_flinch: 0.6,
            closing: 0.8,
            reward_delay: 0.5,
            exit_delay: 1.0,
        }
    }
}

impl BattlePacing {
    /// Zero delays for headless runs and tests: every suspension point
    /// completes on its first scheduler tick.
    pub fn instant() -> Self {
        Self {
            opening: 0.0,
            action_windup: 0.0,
            hurt_flinch: 0.0,
            closing: 0.0,
            reward_delay: 0.0,
            exit_delay: 0.0,
        }
    }
}

/// Whether the action buttons currently accept input. Opened at the start
/// of the player's turn, closed while an action is in flight and for the
/// whole foe turn.
#[derive(Resource, Debug, Default)]
pub struct CommandGate {
    pub accepting: bool,
}

/// Seeded RNG resource for the loot roll.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
