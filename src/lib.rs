//! Thornvale - Turn-Based Encounter Core
//!
//! The combat core of a 2D exploration RPG: encounter entry from the
//! overworld, an alternating turn loop between the player and a scripted
//! foe, and the snapshot handoff that carries results back into the
//! persistent world state.
//!
//! This library exposes the core game modules for testing and reuse.

pub mod battle;
pub mod cli;
pub mod handoff;
pub mod headless;
pub mod states;
pub mod ui;
pub mod world;

// Re-export commonly used types
pub use battle::combatant::{Combatant, Side};
pub use battle::log::{BattleLog, BattleLogEventType};
pub use battle::state::{ActionState, BattlePhase, BattleState, PhaseEvent};
pub use handoff::EncounterHandoff;
pub use headless::HeadlessEncounterConfig;
pub use states::GameState;
