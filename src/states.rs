//! Game state management
//!
//! The two contexts of the game: the overworld and the battle screen.
//! Entering a battle replaces the whole overworld scene graph and vice
//! versa; the only data that crosses the boundary is the
//! [`crate::handoff::EncounterHandoff`] resource, which outlives both.

use bevy::prelude::*;

/// The core game states representing the two scene contexts.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Exploring the persistent world
    #[default]
    Overworld,
    /// An active turn-based encounter
    Battle,
}

/// Marker component for entities spawned by the overworld context.
/// Used for cleanup when leaving the overworld.
#[derive(Component)]
pub struct OverworldEntity;

/// Marker component for entities spawned by the battle context.
/// Used for cleanup when the battle ends.
#[derive(Component)]
pub struct BattleEntity;
