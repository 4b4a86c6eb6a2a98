//! Battle state machine
//!
//! Three independent pieces of pure state: the battle-wide phase and one
//! action tag per side. Phase changes go through an explicit transition
//! table; illegal transitions are rejected rather than silently accepted.
//! Terminal phases are written through [`BattleState::finish`], which
//! latches once and absorbs duplicate terminal signals.

use bevy::prelude::*;
use thiserror::Error;

use super::combatant::Side;

/// The battle-wide phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BattlePhase {
    /// No battle running
    #[default]
    Idle,
    /// Intro pacing before the first turn
    Opening,
    /// Waiting for / resolving a player action
    PlayerTurn,
    /// The foe's scripted turn
    FoeTurn,
    /// Terminal: the foe was defeated
    Victory,
    /// Terminal: the player was defeated
    Defeat,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat)
    }
}

/// Per-side in-turn action tag. Reset to `Idle` at the end of each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    UsingItem,
    Attacking,
    Defending,
    /// Flinching from a hit
    Hurt,
}

/// Events that drive phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    BattleStarted,
    OpeningDone,
    PlayerActed,
    FoeActed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("illegal phase transition: {event:?} while in {from:?}")]
    IllegalTransition { from: BattlePhase, event: PhaseEvent },
}

/// Holder for the phase and both action states.
#[derive(Resource, Debug, Default)]
pub struct BattleState {
    phase: BattlePhase,
    player_action: ActionState,
    foe_action: ActionState,
}

impl BattleState {
    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn player_action(&self) -> ActionState {
        self.player_action
    }

    pub fn foe_action(&self) -> ActionState {
        self.foe_action
    }

    pub fn action(&self, side: Side) -> ActionState {
        match side {
            Side::Player => self.player_action,
            Side::Foe => self.foe_action,
        }
    }

    pub fn set_player_action(&mut self, action: ActionState) {
        self.player_action = action;
    }

    pub fn set_foe_action(&mut self, action: ActionState) {
        self.foe_action = action;
    }

    pub fn set_action(&mut self, side: Side, action: ActionState) {
        match side {
            Side::Player => self.player_action = action,
            Side::Foe => self.foe_action = action,
        }
    }

    /// Advance the phase machine. Only the pairs in the transition table
    /// are legal; anything else is an error the caller must handle.
    pub fn advance(&mut self, event: PhaseEvent) -> Result<BattlePhase, PhaseError> {
        use BattlePhase::*;
        use PhaseEvent::*;

        let next = match (self.phase, event) {
            (Idle, BattleStarted) => Opening,
            (Opening, OpeningDone) => PlayerTurn,
            (PlayerTurn, PlayerActed) => FoeTurn,
            (FoeTurn, FoeActed) => PlayerTurn,
            (from, event) => return Err(PhaseError::IllegalTransition { from, event }),
        };
        self.phase = next;
        Ok(next)
    }

    /// Latch a terminal phase. Returns true only the first time; a second
    /// terminal write (poll check and death event racing each other) is
    /// absorbed as a no-op.
    pub fn finish(&mut self, outcome: BattlePhase) -> bool {
        debug_assert!(outcome.is_terminal(), "finish() takes Victory or Defeat");
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = outcome;
        true
    }

    /// Reset everything for a fresh battle.
    pub fn reset(&mut self) {
        self.phase = BattlePhase::Idle;
        self.player_action = ActionState::Idle;
        self.foe_action = ActionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        let mut state = BattleState::default();
        assert_eq!(state.advance(PhaseEvent::BattleStarted), Ok(BattlePhase::Opening));
        assert_eq!(state.advance(PhaseEvent::OpeningDone), Ok(BattlePhase::PlayerTurn));
        assert_eq!(state.advance(PhaseEvent::PlayerActed), Ok(BattlePhase::FoeTurn));
        assert_eq!(state.advance(PhaseEvent::FoeActed), Ok(BattlePhase::PlayerTurn));
        assert_eq!(state.advance(PhaseEvent::PlayerActed), Ok(BattlePhase::FoeTurn));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut state = BattleState::default();
        assert_eq!(
            state.advance(PhaseEvent::PlayerActed),
            Err(PhaseError::IllegalTransition {
                from: BattlePhase::Idle,
                event: PhaseEvent::PlayerActed,
            })
        );
        // A rejected transition leaves the phase untouched
        assert_eq!(state.phase(), BattlePhase::Idle);

        state.advance(PhaseEvent::BattleStarted).unwrap();
        assert!(state.advance(PhaseEvent::FoeActed).is_err());
        assert_eq!(state.phase(), BattlePhase::Opening);
    }

    #[test]
    fn terminal_phase_latches_once() {
        let mut state = BattleState::default();
        state.advance(PhaseEvent::BattleStarted).unwrap();
        state.advance(PhaseEvent::OpeningDone).unwrap();

        assert!(state.finish(BattlePhase::Victory));
        assert_eq!(state.phase(), BattlePhase::Victory);

        // Duplicate terminal signals are absorbed, even conflicting ones
        assert!(!state.finish(BattlePhase::Victory));
        assert!(!state.finish(BattlePhase::Defeat));
        assert_eq!(state.phase(), BattlePhase::Victory);
    }

    #[test]
    fn no_events_leave_a_terminal_phase() {
        let mut state = BattleState::default();
        state.advance(PhaseEvent::BattleStarted).unwrap();
        state.advance(PhaseEvent::OpeningDone).unwrap();
        state.finish(BattlePhase::Defeat);

        for event in [
            PhaseEvent::BattleStarted,
            PhaseEvent::OpeningDone,
            PhaseEvent::PlayerActed,
            PhaseEvent::FoeActed,
        ] {
            assert!(state.advance(event).is_err());
            assert_eq!(state.phase(), BattlePhase::Defeat);
        }
    }

    #[test]
    fn action_states_are_independent_per_side() {
        let mut state = BattleState::default();
        state.set_action(Side::Player, ActionState::Attacking);
        assert_eq!(state.player_action(), ActionState::Attacking);
        assert_eq!(state.foe_action(), ActionState::Idle);

        state.set_action(Side::Foe, ActionState::Hurt);
        assert_eq!(state.action(Side::Foe), ActionState::Hurt);
        assert_eq!(state.action(Side::Player), ActionState::Attacking);
    }
}
