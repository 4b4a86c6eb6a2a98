//! Battle logging
//!
//! Records everything that happens during an encounter for the HUD's
//! scrolling log and for post-battle inspection in tests.

use bevy::prelude::*;

/// A single entry in the battle log
#[derive(Debug, Clone)]
pub struct BattleLogEntry {
    /// Turn number the entry was recorded on (0 = before the first turn)
    pub turn: u32,
    /// The type of event
    pub event_type: BattleLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of battle log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Item used
    ItemUsed,
    /// Combatant died
    Death,
    /// Encounter event (start, outcome, rewards)
    Encounter,
}

/// The battle log resource storing all entries of the current encounter
#[derive(Resource, Default)]
pub struct BattleLog {
    /// All log entries in chronological order
    pub entries: Vec<BattleLogEntry>,
    /// Completed turn counter (a turn is one side's full action)
    pub turn: u32,
}

impl BattleLog {
    /// Clear the log for a new encounter
    pub fn clear(&mut self) {
        self.entries.clear();
        self.turn = 0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: BattleLogEventType, message: String) {
        self.entries.push(BattleLogEntry {
            turn: self.turn,
            event_type,
            message,
        });
    }

    /// Record a damage line in the standard format
    pub fn log_damage(&mut self, attacker: &str, target: &str, amount: f32) {
        let message = format!("{} hits {} for {:.0} damage", attacker, target, amount);
        self.log(BattleLogEventType::Damage, message);
    }

    /// Record a healing line in the standard format
    pub fn log_healing(&mut self, target: &str, amount: f32) {
        let message = format!("{} recovers {:.0} health", target, amount);
        self.log(BattleLogEventType::Healing, message);
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: BattleLogEventType) -> Vec<&BattleLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Total damage recorded against the given target name
    pub fn damage_against(&self, target: &str) -> f32 {
        let needle = format!("hits {} for", target);
        self.entries
            .iter()
            .filter(|e| e.event_type == BattleLogEventType::Damage)
            .filter(|e| e.message.contains(&needle))
            .filter_map(|e| {
                e.message
                    .rsplit_once("for ")
                    .and_then(|(_, rest)| rest.split_whitespace().next())
                    .and_then(|n| n.parse::<f32>().ok())
            })
            .sum()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&BattleLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }
}
