//! Inventory collaborator
//!
//! The battle core only needs "get item at slot / remove item at slot";
//! this module provides that surface over a RON-defined item table. Item
//! effects are resolved by their effect tag: restorative items heal the
//! player, harmful items damage the foe.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// What an item does when used in battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restore the user's health (clamped to max)
    Restore,
    /// Damage the foe
    Harm,
}

/// One usable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    pub effect: ItemEffect,
    pub potency: f32,
}

#[derive(Debug, Deserialize)]
struct ItemTable {
    items: Vec<ItemDef>,
}

/// Built-in starting items. A real campaign would feed this from the
/// save-data store; the table format is the same either way.
const DEFAULT_ITEMS: &str = r#"(
    items: [
        (name: "Meadow Tonic", effect: Restore, potency: 50.0),
        (name: "Thorn Flask", effect: Harm, potency: 25.0),
        (name: "Meadow Tonic", effect: Restore, potency: 50.0),
    ],
)"#;

/// The player's item slots. Using an item consumes it; empty slots stay
/// in place so slot indices remain stable for the HUD.
#[derive(Resource, Debug, Clone)]
pub struct Inventory {
    slots: Vec<Option<ItemDef>>,
}

impl Default for Inventory {
    fn default() -> Self {
        let table: ItemTable =
            ron::from_str(DEFAULT_ITEMS).expect("built-in item table must parse");
        Self {
            slots: table.items.into_iter().map(Some).collect(),
        }
    }
}

impl Inventory {
    pub fn from_items(items: Vec<ItemDef>) -> Self {
        Self {
            slots: items.into_iter().map(Some).collect(),
        }
    }

    /// Parse an inventory from a RON item table.
    pub fn from_ron(source: &str) -> Result<Self, String> {
        let table: ItemTable =
            ron::from_str(source).map_err(|e| format!("Failed to parse item table: {}", e))?;
        Ok(Self::from_items(table.items))
    }

    pub fn get(&self, slot: usize) -> Option<&ItemDef> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    /// Take the item out of a slot, leaving the slot empty.
    pub fn remove(&mut self, slot: usize) -> Option<ItemDef> {
        self.slots.get_mut(slot).and_then(|s| s.take())
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<&ItemDef>)> {
        self.slots.iter().enumerate().map(|(i, s)| (i, s.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_parses() {
        let inventory = Inventory::default();
        assert_eq!(inventory.slot_count(), 3);
        assert_eq!(inventory.get(0).unwrap().effect, ItemEffect::Restore);
        assert_eq!(inventory.get(1).unwrap().effect, ItemEffect::Harm);
    }

    #[test]
    fn remove_empties_the_slot_but_keeps_indices() {
        let mut inventory = Inventory::default();
        let taken = inventory.remove(0).unwrap();
        assert_eq!(taken.name, "Meadow Tonic");
        assert!(inventory.get(0).is_none());
        // Slot 1 is still slot 1
        assert_eq!(inventory.get(1).unwrap().name, "Thorn Flask");
        // Removing again is a None, not a panic
        assert!(inventory.remove(0).is_none());
        assert!(inventory.remove(99).is_none());
    }

    #[test]
    fn bad_ron_is_an_error_not_a_panic() {
        assert!(Inventory::from_ron("(items: [").is_err());
    }
}
