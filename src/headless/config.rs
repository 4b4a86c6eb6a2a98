//! JSON scenario parsing for headless mode
//!
//! Parses JSON encounter scenarios and converts them into the game's
//! world record and a scripted command list.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::battle::events::PlayerCommand;
use crate::world::{FoeRecord, PlayerRecord, WorldRecord};
use bevy::math::Vec2;

/// Player stats for a headless scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpec {
    #[serde(default = "default_player_name")]
    pub name: String,
    pub health: f32,
    /// Defaults to `health`
    #[serde(default)]
    pub max_health: Option<f32>,
    #[serde(default = "default_focus")]
    pub focus: f32,
    #[serde(default = "default_attack")]
    pub attack_power: f32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_exp")]
    pub exp_to_next: u32,
}

/// Foe stats for a headless scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoeSpec {
    #[serde(default = "default_foe_name")]
    pub name: String,
    pub health: f32,
    #[serde(default = "default_foe_attack")]
    pub attack_power: f32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_exp_reward")]
    pub exp_reward: u32,
    #[serde(default)]
    pub loot: Option<String>,
    #[serde(default)]
    pub drop_chance: f32,
}

/// Headless encounter scenario loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessEncounterConfig {
    pub player: PlayerSpec,
    pub foe: FoeSpec,
    /// Player commands, cycled until the encounter ends.
    /// Valid entries: "Attack", "Special", "Defend", "Item:<slot>"
    #[serde(default = "default_script")]
    pub script: Vec<String>,
    /// Random seed for deterministic loot rolls
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Abort and report a timeout after this many completed turns
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

fn default_player_name() -> String {
    "Rowan".to_string()
}

fn default_foe_name() -> String {
    "Foe".to_string()
}

fn default_focus() -> f32 {
    30.0
}

fn default_attack() -> f32 {
    30.0
}

fn default_foe_attack() -> f32 {
    20.0
}

fn default_level() -> u32 {
    1
}

fn default_exp() -> u32 {
    100
}

fn default_exp_reward() -> u32 {
    35
}

fn default_script() -> Vec<String> {
    vec!["Attack".to_string()]
}

fn default_max_turns() -> u32 {
    200
}

impl HeadlessEncounterConfig {
    /// Load a scenario from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scenario file: {}", e))?;

        let config: HeadlessEncounterConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the scenario
    pub fn validate(&self) -> Result<(), String> {
        if self.player.health <= 0.0 {
            return Err("player health must be positive".to_string());
        }
        if self.foe.health <= 0.0 {
            return Err("foe health must be positive".to_string());
        }
        if let Some(max) = self.player.max_health {
            if max < self.player.health {
                return Err("player max_health must be >= health".to_string());
            }
        }
        if !(0.0..=1.0).contains(&self.foe.drop_chance) {
            return Err("drop_chance must be in [0, 1]".to_string());
        }
        if self.script.is_empty() {
            return Err("script must have at least one command".to_string());
        }
        for entry in &self.script {
            Self::parse_command(entry)?;
        }
        if self.max_turns == 0 {
            return Err("max_turns must be positive".to_string());
        }
        Ok(())
    }

    /// Parse one script entry into a command
    pub fn parse_command(entry: &str) -> Result<PlayerCommand, String> {
        match entry {
            "Attack" => Ok(PlayerCommand::Attack),
            "Special" => Ok(PlayerCommand::Special),
            "Defend" => Ok(PlayerCommand::Defend),
            other => {
                if let Some(slot) = other.strip_prefix("Item:") {
                    let slot = slot
                        .parse::<usize>()
                        .map_err(|_| format!("Bad item slot in '{}'", other))?;
                    Ok(PlayerCommand::UseItem(slot))
                } else {
                    Err(format!(
                        "Unknown command: '{}'. Valid commands: Attack, Special, Defend, Item:<slot>",
                        other
                    ))
                }
            }
        }
    }

    /// Parsed command script
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.script
            .iter()
            .filter_map(|s| Self::parse_command(s).ok())
            .collect()
    }

    /// Convert to the persistent world record the overworld spawns from.
    /// Player and foe start adjacent so the encounter triggers on the
    /// first frame.
    pub fn to_world_record(&self) -> WorldRecord {
        WorldRecord {
            player: PlayerRecord {
                name: self.player.name.clone(),
                health: self.player.health,
                max_health: self.player.max_health.unwrap_or(self.player.health),
                focus: self.player.focus,
                max_focus: self.player.focus,
                attack_power: self.player.attack_power,
                level: self.player.level,
                exp_to_next: self.player.exp_to_next,
                portrait: String::new(),
                position: Vec2::ZERO,
            },
            foes: vec![FoeRecord {
                name: self.foe.name.clone(),
                max_health: self.foe.health,
                attack_power: self.foe.attack_power,
                level: self.foe.level,
                portrait: String::new(),
                exp_reward: self.foe.exp_reward,
                loot: self.foe.loot.clone(),
                drop_chance: self.foe.drop_chance,
                position: Vec2::new(10.0, 0.0),
                defeated: false,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> HeadlessEncounterConfig {
        serde_json::from_str(
            r#"{
                "player": { "health": 500 },
                "foe": { "health": 50 }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn defaults_fill_in() {
        let config = base_config();
        assert_eq!(config.player.attack_power, 30.0);
        assert_eq!(config.foe.attack_power, 20.0);
        assert_eq!(config.script, vec!["Attack".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn commands_parse() {
        assert_eq!(
            HeadlessEncounterConfig::parse_command("Item:2"),
            Ok(PlayerCommand::UseItem(2))
        );
        assert!(HeadlessEncounterConfig::parse_command("Flee").is_err());
        assert!(HeadlessEncounterConfig::parse_command("Item:x").is_err());
    }

    #[test]
    fn validation_rejects_bad_scenarios() {
        let mut config = base_config();
        config.foe.drop_chance = 1.5;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.script = vec!["Flee".to_string()];
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.max_turns = 0;
        assert!(config.validate().is_err());
    }
}
