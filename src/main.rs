//! Thornvale - Turn-Based Encounter Core
//!
//! A 2D exploration RPG prototype focused on its turn-based combat core:
//! walk up to a foe in the overworld, fight it out turn by turn, and carry
//! the result back into the persistent world state.

use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use thornvale::battle::BattlePlugin;
use thornvale::handoff::HandoffPlugin;
use thornvale::states::GameState;
use thornvale::ui::UiPlugin;
use thornvale::world::WorldPlugin;
use thornvale::{cli, headless};

fn main() {
    let args = cli::parse_args();

    if let Some(config_path) = args.headless {
        // Headless mode: run a scripted encounter without a window
        match headless::HeadlessEncounterConfig::load_from_file(&config_path) {
            Ok(mut config) => {
                if let Some(seed) = args.seed {
                    config.random_seed = Some(seed);
                }
                if let Some(max_turns) = args.max_turns {
                    config.max_turns = max_turns;
                }
                if let Err(e) = headless::run_headless_encounter(config) {
                    eprintln!("Headless encounter failed: {}", e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    App::new()
        // Bevy default plugins with custom window settings
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Thornvale".to_string(),
                resolution: (960.0, 540.0).into(),
                resizable: true,
                ..default()
            }),
            ..default()
        }))
        // Our game plugins
        .add_plugins((EguiPlugin, WorldPlugin, HandoffPlugin, BattlePlugin, UiPlugin))
        // Start in the overworld
        .init_state::<GameState>()
        .run();
}
