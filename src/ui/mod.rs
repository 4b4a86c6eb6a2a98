//! HUD and menus (egui)
//!
//! Thin collaborator layer over the combat core: bars and the battle log
//! are fed by the combatant components and the log resource, the action
//! buttons send [`PlayerCommand`] events, and the overworld panel offers
//! an "approach" shortcut standing in for the out-of-scope movement
//! controller.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::battle::combatant::{Combatant, Side};
use crate::battle::events::PlayerCommand;
use crate::battle::items::Inventory;
use crate::battle::log::BattleLog;
use crate::battle::CommandGate;
use crate::states::GameState;
use crate::world::{FoeProfile, WorldPlayer};

/// Plugin for the egui interface
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, battle_hud.run_if(in_state(GameState::Battle)))
            .add_systems(Update, overworld_panel.run_if(in_state(GameState::Overworld)));
    }
}

fn status_bar(ui: &mut egui::Ui, label: &str, current: f32, max: f32, color: egui::Color32) {
    let fraction = if max > 0.0 { current / max } else { 0.0 };
    ui.label(label);
    ui.add(
        egui::ProgressBar::new(fraction)
            .fill(color)
            .text(format!("{:.0} / {:.0}", current, max)),
    );
}

fn battle_hud(
    mut contexts: EguiContexts,
    combatants: Query<&Combatant>,
    battle_log: Res<BattleLog>,
    gate: Res<CommandGate>,
    inventory: Res<Inventory>,
    mut commands: EventWriter<PlayerCommand>,
) {
    let ctx = contexts.ctx_mut();

    let player = combatants.iter().find(|c| c.side == Side::Player);
    let foe = combatants.iter().find(|c| c.side == Side::Foe);

    egui::TopBottomPanel::top("battle_status").show(ctx, |ui| {
        ui.columns(2, |columns| {
            if let Some(player) = player {
                columns[0].heading(format!("{} (Lv {})", player.name, player.level));
                status_bar(
                    &mut columns[0],
                    "Health",
                    player.current_health,
                    player.max_health,
                    egui::Color32::from_rgb(102, 179, 102),
                );
                status_bar(
                    &mut columns[0],
                    "Focus",
                    player.current_focus,
                    player.max_focus,
                    egui::Color32::from_rgb(102, 128, 204),
                );
                columns[0].label(format!("Next level in {} exp", player.exp_to_next));
            }
            if let Some(foe) = foe {
                columns[1].heading(format!("{} (Lv {})", foe.name, foe.level));
                status_bar(
                    &mut columns[1],
                    "Health",
                    foe.current_health,
                    foe.max_health,
                    egui::Color32::from_rgb(204, 102, 102),
                );
            }
        });
    });

    egui::TopBottomPanel::bottom("battle_actions").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(gate.accepting, egui::Button::new("Attack"))
                .clicked()
            {
                commands.send(PlayerCommand::Attack);
            }
            if ui
                .add_enabled(gate.accepting, egui::Button::new("Special"))
                .clicked()
            {
                commands.send(PlayerCommand::Special);
            }
            if ui
                .add_enabled(gate.accepting, egui::Button::new("Defend"))
                .clicked()
            {
                commands.send(PlayerCommand::Defend);
            }
            ui.separator();
            for (slot, item) in inventory.slots() {
                let label = match item {
                    Some(item) => item.name.as_str(),
                    None => "-",
                };
                let usable = gate.accepting && item.is_some();
                if ui.add_enabled(usable, egui::Button::new(label)).clicked() {
                    commands.send(PlayerCommand::UseItem(slot));
                }
            }
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
            for entry in battle_log.recent(12) {
                ui.label(format!("[{}] {}", entry.turn, entry.message));
            }
        });
    });
}

fn overworld_panel(
    mut contexts: EguiContexts,
    foes: Query<(&Combatant, &FoeProfile, &Transform), Without<WorldPlayer>>,
    mut players: Query<(&Combatant, &mut Transform), With<WorldPlayer>>,
) {
    let ctx = contexts.ctx_mut();

    egui::SidePanel::left("overworld").show(ctx, |ui| {
        ui.heading("Overworld");

        let Ok((player, mut player_transform)) = players.get_single_mut() else {
            ui.label("No player in the world");
            return;
        };

        ui.label(format!(
            "{}: {:.0}/{:.0} hp, level {}",
            player.name, player.current_health, player.max_health, player.level
        ));
        ui.separator();

        if foes.is_empty() {
            ui.label("No foes left standing");
        }
        for (foe, _profile, foe_transform) in foes.iter() {
            ui.horizontal(|ui| {
                ui.label(format!("{} (Lv {})", foe.name, foe.level));
                // Stand-in for walking over: snap next to the foe and let
                // the trigger radius do the rest
                if ui.button("Approach").clicked() {
                    player_transform.translation = foe_transform.translation;
                }
            });
        }
    });
}
