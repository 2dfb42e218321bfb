use eframe::egui;

use crate::state::{Action, AppState, ConnectionStatus, Tab};

pub fn render(ui: &mut egui::Ui, state: &AppState) -> Option<Action> {
    let mut action = None;

    ui.heading("MedStudy Hub");
    ui.label(egui::RichText::new(format!("Room: {}", state.room_id)).weak());
    ui.separator();

    for tab in Tab::ALL {
        if ui.selectable_label(state.tab == tab, tab.label()).clicked() && state.tab != tab {
            action = Some(Action::SelectTab(tab));
        }
    }

    ui.separator();
    ui.horizontal(|ui| {
        ui.colored_label(
            super::parse_hex_color(&state.identity.avatar_color),
            "●",
        );
        ui.label(&state.identity.display_name);
    });

    match &state.connection {
        ConnectionStatus::Connecting => {
            ui.colored_label(egui::Color32::YELLOW, "Connecting...");
        }
        ConnectionStatus::Connected { .. } => {
            ui.colored_label(egui::Color32::GREEN, "Online");
        }
        ConnectionStatus::Disconnected { reason } => {
            ui.colored_label(egui::Color32::RED, "Offline");
            ui.label(egui::RichText::new(reason).weak().small());
        }
    }

    action
}
