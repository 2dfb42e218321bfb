use eframe::egui;

use crate::state::{AppState, format_clock};

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    let stats = state.stats();

    ui.heading(format!("Welcome back, {}", state.identity.display_name));
    ui.separator();

    egui::Grid::new("dashboard_stats")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .striped(true)
        .show(ui, |ui| {
            ui.label("Study time this session");
            ui.label(egui::RichText::new(format_clock(stats.study_seconds)).monospace());
            ui.end_row();

            ui.label("Assignments");
            ui.label(format!("{} ({} completed)", stats.assignments, stats.completed));
            ui.end_row();

            ui.label("Group sessions announced");
            ui.label(stats.sessions_started.to_string());
            ui.end_row();

            ui.label("Chat messages");
            ui.label(stats.messages.to_string());
            ui.end_row();

            ui.label("Undelivered events");
            ui.label(stats.dropped_sends.to_string());
            ui.end_row();
        });

    ui.separator();
    ui.label("Recent messages:");
    for message in state.messages.iter().rev().take(5) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&message.user).strong());
            ui.label(&message.text);
        });
    }
}
