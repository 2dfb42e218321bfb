use eframe::egui;

use crate::state::{Action, AppState, format_clock};

pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> Option<Action> {
    let mut action = None;

    ui.heading("Study Sessions");
    ui.label(
        egui::RichText::new(format_clock(state.study_seconds))
            .monospace()
            .size(32.0),
    );
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Topic:");
        ui.text_edit_singleline(&mut state.study_form.topic);
    });
    ui.horizontal(|ui| {
        ui.label("Duration (minutes):");
        ui.add(egui::DragValue::new(&mut state.study_form.duration).range(1..=480));
    });

    if ui.button("Start Group Session").clicked() {
        action = Some(Action::StartStudySession);
    }
    if !state.connection.is_connected() {
        ui.colored_label(
            egui::Color32::YELLOW,
            "Offline: the announcement will not reach the group",
        );
    }
    ui.label(
        egui::RichText::new(format!(
            "{} session(s) announced to the group",
            state.sessions_started
        ))
        .weak(),
    );

    action
}
