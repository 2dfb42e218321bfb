use eframe::egui;

use crate::state::{Action, AppState};

use super::parse_hex_color;

pub fn render(ui: &mut egui::Ui, state: &mut AppState) -> Option<Action> {
    let mut action = None;

    ui.heading("Assignments");
    egui::Grid::new("assignment_draft")
        .num_columns(2)
        .show(ui, |ui| {
            ui.label("Title");
            ui.text_edit_singleline(&mut state.draft.title);
            ui.end_row();

            ui.label("Description");
            ui.text_edit_multiline(&mut state.draft.description);
            ui.end_row();

            ui.label("Due date");
            ui.add(egui::TextEdit::singleline(&mut state.draft.due_date).hint_text("YYYY-MM-DD"));
            ui.end_row();
        });

    ui.horizontal(|ui| {
        if ui.button("Add Assignment").clicked() {
            action = Some(Action::AddAssignment);
        }
        if ui
            .add_enabled(!state.draft.is_empty(), egui::Button::new("Clear"))
            .clicked()
        {
            action = Some(Action::ClearDraft);
        }
    });
    ui.separator();

    if state.assignments.is_empty() {
        ui.label(egui::RichText::new("No assignments shared yet").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (index, assignment) in state.assignments.iter().enumerate() {
            ui.horizontal(|ui| {
                let mut done = assignment.completed;
                if ui.checkbox(&mut done, "").changed() {
                    action = Some(Action::ToggleAssignment(index));
                }

                let title = egui::RichText::new(&assignment.title).strong();
                let title = if assignment.completed {
                    title.strikethrough()
                } else {
                    title
                };
                ui.colored_label(parse_hex_color(&assignment.color), title);

                if let Some(due) = assignment.due_date {
                    ui.label(egui::RichText::new(format!("due {due}")).weak());
                }
                ui.label(
                    egui::RichText::new(format!("by {}", assignment.submitted_by))
                        .weak()
                        .small(),
                );
            });
            if !assignment.description.is_empty() {
                ui.label(&assignment.description);
            }
        }
    });

    action
}
