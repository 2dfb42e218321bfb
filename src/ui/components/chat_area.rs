use eframe::egui;

use crate::common::ChatMessage;

use super::parse_hex_color;

pub fn render(ui: &mut egui::Ui, messages: &[ChatMessage]) {
    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .max_height(ui.available_height() - 40.0)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet. Say hello to the group!").weak());
            }
            for message in messages {
                ui.horizontal_wrapped(|ui| {
                    ui.colored_label(
                        parse_hex_color(&message.avatar_color),
                        egui::RichText::new(&message.user).strong(),
                    );
                    ui.label(egui::RichText::new(&message.timestamp).weak().small());
                });
                ui.label(&message.text);
                ui.add_space(4.0);
            }
        });
}
