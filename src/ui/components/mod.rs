pub mod assignments;
pub mod chat_area;
pub mod dashboard;
pub mod input_bar;
pub mod sidebar;
pub mod study_session;

use eframe::egui::Color32;

/// `#RRGGBB` to a color; anything else falls back to gray.
pub fn parse_hex_color(raw: &str) -> Color32 {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Color32::GRAY;
    }
    match u32::from_str_radix(hex, 16) {
        Ok(rgb) => Color32::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8),
        Err(_) => Color32::GRAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_avatar_colors() {
        assert_eq!(parse_hex_color("#E91E63"), Color32::from_rgb(0xE9, 0x1E, 0x63));
        assert_eq!(parse_hex_color("29b6f6"), Color32::from_rgb(0x29, 0xB6, 0xF6));
        assert_eq!(parse_hex_color(""), Color32::GRAY);
        assert_eq!(parse_hex_color("#GGGGGG"), Color32::GRAY);
    }
}
