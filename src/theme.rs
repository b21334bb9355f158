use ratatui::style::Color;

// Centralized theme colors.

// Tab bar
pub fn bar_bg() -> Color {
    Color::DarkGray
}
pub fn bar_fg() -> Color {
    Color::White
}
pub fn tab_inactive_fg() -> Color {
    Color::Gray
}
pub fn tab_active_bg() -> Color {
    Color::Gray
}
pub fn tab_active_fg() -> Color {
    Color::Black
}
pub fn dirty_marker() -> Color {
    Color::Yellow
}

// Panel body
pub fn panel_border() -> Color {
    Color::DarkGray
}
pub fn panel_border_focused() -> Color {
    Color::Blue
}

// Dialog / prompt
pub fn dialog_bg() -> Color {
    Color::Black
}
pub fn dialog_fg() -> Color {
    Color::White
}
pub fn dialog_border() -> Color {
    Color::Yellow
}
pub fn button_bg() -> Color {
    Color::DarkGray
}
pub fn button_selected_bg() -> Color {
    Color::Blue
}
pub fn button_selected_fg() -> Color {
    Color::White
}

// Status line
pub fn status_fg() -> Color {
    Color::Gray
}
