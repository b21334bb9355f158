//! Small layout helpers shared by the components.

use ratatui::layout::Rect;

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let max_x = rect.x.saturating_add(rect.width);
    let max_y = rect.y.saturating_add(rect.height);
    column >= rect.x && column < max_x && row >= rect.y && row < max_y
}

/// Center a `width` x `height` box inside `area`, shrinking it to fit.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = area.width.min(width).max(1);
    let height = area.height.min(height).max(1);
    Rect {
        x: area.x.saturating_add(area.width.saturating_sub(width) / 2),
        y: area.y.saturating_add(area.height.saturating_sub(height) / 2),
        width,
        height,
    }
}

pub fn truncate_to_width(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    value.chars().take(width).collect()
}

/// Split `area` into a one-row top bar, the body, and a one-row status line.
pub fn split_chrome(area: Rect) -> (Rect, Rect, Rect) {
    let top_h = 1u16.min(area.height);
    let bottom_h = 1u16.min(area.height.saturating_sub(top_h));
    let top = Rect {
        height: top_h,
        ..area
    };
    let bottom = Rect {
        y: area.y.saturating_add(area.height).saturating_sub(bottom_h),
        height: bottom_h,
        ..area
    };
    let body = Rect {
        y: area.y.saturating_add(top_h),
        height: area.height.saturating_sub(top_h).saturating_sub(bottom_h),
        ..area
    };
    (top, body, bottom)
}
