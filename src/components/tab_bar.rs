use crossterm::event::{Event, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

use crate::components::Component;
use crate::ui::{rect_contains, truncate_to_width};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLabel<K> {
    pub key: K,
    pub text: String,
    pub dirty: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy)]
struct TabHit<K> {
    key: K,
    rect: Rect,
}

/// One-row strip listing the open panels; clicking a tab selects it.
#[derive(Debug)]
pub struct TabBar<K: Copy + Eq> {
    tabs: Vec<TabLabel<K>>,
    hits: Vec<TabHit<K>>,
    clicked: Option<K>,
}

impl<K: Copy + Eq> Default for TabBar<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq> TabBar<K> {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            hits: Vec::new(),
            clicked: None,
        }
    }

    pub fn set_tabs(&mut self, tabs: Vec<TabLabel<K>>) {
        self.tabs = tabs;
    }

    pub fn hit_test(&self, column: u16, row: u16) -> Option<K> {
        self.hits
            .iter()
            .find(|hit| rect_contains(hit.rect, column, row))
            .map(|hit| hit.key)
    }

    /// The tab selected by the last consumed click, if any.
    pub fn take_clicked(&mut self) -> Option<K> {
        self.clicked.take()
    }
}

impl<K: Copy + Eq> Component for TabBar<K> {
    fn render(&mut self, frame: &mut Frame, area: Rect, _focused: bool) {
        self.hits.clear();
        if area.width == 0 || area.height == 0 {
            return;
        }
        let buffer = frame.buffer_mut();
        let bounds = area.intersection(buffer.area);
        if bounds.width == 0 || bounds.height == 0 {
            return;
        }
        let bar_style = Style::default()
            .bg(crate::theme::bar_bg())
            .fg(crate::theme::bar_fg());
        buffer.set_style(bounds, bar_style);
        let mut x = bounds.x;
        let y = bounds.y;
        let max_x = bounds.x.saturating_add(bounds.width);
        for tab in &self.tabs {
            let marker = if tab.dirty { "*" } else { "" };
            let max_label = max_x.saturating_sub(x).saturating_sub(3) as usize;
            let label = truncate_to_width(&tab.text, max_label);
            let chunk = format!(" {label}{marker} ");
            let chunk_width = chunk.chars().count() as u16;
            if chunk_width == 0 || x.saturating_add(chunk_width) > max_x {
                break;
            }
            let mut style = if tab.active {
                Style::default()
                    .bg(crate::theme::tab_active_bg())
                    .fg(crate::theme::tab_active_fg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .bg(crate::theme::bar_bg())
                    .fg(crate::theme::tab_inactive_fg())
            };
            if tab.dirty && !tab.active {
                style = style.fg(crate::theme::dirty_marker());
            }
            buffer.set_string(x, y, &chunk, style);
            self.hits.push(TabHit {
                key: tab.key,
                rect: Rect {
                    x,
                    y,
                    width: chunk_width,
                    height: 1,
                },
            });
            x = x.saturating_add(chunk_width);
        }
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        let Event::Mouse(mouse) = event else {
            return false;
        };
        if !matches!(mouse.kind, MouseEventKind::Down(_)) {
            return false;
        }
        match self.hit_test(mouse.column, mouse.row) {
            Some(key) => {
                self.clicked = Some(key);
                true
            }
            None => false,
        }
    }
}
