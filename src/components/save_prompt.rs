use crossterm::event::{Event, KeyEventKind, MouseEventKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::components::Component;
use crate::exit_request::{ExitRequest, PromptChoice};
use crate::keybindings::{Action, KeyBindings};
use crate::ui::{centered_rect, rect_contains};

const DIALOG_WIDTH: u16 = 60;
const DIALOG_HEIGHT: u16 = 8;

/// Result of one input event delivered to an open prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    Choose(PromptChoice),
    /// Closed without picking a button (click outside the dialog).
    Dismiss,
}

impl PromptAction {
    pub fn choice(self) -> Option<PromptChoice> {
        match self {
            PromptAction::Choose(choice) => Some(choice),
            PromptAction::Dismiss => None,
        }
    }
}

/// Modal three-button dialog asking whether to save a panel before leaving it.
#[derive(Debug)]
pub struct SavePromptComponent {
    visible: bool,
    title: String,
    body: String,
    selected: usize,
    dialog_rect: Option<Rect>,
    button_rects: Vec<(PromptChoice, Rect)>,
    pending: Option<PromptAction>,
    keys: KeyBindings,
}

impl Default for SavePromptComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl SavePromptComponent {
    pub fn new() -> Self {
        Self {
            visible: false,
            title: String::new(),
            body: String::new(),
            selected: 0,
            dialog_rect: None,
            button_rects: Vec::new(),
            pending: None,
            keys: KeyBindings::default(),
        }
    }

    pub fn open(&mut self, request: &ExitRequest) {
        self.title = request.title();
        self.body = request.body();
        self.visible = true;
        self.selected = 0;
        self.pending = None;
        self.dialog_rect = None;
        self.button_rects.clear();
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.dialog_rect = None;
        self.button_rects.clear();
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn selected(&self) -> PromptChoice {
        PromptChoice::ALL[self.selected]
    }

    /// The action produced by the last consumed event, if any.
    pub fn take_action(&mut self) -> Option<PromptAction> {
        self.pending.take()
    }

    fn step_selection(&mut self, forward: bool) {
        let len = PromptChoice::ALL.len();
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    pub fn handle_prompt_event(&mut self, event: &Event) -> Option<PromptAction> {
        match event {
            Event::Mouse(mouse) if matches!(mouse.kind, MouseEventKind::Down(_)) => {
                if let Some((choice, _)) = self
                    .button_rects
                    .iter()
                    .find(|(_, rect)| rect_contains(*rect, mouse.column, mouse.row))
                {
                    return Some(PromptAction::Choose(*choice));
                }
                match self.dialog_rect {
                    Some(rect) if !rect_contains(rect, mouse.column, mouse.row) => {
                        Some(PromptAction::Dismiss)
                    }
                    _ => None,
                }
            }
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                let kb = &self.keys;
                if kb.matches(Action::PromptSave, key) {
                    Some(PromptAction::Choose(PromptChoice::Save))
                } else if kb.matches(Action::PromptDiscard, key) {
                    Some(PromptAction::Choose(PromptChoice::Discard))
                } else if kb.matches(Action::PromptCancel, key) {
                    Some(PromptAction::Choose(PromptChoice::Cancel))
                } else if kb.matches(Action::PromptAccept, key) {
                    Some(PromptAction::Choose(self.selected()))
                } else if kb.matches(Action::PromptNext, key) {
                    self.step_selection(true);
                    None
                } else if kb.matches(Action::PromptPrev, key) {
                    self.step_selection(false);
                    None
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl Component for SavePromptComponent {
    fn render(&mut self, frame: &mut Frame, area: Rect, _focused: bool) {
        if !self.visible || area.width == 0 || area.height == 0 {
            return;
        }
        let buffer = frame.buffer_mut();
        let bounds = area.intersection(buffer.area);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        for y in bounds.y..bounds.y.saturating_add(bounds.height) {
            for x in bounds.x..bounds.x.saturating_add(bounds.width) {
                if let Some(cell) = buffer.cell_mut((x, y)) {
                    cell.set_style(dim_style);
                }
            }
        }
        let rect = centered_rect(area, DIALOG_WIDTH, DIALOG_HEIGHT);
        self.dialog_rect = Some(rect);
        self.button_rects.clear();
        frame.render_widget(Clear, rect);
        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(crate::theme::dialog_border()))
            .style(
                Style::default()
                    .bg(crate::theme::dialog_bg())
                    .fg(crate::theme::dialog_fg()),
            );
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        if inner.width < 2 || inner.height < 2 {
            return;
        }
        let body_rect = Rect {
            x: inner.x.saturating_add(1),
            width: inner.width.saturating_sub(2),
            height: inner.height.saturating_sub(2),
            ..inner
        };
        let paragraph = Paragraph::new(self.body.as_str())
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, body_rect);

        let button_y = inner.y.saturating_add(inner.height.saturating_sub(1));
        let labels: Vec<(PromptChoice, String)> = PromptChoice::ALL
            .iter()
            .map(|choice| (*choice, format!("[ {} ]", choice.button_label())))
            .collect();
        let total: u16 = labels
            .iter()
            .map(|(_, label)| label.chars().count() as u16 + 1)
            .sum::<u16>()
            .saturating_sub(1);
        let mut x = inner
            .x
            .saturating_add(inner.width.saturating_sub(total.saturating_add(1)));
        let max_x = inner.x.saturating_add(inner.width);
        for (idx, (choice, label)) in labels.iter().enumerate() {
            let width = label.chars().count() as u16;
            if x.saturating_add(width) > max_x {
                break;
            }
            let style = if idx == self.selected {
                Style::default()
                    .bg(crate::theme::button_selected_bg())
                    .fg(crate::theme::button_selected_fg())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .bg(crate::theme::button_bg())
                    .fg(crate::theme::dialog_fg())
            };
            let button = Rect {
                x,
                y: button_y,
                width,
                height: 1,
            };
            frame.buffer_mut().set_string(x, button_y, label, style);
            self.button_rects.push((*choice, button));
            x = x.saturating_add(width + 1);
        }
    }

    /// An open prompt is modal: it consumes every event.
    fn handle_event(&mut self, event: &Event) -> bool {
        if !self.visible {
            return false;
        }
        if let Some(action) = self.handle_prompt_event(event) {
            self.pending = Some(action);
        }
        true
    }
}
