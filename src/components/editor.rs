use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::components::Component;

/// Plain multi-line text buffer that tracks whether it diverged from the last
/// saved snapshot.
#[derive(Debug, Clone, Default)]
pub struct EditorBuffer {
    title: String,
    text: String,
    saved: String,
}

impl EditorBuffer {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: String::new(),
            saved: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self.saved = self.text.clone();
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.saved
    }

    /// Record the current text as saved.
    pub fn mark_saved(&mut self) {
        self.saved = self.text.clone();
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }
}

impl Component for EditorBuffer {
    fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let border = if focused {
            crate::theme::panel_border_focused()
        } else {
            crate::theme::panel_border()
        };
        let mut title = self.title.clone();
        if self.is_dirty() {
            title.push_str(" [modified]");
        }
        let mut shown = self.text.clone();
        if focused {
            shown.push('_');
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let paragraph = Paragraph::new(shown)
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn handle_event(&mut self, event: &Event) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        if key.kind == KeyEventKind::Release {
            return false;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Enter => self.insert_char('\n'),
            KeyCode::Backspace => self.backspace(),
            _ => return false,
        }
        true
    }
}
