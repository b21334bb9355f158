//! Concrete panels for the terminal host.
//!
//! `EditorPanel` is a text panel that can hold unsaved changes and therefore
//! exposes the save facet; `InfoPanel` is a read-only view and is a plain
//! trackable. Both share a [`FocusHandle`] with the desk that owns them:
//! taking focus writes the panel id into the handle and raises
//! [`LifecycleEvent::Activated`], which is how the navigation guard learns
//! about the switch.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crossterm::event::Event;
use indoc::indoc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::components::{Component, EditorBuffer};
use crate::lifecycle::{LifecycleEvent, LifecycleEvents};
use crate::log_buffer::LogBufferHandle;
use crate::trackable::{SaveError, Saveable, Trackable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub usize);

/// Which panel currently holds keyboard focus.
#[derive(Debug, Clone, Default)]
pub struct FocusHandle(Rc<Cell<Option<PanelId>>>);

impl FocusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<PanelId> {
        self.0.get()
    }

    pub fn set(&self, id: Option<PanelId>) {
        self.0.set(id);
    }

    pub fn is(&self, id: PanelId) -> bool {
        self.get() == Some(id)
    }
}

#[derive(Debug)]
struct PanelChrome {
    id: PanelId,
    visible: Cell<bool>,
    closed: Cell<bool>,
    focus: FocusHandle,
    events: LifecycleEvents,
}

impl PanelChrome {
    fn new(id: PanelId, focus: FocusHandle) -> Self {
        Self {
            id,
            visible: Cell::new(true),
            closed: Cell::new(false),
            focus,
            events: LifecycleEvents::new(),
        }
    }

    fn take_focus(&self) -> bool {
        if self.closed.get() || !self.visible.get() {
            return false;
        }
        self.focus.set(Some(self.id));
        self.events.emit(LifecycleEvent::Activated);
        true
    }

    fn set_visible(&self, visible: bool) {
        if self.closed.get() || self.visible.get() == visible {
            return;
        }
        self.visible.set(visible);
        self.events.emit(LifecycleEvent::VisibilityChanged);
    }

    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.visible.set(false);
        if self.focus.is(self.id) {
            self.focus.set(None);
        }
        self.events.emit(LifecycleEvent::Closed);
    }
}

#[derive(Debug)]
pub struct EditorPanel {
    chrome: PanelChrome,
    buffer: RefCell<EditorBuffer>,
    save_path: Option<PathBuf>,
}

impl EditorPanel {
    /// An editor whose saves stay in memory.
    pub fn new(id: PanelId, title: impl Into<String>, focus: FocusHandle) -> Rc<Self> {
        Rc::new(Self {
            chrome: PanelChrome::new(id, focus),
            buffer: RefCell::new(EditorBuffer::new(title)),
            save_path: None,
        })
    }

    /// An editor backed by `path`. Existing content is loaded; a missing file
    /// starts empty and is created on the first save.
    pub fn open(
        id: PanelId,
        title: impl Into<String>,
        path: impl AsRef<Path>,
        focus: FocusHandle,
    ) -> io::Result<Rc<Self>> {
        let path = path.as_ref().to_path_buf();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err),
        };
        Ok(Rc::new(Self {
            chrome: PanelChrome::new(id, focus),
            buffer: RefCell::new(EditorBuffer::new(title).with_text(text)),
            save_path: Some(path),
        }))
    }

    pub fn id(&self) -> PanelId {
        self.chrome.id
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn text(&self) -> String {
        self.buffer.borrow().text().to_string()
    }

    /// Feed a key event to the text buffer. Returns whether it was consumed.
    pub fn edit(&self, event: &Event) -> bool {
        self.buffer.borrow_mut().handle_event(event)
    }

    pub fn set_visible(&self, visible: bool) {
        self.chrome.set_visible(visible);
    }

    pub fn close(&self) {
        self.chrome.close();
    }

    pub fn is_closed(&self) -> bool {
        self.chrome.closed.get()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        self.buffer.borrow_mut().render(frame, area, focused);
    }
}

impl Trackable for EditorPanel {
    fn label(&self) -> String {
        self.buffer.borrow().title().to_string()
    }

    fn is_visible(&self) -> bool {
        self.chrome.visible.get()
    }

    fn take_focus(&self) -> bool {
        self.chrome.take_focus()
    }

    fn events(&self) -> &LifecycleEvents {
        &self.chrome.events
    }

    fn saveable(&self) -> Option<&dyn Saveable> {
        Some(self)
    }
}

impl Saveable for EditorPanel {
    fn has_unsaved_changes(&self) -> bool {
        self.buffer.borrow().is_dirty()
    }

    fn commit_changes(&self) -> Result<(), SaveError> {
        if let Some(path) = &self.save_path {
            let text = self.text();
            fs::write(path, text).map_err(|err| SaveError::io(self.label(), err))?;
        }
        self.buffer.borrow_mut().mark_saved();
        tracing::info!(label = %self.label(), path = ?self.save_path, "saved panel");
        Ok(())
    }
}

const HELP_TEXT: &str = indoc! {"
    Tab / Shift+Tab   switch panel
    Ctrl+S            save the focused editor
    F2                hide the focused panel
    F3                show hidden panels
    Ctrl+W            close the focused panel
    Ctrl+Q            quit

    Leaving an editor with unsaved changes asks whether to
    save (s/y), discard (d/n) or stay (c/Esc).
"};

/// Read-only panel listing key bindings and recent log output.
#[derive(Debug)]
pub struct InfoPanel {
    chrome: PanelChrome,
    title: String,
    log: Option<LogBufferHandle>,
}

impl InfoPanel {
    pub fn new(
        id: PanelId,
        title: impl Into<String>,
        focus: FocusHandle,
        log: Option<LogBufferHandle>,
    ) -> Rc<Self> {
        Rc::new(Self {
            chrome: PanelChrome::new(id, focus),
            title: title.into(),
            log,
        })
    }

    pub fn id(&self) -> PanelId {
        self.chrome.id
    }

    pub fn set_visible(&self, visible: bool) {
        self.chrome.set_visible(visible);
    }

    pub fn close(&self) {
        self.chrome.close();
    }

    pub fn is_closed(&self) -> bool {
        self.chrome.closed.get()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let mut lines: Vec<Line> = HELP_TEXT.lines().map(Line::raw).collect();
        if let Some(log) = &self.log {
            lines.push(Line::raw(""));
            lines.push(Line::raw("Recent activity:"));
            let room = (area.height as usize).saturating_sub(lines.len() + 2);
            lines.extend(log.tail(room).into_iter().map(Line::raw));
        }
        let border = if focused {
            crate::theme::panel_border_focused()
        } else {
            crate::theme::panel_border()
        };
        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }
}

impl Trackable for InfoPanel {
    fn label(&self) -> String {
        self.title.clone()
    }

    fn is_visible(&self) -> bool {
        self.chrome.visible.get()
    }

    fn take_focus(&self) -> bool {
        self.chrome.take_focus()
    }

    fn events(&self) -> &LifecycleEvents {
        &self.chrome.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn type_text(panel: &EditorPanel, text: &str) {
        for c in text.chars() {
            panel.edit(&Event::Key(KeyEvent::new(
                KeyCode::Char(c),
                KeyModifiers::NONE,
            )));
        }
    }

    #[test]
    fn take_focus_updates_handle_and_emits_activation() {
        let focus = FocusHandle::new();
        let panel = EditorPanel::new(PanelId(3), "Report", focus.clone());
        let seen = Rc::new(Cell::new(0));
        let hits = seen.clone();
        panel.events().subscribe(move |ev| {
            if ev == LifecycleEvent::Activated {
                hits.set(hits.get() + 1);
            }
        });
        assert!(panel.take_focus());
        assert_eq!(focus.get(), Some(PanelId(3)));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn hidden_or_closed_panels_refuse_focus() {
        let focus = FocusHandle::new();
        let panel = InfoPanel::new(PanelId(1), "Help", focus.clone(), None);
        panel.set_visible(false);
        assert!(!panel.take_focus());
        panel.set_visible(true);
        panel.close();
        assert!(!panel.take_focus());
        assert!(panel.is_closed());
        assert!(!panel.is_visible());
        assert_eq!(focus.get(), None);
    }

    #[test]
    fn visibility_events_only_fire_on_change() {
        let panel = InfoPanel::new(PanelId(1), "Help", FocusHandle::new(), None);
        let count = Rc::new(Cell::new(0));
        let hits = count.clone();
        panel.events().subscribe(move |_| hits.set(hits.get() + 1));
        panel.set_visible(true);
        panel.set_visible(false);
        panel.set_visible(false);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn in_memory_commit_clears_dirty_flag() {
        let panel = EditorPanel::new(PanelId(0), "Scratch", FocusHandle::new());
        type_text(&panel, "hi");
        assert!(panel.has_unsaved_changes());
        panel.commit_changes().unwrap();
        assert!(!panel.has_unsaved_changes());
    }

    #[test]
    fn file_backed_editor_loads_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        fs::write(&path, "draft").unwrap();
        let panel = EditorPanel::open(PanelId(0), "Report", &path, FocusHandle::new()).unwrap();
        assert_eq!(panel.text(), "draft");
        assert!(!panel.has_unsaved_changes());
        type_text(&panel, "!");
        panel.commit_changes().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "draft!");
        assert!(!panel.has_unsaved_changes());
    }

    #[test]
    fn failed_write_keeps_changes_unsaved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let panel = EditorPanel::open(PanelId(0), "Report", &path, FocusHandle::new()).unwrap();
        type_text(&panel, "x");
        let err = panel.commit_changes().unwrap_err();
        assert!(matches!(err, SaveError::Io { .. }));
        assert!(panel.has_unsaved_changes());
    }
}
