//! The demo host: a row of panels behind a tab bar, with one panel shown at a
//! time and a status line underneath.
//!
//! The desk owns the panels and decides which one to focus next, but it never
//! talks to the navigation guard about transitions. It only registers panels
//! and asks them to take focus; the guard hears about every switch through the
//! panels' lifecycle events and may put focus back where it was.

use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{Event, KeyEvent, KeyEventKind};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::components::{Component, TabBar, TabLabel};
use crate::event_loop::ControlFlow;
use crate::guard::NavigationGuard;
use crate::keybindings::{Action, KeyBindings};
use crate::log_buffer::LogBufferHandle;
use crate::panels::{EditorPanel, FocusHandle, InfoPanel, PanelId};
use crate::trackable::{Saveable, Trackable, TrackableRef};
use crate::ui::{split_chrome, truncate_to_width};

#[derive(Debug, Clone)]
pub enum DeskPanel {
    Editor(Rc<EditorPanel>),
    Info(Rc<InfoPanel>),
}

impl DeskPanel {
    pub fn id(&self) -> PanelId {
        match self {
            DeskPanel::Editor(p) => p.id(),
            DeskPanel::Info(p) => p.id(),
        }
    }

    pub fn trackable(&self) -> TrackableRef {
        match self {
            DeskPanel::Editor(p) => TrackableRef::new(p.clone()),
            DeskPanel::Info(p) => TrackableRef::new(p.clone()),
        }
    }

    fn as_trackable(&self) -> &dyn Trackable {
        match self {
            DeskPanel::Editor(p) => p.as_ref(),
            DeskPanel::Info(p) => p.as_ref(),
        }
    }

    pub fn label(&self) -> String {
        self.as_trackable().label()
    }

    pub fn is_visible(&self) -> bool {
        self.as_trackable().is_visible()
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            DeskPanel::Editor(p) => p.has_unsaved_changes(),
            DeskPanel::Info(_) => false,
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            DeskPanel::Editor(p) => p.is_closed(),
            DeskPanel::Info(p) => p.is_closed(),
        }
    }

    fn set_visible(&self, visible: bool) {
        match self {
            DeskPanel::Editor(p) => p.set_visible(visible),
            DeskPanel::Info(p) => p.set_visible(visible),
        }
    }

    fn close(&self) {
        match self {
            DeskPanel::Editor(p) => p.close(),
            DeskPanel::Info(p) => p.close(),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        match self {
            DeskPanel::Editor(p) => p.render(frame, area, focused),
            DeskPanel::Info(p) => p.render(frame, area, focused),
        }
    }
}

impl From<Rc<EditorPanel>> for DeskPanel {
    fn from(panel: Rc<EditorPanel>) -> Self {
        DeskPanel::Editor(panel)
    }
}

impl From<Rc<InfoPanel>> for DeskPanel {
    fn from(panel: Rc<InfoPanel>) -> Self {
        DeskPanel::Info(panel)
    }
}

#[derive(Debug)]
pub struct Desk {
    guard: Rc<NavigationGuard>,
    focus: FocusHandle,
    panels: RefCell<Vec<DeskPanel>>,
    tab_bar: RefCell<TabBar<PanelId>>,
    keys: KeyBindings,
    status: RefCell<String>,
    log: Option<LogBufferHandle>,
}

impl Desk {
    pub fn new(guard: Rc<NavigationGuard>, focus: FocusHandle) -> Self {
        Self {
            guard,
            focus,
            panels: RefCell::new(Vec::new()),
            tab_bar: RefCell::new(TabBar::new()),
            keys: KeyBindings::default(),
            status: RefCell::new(String::new()),
            log: None,
        }
    }

    /// Fall back to the newest log line when there is no status message.
    pub fn with_log(mut self, log: LogBufferHandle) -> Self {
        self.log = Some(log);
        self
    }

    pub fn guard(&self) -> &Rc<NavigationGuard> {
        &self.guard
    }

    /// Add a panel and register it with the guard.
    pub fn add(&self, panel: impl Into<DeskPanel>) -> PanelId {
        let panel = panel.into();
        let id = panel.id();
        self.guard.register(&panel.trackable());
        self.panels.borrow_mut().push(panel);
        id
    }

    pub fn panel(&self, id: PanelId) -> Option<DeskPanel> {
        self.panels.borrow().iter().find(|p| p.id() == id).cloned()
    }

    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels.borrow().iter().map(DeskPanel::id).collect()
    }

    pub fn focused(&self) -> Option<PanelId> {
        self.focus.get()
    }

    pub fn focused_panel(&self) -> Option<DeskPanel> {
        self.focused().and_then(|id| self.panel(id))
    }

    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    fn set_status(&self, message: impl Into<String>) {
        *self.status.borrow_mut() = message.into();
    }

    /// Ask panel `id` to take focus. Returns whether it holds focus afterwards,
    /// which is false when the guard kept the user on the previous panel.
    pub fn focus(&self, id: PanelId) -> bool {
        let Some(panel) = self.panel(id) else {
            return false;
        };
        let target = panel.trackable();
        if !target.take_focus() {
            self.set_status(format!("{} cannot take focus", panel.label()));
            return false;
        }
        match self.guard.last_active() {
            Some(last) if !last.ptr_eq(&target) => {
                self.restore_focus(&last);
                self.set_status(format!("Stayed on {}", last.label()));
            }
            _ => self.set_status(String::new()),
        }
        self.focus.is(id)
    }

    /// Put focus back on `last` after the guard refused a switch. A hidden
    /// panel refuses focus, so it is shown again first.
    fn restore_focus(&self, last: &TrackableRef) {
        let owner = self
            .panels
            .borrow()
            .iter()
            .find(|p| p.trackable().ptr_eq(last))
            .cloned();
        let Some(panel) = owner else {
            return;
        };
        if self.focus.is(panel.id()) || panel.is_closed() {
            return;
        }
        panel.set_visible(true);
        last.take_focus();
    }

    /// The next visible panel after the focused one, wrapping around.
    fn neighbour(&self, forward: bool) -> Option<PanelId> {
        let panels = self.panels.borrow();
        if panels.is_empty() {
            return None;
        }
        let len = panels.len();
        let start = self
            .focused()
            .and_then(|id| panels.iter().position(|p| p.id() == id));
        (1..=len)
            .map(|step| match (start, forward) {
                (Some(i), true) => (i + step) % len,
                (Some(i), false) => (i + len - step % len) % len,
                (None, _) => step - 1,
            })
            .map(|idx| &panels[idx])
            .find(|p| p.is_visible() && Some(p.id()) != self.focused())
            .map(DeskPanel::id)
    }

    pub fn focus_next(&self) -> bool {
        match self.neighbour(true) {
            Some(id) => self.focus(id),
            None => false,
        }
    }

    pub fn focus_prev(&self) -> bool {
        match self.neighbour(false) {
            Some(id) => self.focus(id),
            None => false,
        }
    }

    /// Move to the next visible panel, then hide the one that was focused.
    /// Nothing is hidden when the switch is refused.
    pub fn hide_focused(&self) {
        let Some(panel) = self.focused_panel() else {
            return;
        };
        match self.neighbour(true) {
            Some(next) => {
                if !self.focus(next) {
                    return;
                }
            }
            None => self.focus.set(None),
        }
        panel.set_visible(false);
    }

    pub fn show_hidden(&self) {
        let hidden: Vec<DeskPanel> = self
            .panels
            .borrow()
            .iter()
            .filter(|p| !p.is_visible() && !p.is_closed())
            .cloned()
            .collect();
        for panel in &hidden {
            panel.set_visible(true);
        }
        if self.focused().is_none() {
            self.focus_next();
        }
    }

    /// Close the focused panel. Unsaved changes in it are dropped.
    pub fn close_focused(&self) {
        let Some(panel) = self.focused_panel() else {
            return;
        };
        let target = panel.trackable();
        panel.close();
        if self.guard.last_active().is_some_and(|last| last.ptr_eq(&target)) {
            self.guard.clear_last_active();
        }
        self.panels.borrow_mut().retain(|p| p.id() != panel.id());
        tracing::info!(label = %panel.label(), "closed panel");
        self.focus_next();
    }

    pub fn save_focused(&self) {
        let Some(DeskPanel::Editor(editor)) = self.focused_panel() else {
            return;
        };
        match editor.commit_changes() {
            Ok(()) => self.set_status(format!("Saved {}", editor.label())),
            Err(err) => {
                tracing::warn!(error = %err, "save failed");
                self.set_status(err.to_string());
            }
        }
    }

    pub fn handle_event(&self, event: &Event) -> ControlFlow {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key, event),
            Event::Mouse(_) => {
                let clicked = {
                    let mut bar = self.tab_bar.borrow_mut();
                    bar.handle_event(event);
                    bar.take_clicked()
                };
                if let Some(id) = clicked {
                    self.focus(id);
                }
                ControlFlow::Continue
            }
            _ => ControlFlow::Continue,
        }
    }

    fn handle_key(&self, key: &KeyEvent, event: &Event) -> ControlFlow {
        let keys = &self.keys;
        if keys.matches(Action::Quit, key) {
            return ControlFlow::Quit;
        }
        if keys.matches(Action::FocusNext, key) {
            self.focus_next();
        } else if keys.matches(Action::FocusPrev, key) {
            self.focus_prev();
        } else if keys.matches(Action::SavePanel, key) {
            self.save_focused();
        } else if keys.matches(Action::HidePanel, key) {
            self.hide_focused();
        } else if keys.matches(Action::ShowHidden, key) {
            self.show_hidden();
        } else if keys.matches(Action::ClosePanel, key) {
            self.close_focused();
        } else if let Some(DeskPanel::Editor(editor)) = self.focused_panel() {
            editor.edit(event);
        }
        ControlFlow::Continue
    }

    fn tab_labels(&self) -> Vec<TabLabel<PanelId>> {
        self.panels
            .borrow()
            .iter()
            .filter(|p| p.is_visible())
            .map(|p| TabLabel {
                key: p.id(),
                text: p.label(),
                dirty: p.is_dirty(),
                active: self.focus.is(p.id()),
            })
            .collect()
    }

    fn status_line(&self) -> String {
        let status = self.status();
        if !status.is_empty() {
            return status;
        }
        self.log
            .as_ref()
            .and_then(|log| log.tail(1).pop())
            .unwrap_or_else(|| self.key_hint())
    }

    fn key_hint(&self) -> String {
        [
            (Action::FocusNext, "next"),
            (Action::SavePanel, "save"),
            (Action::HidePanel, "hide"),
            (Action::ClosePanel, "close"),
            (Action::Quit, "quit"),
        ]
        .into_iter()
        .filter_map(|(action, verb)| {
            self.keys
                .first_combo(action)
                .map(|combo| format!("{combo} {verb}"))
        })
        .collect::<Vec<_>>()
        .join("  ")
    }

    pub fn render(&self, frame: &mut Frame) {
        let (top, body, bottom) = split_chrome(frame.area());

        let mut bar = self.tab_bar.borrow_mut();
        bar.set_tabs(self.tab_labels());
        bar.render(frame, top, false);
        drop(bar);

        match self.focused_panel() {
            Some(panel) => panel.render(frame, body, true),
            None => {
                let block = Block::default().borders(Borders::ALL);
                frame.render_widget(
                    Paragraph::new("No panel is focused. Press F3 to show hidden panels.")
                        .block(block),
                    body,
                );
            }
        }

        if bottom.height > 0 {
            let line = truncate_to_width(&self.status_line(), bottom.width as usize);
            frame.render_widget(
                Paragraph::new(line).style(Style::default().fg(crate::theme::status_fg())),
                bottom,
            );
        }
    }
}
