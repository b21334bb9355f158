//! Blocking save prompt drawn into a ratatui terminal.
//!
//! `TerminalPrompt` implements [`ExitPrompt`] by opening a
//! [`SavePromptComponent`] over the current screen and running a nested read
//! loop on the shared input driver until the user picks a button or dismisses
//! the dialog. The outer event loop is suspended for that whole time, which is
//! exactly the synchronous contract the navigation guard relies on.

use std::cell::RefCell;
use std::fmt;
use std::io;
use std::rc::Rc;

use ratatui::backend::Backend;
use ratatui::{Frame, Terminal};
use thiserror::Error;

use crate::components::{Component, SavePromptComponent};
use crate::drivers::InputDriver;
use crate::exit_request::{ExitPrompt, ExitRequest, PromptChoice};

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read prompt input: {0}")]
    Input(#[from] io::Error),
    #[error("failed to draw prompt: {0}")]
    Render(String),
}

type Backdrop = Box<dyn Fn(&mut Frame<'_>)>;

struct PromptShared<B: Backend, D> {
    terminal: Rc<RefCell<Terminal<B>>>,
    input: Rc<RefCell<D>>,
    component: RefCell<SavePromptComponent>,
    backdrop: RefCell<Option<Backdrop>>,
}

/// Cheap to clone; clones share the terminal, the input driver and the backdrop.
pub struct TerminalPrompt<B: Backend, D> {
    shared: Rc<PromptShared<B, D>>,
}

impl<B: Backend, D> Clone for TerminalPrompt<B, D> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<B: Backend, D> fmt::Debug for TerminalPrompt<B, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalPrompt")
            .field("component", &self.shared.component)
            .finish_non_exhaustive()
    }
}

impl<B: Backend, D: InputDriver> TerminalPrompt<B, D> {
    pub fn new(terminal: Rc<RefCell<Terminal<B>>>, input: Rc<RefCell<D>>) -> Self {
        Self {
            shared: Rc::new(PromptShared {
                terminal,
                input,
                component: RefCell::new(SavePromptComponent::new()),
                backdrop: RefCell::new(None),
            }),
        }
    }

    /// Set what is drawn underneath the dialog, usually the host's main view.
    pub fn set_backdrop<F>(&self, backdrop: F)
    where
        F: Fn(&mut Frame<'_>) + 'static,
    {
        *self.shared.backdrop.borrow_mut() = Some(Box::new(backdrop));
    }

    pub fn is_open(&self) -> bool {
        self.shared.component.borrow().visible()
    }

    fn draw(&self) -> Result<(), PromptError> {
        let shared = &self.shared;
        let backdrop = shared.backdrop.borrow();
        let mut component = shared.component.borrow_mut();
        shared
            .terminal
            .borrow_mut()
            .draw(|frame| {
                if let Some(backdrop) = backdrop.as_ref() {
                    backdrop(frame);
                }
                let area = frame.area();
                component.render(frame, area, true);
            })
            .map_err(|err| PromptError::Render(err.to_string()))?;
        Ok(())
    }

    fn read_choice(&self) -> Result<Option<PromptChoice>, PromptError> {
        loop {
            self.draw()?;
            let event = self.shared.input.borrow_mut().read()?;
            let mut component = self.shared.component.borrow_mut();
            component.handle_event(&event);
            if let Some(action) = component.take_action() {
                return Ok(action.choice());
            }
        }
    }

    /// Show the dialog for `request` and block until it is answered.
    pub fn run(&self, request: &ExitRequest) -> Result<Option<PromptChoice>, PromptError> {
        self.shared.component.borrow_mut().open(request);
        let result = self.read_choice();
        self.shared.component.borrow_mut().close();
        result
    }
}

impl<B: Backend, D: InputDriver> ExitPrompt for TerminalPrompt<B, D> {
    fn ask(&self, request: &ExitRequest) -> Option<PromptChoice> {
        match self.run(request) {
            Ok(choice) => choice,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    label = %request.label(),
                    "save prompt failed; staying on panel"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ScriptedInput;
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::widgets::Paragraph;

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn prompt_with(
        events: Vec<Event>,
    ) -> (
        TerminalPrompt<TestBackend, ScriptedInput>,
        Rc<RefCell<Terminal<TestBackend>>>,
    ) {
        let terminal = Rc::new(RefCell::new(
            Terminal::new(TestBackend::new(70, 16)).unwrap(),
        ));
        let input = Rc::new(RefCell::new(ScriptedInput::new(events)));
        (TerminalPrompt::new(terminal.clone(), input), terminal)
    }

    #[test]
    fn ignores_noise_until_a_button_is_chosen() {
        let (prompt, _) = prompt_with(vec![key('x'), key('z'), key('d')]);
        let choice = prompt.ask(&ExitRequest::new("Report"));
        assert_eq!(choice, Some(PromptChoice::Discard));
        assert!(!prompt.is_open());
    }

    #[test]
    fn exhausted_input_denies() {
        let (prompt, _) = prompt_with(vec![key('x')]);
        assert_eq!(prompt.ask(&ExitRequest::new("Report")), None);
        assert!(!prompt.is_open());
    }

    #[test]
    fn dialog_is_drawn_over_backdrop() {
        let (prompt, terminal) = prompt_with(vec![key('s')]);
        prompt.set_backdrop(|frame| {
            let area = frame.area();
            frame.render_widget(Paragraph::new("BACKDROP"), area);
        });
        assert_eq!(
            prompt.ask(&ExitRequest::new("Report")),
            Some(PromptChoice::Save)
        );
        let terminal = terminal.borrow();
        let buffer = terminal.backend().buffer();
        let first_row: String = (0..8u16)
            .map(|x| buffer[(x, 0u16)].symbol().to_string())
            .collect();
        assert_eq!(first_row, "BACKDROP");
        let screen: String = buffer
            .content()
            .iter()
            .map(|cell| cell.symbol().to_string())
            .collect();
        assert!(screen.contains("Save Report"));
        assert!(screen.contains("[ Discard ]"));
    }
}
