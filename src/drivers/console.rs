use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyEventKind};

use super::InputDriver;

/// Reads input from the controlling terminal through crossterm.
///
/// Key release events (reported on some platforms) are dropped so every key
/// press is seen exactly once.
#[derive(Debug, Default)]
pub struct ConsoleInputDriver;

impl ConsoleInputDriver {
    pub fn new() -> Self {
        Self
    }
}

impl InputDriver for ConsoleInputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        crossterm::event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        loop {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Release => continue,
                event => return Ok(event),
            }
        }
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        if enabled {
            crossterm::execute!(std::io::stdout(), crossterm::event::EnableMouseCapture)
        } else {
            crossterm::execute!(std::io::stdout(), crossterm::event::DisableMouseCapture)
        }
    }
}
