use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::Event;

use crate::drivers::InputDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Quit,
}

/// Drives the UI thread: polls the input driver and hands each event to a
/// handler.
///
/// The driver is shared rather than owned because the save prompt runs its own
/// blocking read loop from inside an event handler. The driver is never
/// borrowed while the handler runs, so that nested loop can take it.
pub struct EventLoop<D> {
    driver: Rc<RefCell<D>>,
    poll_interval: Duration,
}

impl<D: InputDriver> EventLoop<D> {
    pub fn new(driver: Rc<RefCell<D>>, poll_interval: Duration) -> Self {
        Self {
            driver,
            poll_interval,
        }
    }

    fn next_event(&self, timeout: Duration) -> io::Result<Option<Event>> {
        let mut driver = self.driver.borrow_mut();
        if driver.poll(timeout)? {
            Ok(Some(driver.read()?))
        } else {
            Ok(None)
        }
    }

    /// Run until the handler asks to quit.
    ///
    /// The handler is called with `None` once per poll interval without input
    /// (the place to redraw), and with `Some(event)` for every event. Bursts are
    /// drained before the next idle tick so rendering does not fall behind.
    pub fn run<F>(&mut self, mut handler: F) -> io::Result<()>
    where
        F: FnMut(Option<Event>) -> io::Result<ControlFlow>,
    {
        loop {
            if let ControlFlow::Quit = handler(None)? {
                break;
            }
            let mut timeout = self.poll_interval;
            while let Some(event) = self.next_event(timeout)? {
                if let ControlFlow::Quit = handler(Some(event))? {
                    return Ok(());
                }
                timeout = Duration::from_millis(0);
            }
        }
        Ok(())
    }
}
