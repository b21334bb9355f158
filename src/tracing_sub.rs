//! Logging setup for the library and the demo binary.
//!
//! While the demo owns the terminal in raw mode, anything written to stderr
//! lands on top of the panels. When a global [`LogBufferHandle`] is installed
//! the subscriber writes there instead, and the desk shows the newest line in
//! its status line and the help panel shows the tail. Without a buffer (tests,
//! library users) output goes to stderr as usual.
//!
//! [`LogBufferHandle`]: crate::log_buffer::LogBufferHandle

use std::io::{self, Write};

use tracing::Level;

use crate::log_buffer::{LogBufferWriter, global_log_buffer};

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    Buffer(LogBufferWriter),
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new() -> Self {
        if let Some(handle) = global_log_buffer() {
            DelegatingWriter {
                inner: DelegatingInner::Buffer(handle.writer()),
            }
        } else {
            DelegatingWriter {
                inner: DelegatingInner::Stderr(io::stderr()),
            }
        }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            DelegatingInner::Buffer(w) => w.write(buf),
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            DelegatingInner::Buffer(w) => w.flush(),
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize a tracing subscriber that writes into the global log buffer when
/// one is installed, and to stderr otherwise. Repeated calls are no-ops.
pub fn init(max_level: Level) {
    // Escape codes would show up verbatim in the in-app status line.
    let ansi = global_log_buffer().is_none();
    let _ = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(SubscriberMakeWriter)
        .with_ansi(ansi)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}

/// `init` at debug level.
pub fn init_default() {
    init(Level::DEBUG);
}
