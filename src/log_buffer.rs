//! Bounded in-memory log sink.
//!
//! While the demo owns the terminal, log output cannot go to stderr without
//! corrupting the screen. The tracing subscriber writes into a `LogBuffer`
//! instead and the status line renders its tail.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock};

pub const DEFAULT_MAX_LINES: usize = 500;

static GLOBAL_LOG: OnceLock<LogBufferHandle> = OnceLock::new();

/// Install the process-wide buffer. Returns false if one was already set.
pub fn set_global_log_buffer(handle: LogBufferHandle) -> bool {
    GLOBAL_LOG.set(handle).is_ok()
}

pub fn global_log_buffer() -> Option<LogBufferHandle> {
    GLOBAL_LOG.get().cloned()
}

#[derive(Debug)]
struct LogLines {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl LogLines {
    fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    fn push_line(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogBufferHandle {
    inner: Arc<Mutex<LogLines>>,
}

impl LogBufferHandle {
    pub fn new(max_lines: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogLines::new(max_lines))),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        if let Ok(mut buffer) = self.inner.lock() {
            buffer.push_line(line.into());
        }
    }

    /// The newest `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> Vec<String> {
        let Ok(buffer) = self.inner.lock() else {
            return Vec::new();
        };
        let skip = buffer.lines.len().saturating_sub(count);
        buffer.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|b| b.lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn writer(&self) -> LogBufferWriter {
        LogBufferWriter::new(self.clone())
    }
}

impl Default for LogBufferHandle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES)
    }
}

/// `io::Write` adapter that splits written bytes into lines.
#[derive(Debug)]
pub struct LogBufferWriter {
    handle: LogBufferHandle,
    pending: Vec<u8>,
}

impl LogBufferWriter {
    pub fn new(handle: LogBufferHandle) -> Self {
        Self {
            handle,
            pending: Vec::new(),
        }
    }

    fn push_complete_lines(&mut self) {
        let Some(pos) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return;
        };
        let drained: Vec<u8> = self.pending.drain(..=pos).collect();
        for line in String::from_utf8_lossy(&drained).split('\n') {
            if !line.is_empty() {
                self.handle.push(line.to_string());
            }
        }
    }
}

impl Write for LogBufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.push_complete_lines();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.push_complete_lines();
        if !self.pending.is_empty() {
            let rest = String::from_utf8_lossy(&self.pending).to_string();
            self.pending.clear();
            self.handle.push(rest);
        }
        Ok(())
    }
}

impl Drop for LogBufferWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
