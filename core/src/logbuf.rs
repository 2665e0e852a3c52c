//! Bounded activity log
//!
//! Ring buffer of operation outcomes shown in the overlay's log pane.
//! Both the line count and the per-line byte length are capped so a chatty
//! refresh loop cannot grow memory without bound.

use std::collections::VecDeque;

/// Maximum retained lines; older lines fall off the front.
pub const MAX_LOG_LINES: usize = 512;
/// Maximum bytes kept per line.
pub const MAX_LINE_BYTES: usize = 512;

/// Outcome class of a logged operation; the overlay colors lines by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Good,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub severity: Severity,
    pub text: String,
}

/// Fixed-capacity operation log.
#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: VecDeque<LogLine>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(64),
        }
    }

    /// Append a line, truncating it to [`MAX_LINE_BYTES`] on a char boundary
    /// and dropping the oldest line once [`MAX_LOG_LINES`] is reached.
    pub fn push(&mut self, severity: Severity, text: impl Into<String>) {
        let mut text = text.into();
        if text.len() > MAX_LINE_BYTES {
            let mut cut = MAX_LINE_BYTES;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        if self.lines.len() == MAX_LOG_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine { severity, text });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Severity::Info, text);
    }

    pub fn good(&mut self, text: impl Into<String>) {
        self.push(Severity::Good, text);
    }

    pub fn warn(&mut self, text: impl Into<String>) {
        self.push(Severity::Warn, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(Severity::Error, text);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }
}
