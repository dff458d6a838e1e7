//! Scoped console: prefixes module output and forwards it to a sink.

use std::cell::RefCell;
use std::rc::Rc;

/// Destination for console output.
pub trait ConsoleSink {
    fn log(&mut self, line: &str);
    fn warn(&mut self, line: &str);
    fn error(&mut self, line: &str);
}

/// Default sink: structured logging under the `app` target.
#[derive(Default)]
pub struct TracingSink;

impl ConsoleSink for TracingSink {
    fn log(&mut self, line: &str) {
        tracing::info!(target: "app", "{line}");
    }

    fn warn(&mut self, line: &str) {
        tracing::warn!(target: "app", "{line}");
    }

    fn error(&mut self, line: &str) {
        tracing::error!(target: "app", "{line}");
    }
}

/// Sink that collects lines, for tests.
#[derive(Default)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl ConsoleSink for BufferSink {
    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn warn(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn error(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Console handed to a module; every line carries the module name.
#[derive(Clone)]
pub struct ScopedConsole {
    scope: String,
    sink: Rc<RefCell<dyn ConsoleSink>>,
}

impl ScopedConsole {
    pub fn new(scope: impl Into<String>, sink: Rc<RefCell<dyn ConsoleSink>>) -> Self {
        Self {
            scope: scope.into(),
            sink,
        }
    }

    pub fn log(&self, msg: &str) {
        self.sink.borrow_mut().log(&self.prefixed(msg));
    }

    pub fn warn(&self, msg: &str) {
        self.sink.borrow_mut().warn(&self.prefixed(msg));
    }

    pub fn error(&self, msg: &str) {
        self.sink.borrow_mut().error(&self.prefixed(msg));
    }

    fn prefixed(&self, msg: &str) -> String {
        format!("[{}]: {}", self.scope, msg)
    }
}
