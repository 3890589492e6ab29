//! Diagnostics hooks.
//!
//! An [`Observer`] is invoked once per trampoline dispatch with a rendered
//! [`TraceEvent`]. Observers see a read-only view and cannot influence the
//! parse. Two stock observers are provided: [`BufferTracer`] collects trace
//! lines for tests and programmatic capture, [`WriterTracer`] renders to any
//! `io::Write`.

use std::fmt;
use std::io::Write;

use crate::input::{Position, Token};
use crate::machine::Message;

/// Which policy operation a trace event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Execute,
    Success,
    Failure,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DispatchKind::Execute => "execute",
            DispatchKind::Success => "success",
            DispatchKind::Failure => "failure",
        };
        write!(f, "{s}")
    }
}

/// One dispatch, rendered for observation: the message kind, the frame-stack
/// depth, the position the message speaks about, and a human-readable detail
/// (the matcher for executes, the value for successes).
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEvent {
    pub kind: DispatchKind,
    pub depth: usize,
    pub at: Option<Position>,
    pub detail: String,
}

impl TraceEvent {
    /// Renders a message into an event at the given stack depth.
    pub fn from_message<T: Token>(message: &Message<T>, depth: usize) -> Self {
        match message {
            Message::Execute(m) => TraceEvent {
                kind: DispatchKind::Execute,
                depth,
                at: Some(m.at),
                detail: format!("{} {}", m.matcher.pretty(), m.state.kind()),
            },
            Message::Success(m) => TraceEvent {
                kind: DispatchKind::Success,
                depth,
                at: Some(m.end),
                detail: m.value.to_string(),
            },
            Message::Failure(m) => TraceEvent {
                kind: DispatchKind::Failure,
                depth,
                at: m.at,
                detail: String::new(),
            },
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "  ".repeat(self.depth);
        write!(f, "{indent}{}", self.kind)?;
        if let Some(at) = self.at {
            write!(f, " {at}")?;
        }
        if !self.detail.is_empty() {
            write!(f, " {}", self.detail)?;
        }
        Ok(())
    }
}

/// Invoked before each dispatch. Observers must not assume anything about
/// the lifetime of the event beyond the call.
pub trait Observer {
    fn on_dispatch(&mut self, event: &TraceEvent);
}

/// Collects rendered trace lines into memory.
#[derive(Debug, Default)]
pub struct BufferTracer {
    lines: Vec<String>,
}

impl BufferTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Observer for BufferTracer {
    fn on_dispatch(&mut self, event: &TraceEvent) {
        self.lines.push(event.to_string());
    }
}

/// Renders each event as one line to a writer. Write errors are swallowed;
/// tracing must never abort a parse.
pub struct WriterTracer<W: Write> {
    writer: W,
}

impl<W: Write> WriterTracer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Observer for WriterTracer<W> {
    fn on_dispatch(&mut self, event: &TraceEvent) {
        let _ = writeln!(self.writer, "{event}");
    }
}
