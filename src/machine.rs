//! The message/trampoline substrate.
//!
//! Matchers never call each other. A matcher that needs a child parsed
//! returns an Execute [`Message`] carrying the frame to suspend itself into;
//! the child's eventual Success or Failure pops that [`Frame`] and re-enters
//! the parent. The trampoline's frame stack replaces host-language recursion,
//! so grammar depth never consumes host stack.
//!
//! [`EngineCx`] is the per-parse capability surface handed to policies and
//! matcher transitions: the grammar (for reference resolution), the input
//! source, the frame stack, the deepest-failure watermark, dispatch counters,
//! and the cut bracket consumed by Try.

use crate::grammar::{Grammar, MatcherRef};
use crate::input::{Position, Source, Token};
use crate::state::MatcherState;
use crate::value::ParseValue;

/// Request to advance `matcher` from `state` at `at`.
///
/// `pending` is the parent frame the policy must push before stepping the
/// child — the trampoline bookkeeping of the protocol made explicit in the
/// message so transitions stay pure. It is `None` only for the root.
#[derive(Debug, Clone)]
pub struct ExecuteMsg<T: Token> {
    pub pending: Option<Frame<T>>,
    pub matcher: MatcherRef<T>,
    pub state: MatcherState<T>,
    pub at: Position,
}

/// A matcher produced a parse. `state` is its continuation: re-executing the
/// matcher with it at the same entry position enumerates the next
/// alternative.
#[derive(Debug, Clone)]
pub struct SuccessMsg<T: Token> {
    pub state: MatcherState<T>,
    pub end: Position,
    pub value: ParseValue<T>,
}

/// A matcher found no (further) parse. `at` optionally marks the deepest
/// position the failing attempt reached, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureMsg {
    pub at: Option<Position>,
}

/// One trampoline message. The loop consumes exactly one per iteration.
#[derive(Debug, Clone)]
pub enum Message<T: Token> {
    Execute(ExecuteMsg<T>),
    Success(SuccessMsg<T>),
    Failure(FailureMsg),
}

impl<T: Token> Message<T> {
    pub fn execute(
        pending: Option<Frame<T>>,
        matcher: MatcherRef<T>,
        state: MatcherState<T>,
        at: Position,
    ) -> Self {
        Message::Execute(ExecuteMsg {
            pending,
            matcher,
            state,
            at,
        })
    }

    pub fn success(state: MatcherState<T>, end: Position, value: ParseValue<T>) -> Self {
        Message::Success(SuccessMsg { state, end, value })
    }

    pub fn failure(at: Option<Position>) -> Self {
        Message::Failure(FailureMsg { at })
    }

    /// Returns the message kind as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Execute(_) => "execute",
            Message::Success(_) => "success",
            Message::Failure(_) => "failure",
        }
    }

    /// The position the message speaks about, when it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Message::Execute(m) => Some(m.at),
            Message::Success(m) => Some(m.end),
            Message::Failure(m) => m.at,
        }
    }
}

/// A suspended parent: the matcher, its awaiting state, and the position at
/// which it entered the child it is waiting on.
#[derive(Debug, Clone)]
pub struct Frame<T: Token> {
    pub matcher: MatcherRef<T>,
    pub state: MatcherState<T>,
    pub child_entered: Position,
}

/// The cut bracket of restricted backtracking.
///
/// Only the Try transition writes it (`begin_try`/`end_try` on every entry,
/// success, failure, and resumption path) and only the restricted policy
/// reads it. A plain counter so Try nests.
#[derive(Debug, Clone, Copy, Default)]
pub struct CutState {
    depth: usize,
}

impl CutState {
    pub fn begin_try(&mut self) {
        self.depth += 1;
    }

    pub fn end_try(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn in_try(&self) -> bool {
        self.depth > 0
    }
}

/// Dispatch counters, updated once per trampoline iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub executes: u64,
    pub successes: u64,
    pub failures: u64,
    pub max_depth: usize,
}

/// Per-parse context. Owned by the trampoline, lent to the policy and the
/// matcher transitions on every dispatch; discarded when the parse ends.
pub struct EngineCx<'a, T: Token> {
    pub grammar: &'a Grammar<T>,
    pub source: &'a dyn Source<Token = T>,
    pub stack: Vec<Frame<T>>,
    pub deepest: Option<Position>,
    pub stats: DispatchStats,
    pub cut: CutState,
}

impl<'a, T: Token> EngineCx<'a, T> {
    pub fn new(grammar: &'a Grammar<T>, source: &'a dyn Source<Token = T>) -> Self {
        Self {
            grammar,
            source,
            stack: Vec::new(),
            deepest: None,
            stats: DispatchStats::default(),
            cut: CutState::default(),
        }
    }

    /// Current frame-stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Raises the deepest-failure watermark.
    pub fn note_failure(&mut self, at: Option<Position>) {
        if self.deepest < at {
            self.deepest = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_state_nests() {
        let mut cut = CutState::default();
        assert!(!cut.in_try());
        cut.begin_try();
        cut.begin_try();
        cut.end_try();
        assert!(cut.in_try());
        cut.end_try();
        assert!(!cut.in_try());
    }

    #[test]
    fn deepest_watermark_only_rises() {
        let grammar = crate::grammar::Grammar::from_root(crate::grammar::text("a"));
        let source = crate::input::TextSource::new("a");
        let mut cx = EngineCx::new(&grammar, &source);
        cx.note_failure(Some(Position::new(3)));
        cx.note_failure(Some(Position::new(1)));
        cx.note_failure(None);
        assert_eq!(cx.deepest, Some(Position::new(3)));
    }
}
