//! The memoizing policy.
//!
//! Keys are the triple (matcher identity, state fingerprint, position); each
//! key maps to the *single next* outcome of executing that matcher from that
//! state at that position. Because resumption travels through continuation
//! states, enumerating further alternatives forms new keys, so the chain of
//! entries realizes the full outcome list without any per-key cursor.
//!
//! Left recursion: a key is marked in-progress when first entered. A
//! re-entry on an in-progress key is answered with Failure (conservative —
//! it breaks the cycle without divergence; the outer invocation still
//! records whatever outcome it reaches).

use std::collections::HashMap;

use crate::errors::WeftError;
use crate::grammar::MatcherId;
use crate::input::{Position, Token};
use crate::machine::{EngineCx, ExecuteMsg, FailureMsg, Message, SuccessMsg};
use crate::matchers;
use crate::policy::{pop_frame, ExecutionPolicy};
use crate::state::{Fingerprint, MatcherState};
use crate::value::ParseValue;

type MemoKey = (MatcherId, Fingerprint, Position);

#[derive(Debug, Clone)]
enum MemoEntry<T: Token> {
    /// First entry seen, no outcome yet. Re-entry means left recursion.
    InProgress,
    /// The next outcome is this parse.
    Hit {
        state: MatcherState<T>,
        end: Position,
        value: ParseValue<T>,
    },
    /// The next outcome is failure.
    Miss,
}

/// Packrat-style memoizing policy. The table lives for one parse (or one
/// enumeration of parses) and is owned exclusively by the policy.
pub struct Memo<T: Token> {
    table: HashMap<MemoKey, MemoEntry<T>>,
    /// In-flight keys, innermost last, tagged with the frame-stack depth at
    /// which their sub-parse runs. A Success/Failure dispatched at exactly
    /// that depth is that key's outcome.
    pending: Vec<(usize, MemoKey)>,
}

impl<T: Token> Memo<T> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Number of cached outcomes, for tests and diagnostics.
    pub fn cached(&self) -> usize {
        self.table
            .values()
            .filter(|e| !matches!(e, MemoEntry::InProgress))
            .count()
    }

    /// True when the message about to be processed is the outcome of the
    /// innermost in-flight key.
    fn completes_pending(&self, cx: &EngineCx<'_, T>) -> bool {
        self.pending
            .last()
            .is_some_and(|(depth, _)| *depth == cx.stack.len())
    }

    fn record(&mut self, entry: MemoEntry<T>) {
        let (_, key) = self.pending.pop().expect("pending entry just checked");
        self.table.insert(key, entry);
    }
}

impl<T: Token> Default for Memo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> ExecutionPolicy<T> for Memo<T> {
    fn on_execute(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: ExecuteMsg<T>,
    ) -> Result<Message<T>, WeftError> {
        // The root execute has no pending frame and its completion never
        // reaches the policy (the trampoline terminates first), so it is
        // left out of the table entirely.
        let trackable = msg.pending.is_some();
        if let Some(frame) = msg.pending {
            cx.stack.push(frame);
        }

        let key = (
            MatcherId::of(&msg.matcher),
            msg.state.fingerprint(),
            msg.at,
        );
        match self.table.get(&key) {
            Some(MemoEntry::Hit { state, end, value }) => Ok(Message::success(
                state.clone(),
                *end,
                value.clone(),
            )),
            Some(MemoEntry::Miss) => Ok(Message::failure(None)),
            Some(MemoEntry::InProgress) => Ok(Message::failure(None)),
            None => {
                if trackable {
                    self.table.insert(key.clone(), MemoEntry::InProgress);
                    self.pending.push((cx.stack.len(), key));
                }
                matchers::execute(cx, &msg.matcher, &msg.state, msg.at)
            }
        }
    }

    fn on_success(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: SuccessMsg<T>,
    ) -> Result<Message<T>, WeftError> {
        if self.completes_pending(cx) {
            self.record(MemoEntry::Hit {
                state: msg.state.clone(),
                end: msg.end,
                value: msg.value.clone(),
            });
        }
        let frame = pop_frame(cx)?;
        matchers::child_succeeded(cx, frame, msg.state, msg.end, msg.value)
    }

    fn on_failure(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: FailureMsg,
    ) -> Result<Message<T>, WeftError> {
        if self.completes_pending(cx) {
            self.record(MemoEntry::Miss);
        }
        let frame = pop_frame(cx)?;
        matchers::child_failed(cx, frame, msg.at)
    }
}
