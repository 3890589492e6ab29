//! The restricted-backtracking policy.
//!
//! Parsec-like commit semantics: once an attempt has consumed input past a
//! choice point's entry, its failure is *committed* — the choice point's
//! fallback (next alternative, shorter repetition, sequence ladder) is
//! skipped and the failure propagates outward. The `attempt` matcher (Try)
//! opens a cut bracket that lifts the restriction for its subtree, which is
//! the standard way to express "backtrack over this even if it consumed".
//!
//! Consumption is judged from the failure's position marker: a failure
//! strictly past the position where the choice point's own attempt began
//! consumed input on the way down. Failure markers are preserved by
//! forwarding transitions and absent from resumption failures, which is
//! what lets an `attempt` bracket hand an unconsumed-looking failure to the
//! surrounding choice.

use crate::errors::WeftError;
use crate::input::{Position, Token};
use crate::machine::{EngineCx, ExecuteMsg, FailureMsg, Frame, Message, SuccessMsg};
use crate::matchers;
use crate::policy::{pop_frame, ExecutionPolicy};
use crate::state::MatcherState;

/// Restricted backtracking with `attempt` escape hatch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Restricted;

impl<T: Token> ExecutionPolicy<T> for Restricted {
    fn on_execute(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: ExecuteMsg<T>,
    ) -> Result<Message<T>, WeftError> {
        if let Some(frame) = msg.pending {
            cx.stack.push(frame);
        }
        matchers::execute(cx, &msg.matcher, &msg.state, msg.at)
    }

    fn on_success(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: SuccessMsg<T>,
    ) -> Result<Message<T>, WeftError> {
        let frame = pop_frame(cx)?;
        matchers::child_succeeded(cx, frame, msg.state, msg.end, msg.value)
    }

    fn on_failure(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: FailureMsg,
    ) -> Result<Message<T>, WeftError> {
        let frame = pop_frame(cx)?;
        let committed = msg
            .at
            .map_or(false, |failed| failed > attempt_start(&frame));
        if committed && frame.matcher.is_choice_point() && !cx.cut.in_try() {
            // Skip the fallback; the failure escapes this choice point.
            // Non-choice-point frames (Transform, Reference, Try) still run
            // their transitions so cut brackets stay balanced.
            return Ok(Message::failure(msg.at));
        }
        matchers::child_failed(cx, frame, msg.at)
    }
}

/// Where the frame's own attempt began: the entry of its first completed
/// child, or of the child it is currently waiting on when none completed.
fn attempt_start<T: Token>(frame: &Frame<T>) -> Position {
    match &frame.state {
        MatcherState::Sequence { done, .. } | MatcherState::Repeat { done } => done
            .front()
            .map(|rec| rec.entered)
            .unwrap_or(frame.child_entered),
        _ => frame.child_entered,
    }
}
