//! The plain, non-memoizing policy: the message protocol verbatim.

use crate::errors::WeftError;
use crate::input::Token;
use crate::machine::{EngineCx, ExecuteMsg, FailureMsg, Message, SuccessMsg};
use crate::matchers;
use crate::policy::{pop_frame, ExecutionPolicy};

/// Full backtracking, no cross-matcher state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backtrack;

impl<T: Token> ExecutionPolicy<T> for Backtrack {
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
        matchers::child_failed(cx, frame, msg.at)
    }
}
