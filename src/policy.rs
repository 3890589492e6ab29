//! Execution policies.
//!
//! A policy is the strategy that interprets each trampoline message. The
//! trampoline never inspects matcher variants; it hands every message to the
//! policy, and the policy decides whether to step the matcher's transition,
//! answer from a memo table, or let a failure escape a choice point. Swapping
//! the policy changes *how* a grammar is scheduled without touching a single
//! matcher.
//!
//! Provided policies:
//!
//! - [`Backtrack`] — the message protocol verbatim, full backtracking.
//! - [`Memo`] — packrat-style memoization keyed by
//!   (matcher identity, state fingerprint, position), with a conservative
//!   left-recursion rule.
//! - [`Restricted`] — Parsec-like: a failure that consumed input escapes the
//!   surrounding choice point unless bracketed by `attempt`.
//! - [`Tracing`] — wraps any base policy and reports every dispatch to an
//!   observer.

pub mod backtrack;
pub mod memo;
pub mod restricted;
pub mod trace;

pub use backtrack::Backtrack;
pub use memo::Memo;
pub use restricted::Restricted;
pub use trace::Tracing;

use crate::errors::WeftError;
use crate::input::Token;
use crate::machine::{EngineCx, ExecuteMsg, FailureMsg, Message, SuccessMsg};

/// The message-interpretation strategy of one parse.
///
/// Each operation consumes one message and produces the next. The contract
/// with the trampoline: `on_execute` pushes the message's pending frame
/// before stepping the child; `on_success` / `on_failure` pop exactly one
/// frame and step the parent.
pub trait ExecutionPolicy<T: Token> {
    fn on_execute(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: ExecuteMsg<T>,
    ) -> Result<Message<T>, WeftError>;

    fn on_success(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: SuccessMsg<T>,
    ) -> Result<Message<T>, WeftError>;

    fn on_failure(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: FailureMsg,
    ) -> Result<Message<T>, WeftError>;
}

/// Pops the frame a Success or Failure is addressed to.
///
/// The trampoline only dispatches these while a frame is on the stack, so an
/// empty stack here is a protocol breach.
pub(crate) fn pop_frame<T: Token>(
    cx: &mut EngineCx<'_, T>,
) -> Result<crate::machine::Frame<T>, WeftError> {
    cx.stack
        .pop()
        .ok_or_else(|| WeftError::internal("success/failure dispatched with an empty frame stack"))
}
