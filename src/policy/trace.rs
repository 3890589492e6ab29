//! The tracing policy: delegates to a base policy and reports every
//! dispatch to an observer first.

use crate::errors::WeftError;
use crate::input::Token;
use crate::machine::{EngineCx, ExecuteMsg, FailureMsg, Message, SuccessMsg};
use crate::observer::{DispatchKind, Observer, TraceEvent};
use crate::policy::ExecutionPolicy;

/// Wraps any base policy with an observer.
pub struct Tracing<P> {
    base: P,
    observer: Box<dyn Observer>,
}

impl<P> Tracing<P> {
    pub fn new(base: P, observer: Box<dyn Observer>) -> Self {
        Self { base, observer }
    }

    /// Hands the observer back, consuming the wrapper.
    pub fn into_observer(self) -> Box<dyn Observer> {
        self.observer
    }
}

impl<T: Token, P: ExecutionPolicy<T>> ExecutionPolicy<T> for Tracing<P> {
    fn on_execute(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: ExecuteMsg<T>,
    ) -> Result<Message<T>, WeftError> {
        self.observer.on_dispatch(&TraceEvent {
            kind: DispatchKind::Execute,
            depth: cx.depth(),
            at: Some(msg.at),
            detail: format!("{} {}", msg.matcher.pretty(), msg.state.kind()),
        });
        self.base.on_execute(cx, msg)
    }

    fn on_success(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: SuccessMsg<T>,
    ) -> Result<Message<T>, WeftError> {
        self.observer.on_dispatch(&TraceEvent {
            kind: DispatchKind::Success,
            depth: cx.depth(),
            at: Some(msg.end),
            detail: msg.value.to_string(),
        });
        self.base.on_success(cx, msg)
    }

    fn on_failure(
        &mut self,
        cx: &mut EngineCx<'_, T>,
        msg: FailureMsg,
    ) -> Result<Message<T>, WeftError> {
        self.observer.on_dispatch(&TraceEvent {
            kind: DispatchKind::Failure,
            depth: cx.depth(),
            at: msg.at,
            detail: String::new(),
        });
        self.base.on_failure(cx, msg)
    }
}
