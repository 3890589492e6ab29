//! The trampoline engine and parse surface.
//!
//! Parsing is a message loop: each iteration consumes exactly one
//! [`Message`] and produces the next, with the policy doing the
//! interpretation. The loop owns the frame stack through [`EngineCx`], so
//! grammar depth never consumes host stack. It terminates when a Success or
//! Failure crosses the empty stack — the root outcome — or when the
//! cancellation token fires.
//!
//! This is the single entry point for all parsing; the enumeration surface
//! ([`parses`]) is the same loop, re-driven with the root's continuation
//! state between pulls.
//!
//! ```
//! use weft::engine::{parse, Outcome, ParseOptions};
//! use weft::grammar::{seq, text, Grammar};
//! use weft::input::TextSource;
//!
//! let grammar = Grammar::from_root(seq(vec![text("hello"), text("world")]));
//! let source = TextSource::new("helloworld");
//! let outcome = parse(&grammar, &source, ParseOptions::default()).unwrap();
//! assert!(matches!(outcome, Outcome::Matched { .. }));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::WeftError;
use crate::grammar::Grammar;
use crate::input::{Position, Source, Token};
use crate::machine::{DispatchStats, EngineCx, Message};
use crate::observer::{Observer, TraceEvent};
use crate::policy::{Backtrack, ExecutionPolicy, Memo};
use crate::state::MatcherState;
use crate::value::ParseValue;

// ============================================================================
// OPTIONS AND CANCELLATION
// ============================================================================

/// Externally settable abort flag, checked at the top of every trampoline
/// iteration. Clone the token and hand it to a timer to express a timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration for one parse. Defaults mirror the common case: first
/// parse only, full input required, no memoization, no hooks.
pub struct ParseOptions {
    /// Require the final position to be end-of-input.
    pub require_full_input: bool,
    /// Select the memoizing policy instead of plain backtracking.
    pub memoize: bool,
    /// Externally settable abort flag.
    pub cancellation: Option<CancelToken>,
    /// Diagnostic hook invoked on every dispatch.
    pub observer: Option<Box<dyn Observer>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            require_full_input: true,
            memoize: false,
            cancellation: None,
            observer: None,
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// What a single parse call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T: Token> {
    /// The grammar matched; `end` is the position after the match.
    Matched { value: ParseValue<T>, end: Position },
    /// The grammar did not match. Normal control flow, not an error.
    /// `deepest` is the furthest position any failing attempt reached.
    NoMatch { deepest: Option<Position> },
    /// The cancellation token fired mid-parse.
    Cancelled,
}

impl<T: Token> Outcome<T> {
    pub fn is_match(&self) -> bool {
        matches!(self, Outcome::Matched { .. })
    }

    /// The matched value, if any.
    pub fn value(&self) -> Option<&ParseValue<T>> {
        match self {
            Outcome::Matched { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The position after the match, if any.
    pub fn end(&self) -> Option<Position> {
        match self {
            Outcome::Matched { end, .. } => Some(*end),
            _ => None,
        }
    }
}

/// One parse out of a lazy enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit<T: Token> {
    pub value: ParseValue<T>,
    pub end: Position,
}

/// Why an enumeration stopped early. A plain no-more-parses simply ends the
/// iterator; these are the distinguishable terminations.
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    Grammar(WeftError),
    Cancelled,
}

// ============================================================================
// TRAMPOLINE
// ============================================================================

/// How one drive of the loop ended.
enum Step<T: Token> {
    Matched {
        state: MatcherState<T>,
        end: Position,
        value: ParseValue<T>,
    },
    Exhausted,
    Cancelled,
}

/// The message loop. Matcher-agnostic: it inspects message kinds, never
/// matcher variants. Stack discipline is the sole invariant it enforces.
struct Trampoline<'g, T: Token> {
    cx: EngineCx<'g, T>,
    policy: Box<dyn ExecutionPolicy<T>>,
    cancellation: Option<CancelToken>,
    observer: Option<Box<dyn Observer>>,
}

impl<'g, T: Token> Trampoline<'g, T> {
    fn new(
        grammar: &'g Grammar<T>,
        source: &'g dyn Source<Token = T>,
        policy: Box<dyn ExecutionPolicy<T>>,
        cancellation: Option<CancelToken>,
        observer: Option<Box<dyn Observer>>,
    ) -> Self {
        Self {
            cx: EngineCx::new(grammar, source),
            policy,
            cancellation,
            observer,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }

    fn note(&mut self, message: &Message<T>) {
        let depth = self.cx.depth();
        match message {
            Message::Execute(_) => self.cx.stats.executes += 1,
            Message::Success(_) => self.cx.stats.successes += 1,
            Message::Failure(_) => self.cx.stats.failures += 1,
        }
        if depth > self.cx.stats.max_depth {
            self.cx.stats.max_depth = depth;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_dispatch(&TraceEvent::from_message(message, depth));
        }
    }

    /// Runs the loop until a Success or Failure crosses the empty stack.
    fn drive(&mut self, mut message: Message<T>) -> Result<Step<T>, WeftError> {
        loop {
            if self.cancelled() {
                return Ok(Step::Cancelled);
            }
            self.note(&message);

            message = match message {
                Message::Execute(msg) => self.policy.on_execute(&mut self.cx, msg)?,
                Message::Success(msg) => {
                    if self.cx.stack.is_empty() {
                        return Ok(Step::Matched {
                            state: msg.state,
                            end: msg.end,
                            value: msg.value,
                        });
                    }
                    self.policy.on_success(&mut self.cx, msg)?
                }
                Message::Failure(msg) => {
                    self.cx.note_failure(msg.at);
                    if self.cx.stack.is_empty() {
                        return Ok(Step::Exhausted);
                    }
                    self.policy.on_failure(&mut self.cx, msg)?
                }
            };
        }
    }

    /// The bootstrap message: execute the root from `state` at the start of
    /// the input, with no pending frame (the empty stack is the sentinel).
    fn root_message(&self, state: MatcherState<T>) -> Message<T> {
        Message::execute(
            None,
            self.cx.grammar.root().clone(),
            state,
            self.cx.source.start(),
        )
    }

    fn stats(&self) -> DispatchStats {
        self.cx.stats
    }
}

// ============================================================================
// PARSE SURFACE
// ============================================================================

fn select_policy<T: Token>(memoize: bool) -> Box<dyn ExecutionPolicy<T>> {
    if memoize {
        Box::new(Memo::new())
    } else {
        Box::new(Backtrack)
    }
}

/// Parses `source` with `grammar`, policy chosen by `options.memoize`.
///
/// Returns the first parse the grammar enumerates. With
/// `require_full_input`, a first parse that stops short of end-of-input is a
/// [`Outcome::NoMatch`] — alternatives are not retried; use [`parses`] to
/// enumerate.
pub fn parse<T: Token>(
    grammar: &Grammar<T>,
    source: &dyn Source<Token = T>,
    options: ParseOptions,
) -> Result<Outcome<T>, WeftError> {
    let policy = select_policy(options.memoize);
    parse_with(grammar, source, policy, options)
}

/// Like [`parse`], with a caller-supplied policy.
pub fn parse_with<T: Token>(
    grammar: &Grammar<T>,
    source: &dyn Source<Token = T>,
    policy: Box<dyn ExecutionPolicy<T>>,
    options: ParseOptions,
) -> Result<Outcome<T>, WeftError> {
    let require_full = options.require_full_input;
    let mut tramp = Trampoline::new(
        grammar,
        source,
        policy,
        options.cancellation,
        options.observer,
    );
    let message = tramp.root_message(MatcherState::Clean);
    match tramp.drive(message)? {
        Step::Matched { end, value, .. } => {
            if require_full && !source.at_end(end) {
                let deepest = tramp.cx.deepest.max(Some(end));
                return Ok(Outcome::NoMatch { deepest });
            }
            Ok(Outcome::Matched { value, end })
        }
        Step::Exhausted => Ok(Outcome::NoMatch {
            deepest: tramp.cx.deepest,
        }),
        Step::Cancelled => Ok(Outcome::Cancelled),
    }
}

/// Lazily enumerates every parse of `source` under `grammar`, in the order
/// fixed by the matcher semantics. The sequence is finite iff the grammar is
/// finitely ambiguous on the input.
pub fn parses<'g, T: Token>(
    grammar: &'g Grammar<T>,
    source: &'g dyn Source<Token = T>,
    options: ParseOptions,
) -> Parses<'g, T> {
    let policy = select_policy(options.memoize);
    parses_with(grammar, source, policy, options)
}

/// Like [`parses`], with a caller-supplied policy.
pub fn parses_with<'g, T: Token>(
    grammar: &'g Grammar<T>,
    source: &'g dyn Source<Token = T>,
    policy: Box<dyn ExecutionPolicy<T>>,
    options: ParseOptions,
) -> Parses<'g, T> {
    Parses {
        require_full: options.require_full_input,
        tramp: Trampoline::new(
            grammar,
            source,
            policy,
            options.cancellation,
            options.observer,
        ),
        next_state: Some(MatcherState::Clean),
        finished: false,
    }
}

/// Lazy sequence of parses. Each `next` resumes the trampoline until the
/// next parse leaves the root, then pauses.
///
/// A grammar error or cancellation yields one `Err` and fuses the iterator;
/// running out of parses simply ends it.
pub struct Parses<'g, T: Token> {
    tramp: Trampoline<'g, T>,
    require_full: bool,
    /// The root continuation to resume from; `Clean` before the first pull.
    next_state: Option<MatcherState<T>>,
    finished: bool,
}

impl<T: Token> Parses<'_, T> {
    /// Furthest position any failing attempt has reached so far.
    pub fn deepest(&self) -> Option<Position> {
        self.tramp.cx.deepest
    }

    /// Dispatch counters accumulated across all pulls.
    pub fn stats(&self) -> DispatchStats {
        self.tramp.stats()
    }
}

impl<T: Token> Iterator for Parses<'_, T> {
    type Item = Result<Hit<T>, Halt>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let Some(state) = self.next_state.take() else {
                self.finished = true;
                return None;
            };
            let message = self.tramp.root_message(state);
            match self.tramp.drive(message) {
                Err(error) => {
                    self.finished = true;
                    return Some(Err(Halt::Grammar(error)));
                }
                Ok(Step::Cancelled) => {
                    self.finished = true;
                    return Some(Err(Halt::Cancelled));
                }
                Ok(Step::Exhausted) => {
                    self.finished = true;
                    return None;
                }
                Ok(Step::Matched { state, end, value }) => {
                    self.next_state = Some(state);
                    if self.require_full && !self.tramp.cx.source.at_end(end) {
                        continue;
                    }
                    return Some(Ok(Hit { value, end }));
                }
            }
        }
    }
}
