//! The matcher transition catalogue.
//!
//! Every matcher variant is a little state machine with three transitions,
//! all of which return the next [`Message`] instead of calling anything:
//!
//! - [`execute`] — advance a matcher from a state at a position. `Clean`
//!   dispatches to the variant's enter logic, `Spent` fails, continuation
//!   states dispatch to the variant's resume logic (next-alternative
//!   enumeration).
//! - [`child_succeeded`] — a child the matcher delegated to produced a parse.
//! - [`child_failed`] — the delegated child found no (further) parse.
//!
//! Enumeration order is part of the contract: Sequence is left-to-right,
//! Choice is in declared order, greedy Repeat is longest-first, lazy Repeat
//! shortest-first.

use im::Vector;

use crate::errors::WeftError;
use crate::grammar::{Greed, Matcher, MatcherRef};
use crate::input::{Position, Source, Token};
use crate::machine::{EngineCx, Frame, Message};
use crate::state::{ChildRecord, MatcherState};
use crate::value::ParseValue;

/// Advances `matcher` from `state` starting at `at`.
pub fn execute<T: Token>(
    cx: &mut EngineCx<'_, T>,
    matcher: &MatcherRef<T>,
    state: &MatcherState<T>,
    at: Position,
) -> Result<Message<T>, WeftError> {
    match state {
        MatcherState::Clean => enter(cx, matcher, at),
        MatcherState::Spent => Ok(Message::failure(None)),
        _ => resume(cx, matcher, state),
    }
}

// ============================================================================
// ENTER - first execution at a position, state = Clean
// ============================================================================

fn enter<T: Token>(
    cx: &mut EngineCx<'_, T>,
    matcher: &MatcherRef<T>,
    at: Position,
) -> Result<Message<T>, WeftError> {
    match &**matcher {
        Matcher::Literal(tokens) => Ok(match_literal(cx.source, tokens, at)),

        Matcher::Sequence(children) => {
            if children.is_empty() {
                return Ok(Message::success(
                    MatcherState::Spent,
                    at,
                    ParseValue::List(Vec::new()),
                ));
            }
            Ok(delegate(
                matcher,
                MatcherState::Sequence {
                    done: Vector::new(),
                    next: 0,
                },
                &children[0],
                MatcherState::Clean,
                at,
            ))
        }

        Matcher::Choice(alternatives) => {
            let Some(first) = alternatives.first() else {
                return Ok(Message::failure(Some(at)));
            };
            Ok(delegate(
                matcher,
                MatcherState::Choice { index: 0 },
                first,
                MatcherState::Clean,
                at,
            ))
        }

        Matcher::Repeat {
            child,
            min,
            max,
            greed,
        } => {
            if let Some(mx) = max {
                if min > mx {
                    return Err(WeftError::RepeatBounds {
                        min: *min,
                        max: *mx,
                    });
                }
            }
            // A lazy repeat with min 0 yields the empty parse first; a repeat
            // capped at zero can yield nothing else.
            let empty_first = *max == Some(0) || (*greed == Greed::Lazy && *min == 0);
            if empty_first {
                return Ok(Message::success(
                    MatcherState::RepeatDone {
                        done: Vector::new(),
                        at,
                    },
                    at,
                    ParseValue::List(Vec::new()),
                ));
            }
            Ok(delegate(
                matcher,
                MatcherState::Repeat {
                    done: Vector::new(),
                },
                child,
                MatcherState::Clean,
                at,
            ))
        }

        Matcher::Transform { child, .. } => Ok(delegate(
            matcher,
            MatcherState::Transform,
            child,
            MatcherState::Clean,
            at,
        )),

        Matcher::Reference(name) => {
            let target = cx.grammar.resolve(name)?.clone();
            Ok(delegate(
                matcher,
                MatcherState::Reference,
                &target,
                MatcherState::Clean,
                at,
            ))
        }

        Matcher::Try(child) => {
            cx.cut.begin_try();
            Ok(delegate(
                matcher,
                MatcherState::Try,
                child,
                MatcherState::Clean,
                at,
            ))
        }
    }
}

// ============================================================================
// RESUME - re-execution with a continuation state: next alternative
// ============================================================================

fn resume<T: Token>(
    cx: &mut EngineCx<'_, T>,
    matcher: &MatcherRef<T>,
    state: &MatcherState<T>,
) -> Result<Message<T>, WeftError> {
    match (&**matcher, state) {
        // Ask the last child for its next alternative; the backtracking
        // ladder in child_failed walks further left from there.
        (Matcher::Sequence(children), MatcherState::SequenceDone { done }) => {
            let mut done = done.clone();
            let Some(rec) = done.pop_back() else {
                return Ok(Message::failure(None));
            };
            let last = children.len() - 1;
            Ok(delegate(
                matcher,
                MatcherState::Sequence { done, next: last },
                &children[last],
                rec.state,
                rec.entered,
            ))
        }

        // Re-enter the same alternative with its continuation; child_failed
        // moves on to the next alternative when it is exhausted.
        (
            Matcher::Choice(alternatives),
            MatcherState::ChoiceDone {
                index,
                child,
                entered,
            },
        ) => Ok(delegate(
            matcher,
            MatcherState::Choice { index: *index },
            &alternatives[*index],
            (**child).clone(),
            *entered,
        )),

        (
            Matcher::Repeat {
                child, max, greed, ..
            },
            MatcherState::RepeatDone { done, at },
        ) => match greed {
            // Everything longer with this prefix is exhausted once the
            // stop-here parse has been emitted; unwind into the last child.
            Greed::Greedy => Ok(backtrack_repeat(matcher, child, done, None)),
            // Shortest-first: try to extend before revisiting children.
            Greed::Lazy => {
                let below_max = max.map_or(true, |mx| done.len() < mx);
                if below_max {
                    Ok(delegate(
                        matcher,
                        MatcherState::Repeat { done: done.clone() },
                        child,
                        MatcherState::Clean,
                        *at,
                    ))
                } else {
                    Ok(backtrack_repeat(matcher, child, done, None))
                }
            }
        },

        (
            Matcher::Transform { child: target, .. },
            MatcherState::TransformDone { child, entered },
        ) => Ok(delegate(
            matcher,
            MatcherState::Transform,
            target,
            (**child).clone(),
            *entered,
        )),

        (Matcher::Reference(name), MatcherState::ReferenceDone { child, entered }) => {
            let target = cx.grammar.resolve(name)?.clone();
            Ok(delegate(
                matcher,
                MatcherState::Reference,
                &target,
                (**child).clone(),
                *entered,
            ))
        }

        (Matcher::Try(child), MatcherState::TryDone { child: inner, entered }) => {
            cx.cut.begin_try();
            Ok(delegate(
                matcher,
                MatcherState::Try,
                child,
                (**inner).clone(),
                *entered,
            ))
        }

        (m, s) => Err(state_mismatch(m, s)),
    }
}

// ============================================================================
// CHILD SUCCEEDED - the popped parent frame advances
// ============================================================================

pub fn child_succeeded<T: Token>(
    cx: &mut EngineCx<'_, T>,
    frame: Frame<T>,
    child_state: MatcherState<T>,
    end: Position,
    value: ParseValue<T>,
) -> Result<Message<T>, WeftError> {
    let Frame {
        matcher,
        state,
        child_entered,
    } = frame;

    match (&*matcher, state) {
        (Matcher::Sequence(children), MatcherState::Sequence { mut done, next }) => {
            done.push_back(ChildRecord {
                entered: child_entered,
                end,
                state: child_state,
                value,
            });
            if next + 1 == children.len() {
                let values = collect_values(&done);
                return Ok(Message::success(
                    MatcherState::SequenceDone { done },
                    end,
                    values,
                ));
            }
            Ok(delegate(
                &matcher,
                MatcherState::Sequence {
                    done,
                    next: next + 1,
                },
                &children[next + 1],
                MatcherState::Clean,
                end,
            ))
        }

        (Matcher::Choice(_), MatcherState::Choice { index }) => Ok(Message::success(
            MatcherState::ChoiceDone {
                index,
                child: Box::new(child_state),
                entered: child_entered,
            },
            end,
            value,
        )),

        (
            Matcher::Repeat {
                child, min, max, greed,
            },
            MatcherState::Repeat { mut done },
        ) => {
            done.push_back(ChildRecord {
                entered: child_entered,
                end,
                state: child_state,
                value,
            });
            let count = done.len();
            let yield_now = match greed {
                // Greedy yields only when it cannot grow further.
                Greed::Greedy => *max == Some(count),
                // Lazy yields as soon as the minimum is met.
                Greed::Lazy => count >= *min,
            };
            if yield_now {
                let values = collect_values(&done);
                return Ok(Message::success(
                    MatcherState::RepeatDone { done, at: end },
                    end,
                    values,
                ));
            }
            Ok(delegate(
                &matcher,
                MatcherState::Repeat { done },
                child,
                MatcherState::Clean,
                end,
            ))
        }

        (Matcher::Transform { f, label, .. }, MatcherState::Transform) => {
            let out = f(value).map_err(|message| WeftError::TransformFailed {
                label: label.clone(),
                message,
            })?;
            Ok(Message::success(
                MatcherState::TransformDone {
                    child: Box::new(child_state),
                    entered: child_entered,
                },
                end,
                out,
            ))
        }

        (Matcher::Reference(_), MatcherState::Reference) => Ok(Message::success(
            MatcherState::ReferenceDone {
                child: Box::new(child_state),
                entered: child_entered,
            },
            end,
            value,
        )),

        (Matcher::Try(_), MatcherState::Try) => {
            cx.cut.end_try();
            Ok(Message::success(
                MatcherState::TryDone {
                    child: Box::new(child_state),
                    entered: child_entered,
                },
                end,
                value,
            ))
        }

        (m, s) => Err(state_mismatch(m, &s)),
    }
}

// ============================================================================
// CHILD FAILED - fallback or propagate
// ============================================================================

pub fn child_failed<T: Token>(
    cx: &mut EngineCx<'_, T>,
    frame: Frame<T>,
    failed_at: Option<Position>,
) -> Result<Message<T>, WeftError> {
    let Frame {
        matcher,
        state,
        child_entered,
    } = frame;

    match (&*matcher, state) {
        // The backtracking ladder: ask the previous child for its next
        // alternative; below child 0 the sequence is out of options.
        (Matcher::Sequence(children), MatcherState::Sequence { mut done, next }) => {
            if next == 0 {
                return Ok(Message::failure(failed_at));
            }
            let Some(rec) = done.pop_back() else {
                return Err(WeftError::internal(
                    "sequence ladder below child 0 with no completed child",
                ));
            };
            Ok(delegate(
                &matcher,
                MatcherState::Sequence {
                    done,
                    next: next - 1,
                },
                &children[next - 1],
                rec.state,
                rec.entered,
            ))
        }

        (Matcher::Choice(alternatives), MatcherState::Choice { index }) => {
            let next = index + 1;
            let Some(alternative) = alternatives.get(next) else {
                return Ok(Message::failure(failed_at));
            };
            Ok(delegate(
                &matcher,
                MatcherState::Choice { index: next },
                alternative,
                MatcherState::Clean,
                child_entered,
            ))
        }

        (
            Matcher::Repeat {
                child, min, greed, ..
            },
            MatcherState::Repeat { done },
        ) => {
            // The child at this depth is exhausted. Greedy now emits the
            // stop-here parse (if long enough); lazy already emitted it
            // before growing, so both otherwise unwind into the previous
            // repetition's alternatives.
            if *greed == Greed::Greedy && done.len() >= *min {
                let values = collect_values(&done);
                return Ok(Message::success(
                    MatcherState::RepeatDone {
                        done,
                        at: child_entered,
                    },
                    child_entered,
                    values,
                ));
            }
            Ok(backtrack_repeat(&matcher, child, &done, failed_at))
        }

        (Matcher::Transform { .. }, MatcherState::Transform) => Ok(Message::failure(failed_at)),

        (Matcher::Reference(_), MatcherState::Reference) => Ok(Message::failure(failed_at)),

        (Matcher::Try(_), MatcherState::Try) => {
            cx.cut.end_try();
            Ok(Message::failure(failed_at))
        }

        (m, s) => Err(state_mismatch(m, &s)),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Builds the Execute message that suspends `parent` into a frame and hands
/// control to `child`.
fn delegate<T: Token>(
    parent: &MatcherRef<T>,
    awaiting: MatcherState<T>,
    child: &MatcherRef<T>,
    child_state: MatcherState<T>,
    at: Position,
) -> Message<T> {
    Message::execute(
        Some(Frame {
            matcher: parent.clone(),
            state: awaiting,
            child_entered: at,
        }),
        child.clone(),
        child_state,
        at,
    )
}

fn match_literal<T: Token>(
    source: &dyn Source<Token = T>,
    expected: &[T],
    at: Position,
) -> Message<T> {
    let mut pos = at;
    for want in expected {
        match source.next(pos) {
            Some((token, after)) if token == *want => pos = after,
            _ => return Message::failure(Some(pos)),
        }
    }
    Message::success(MatcherState::Spent, pos, ParseValue::Tokens(expected.to_vec()))
}

/// Pops the last repetition and re-enters it for its own alternatives;
/// failure when no repetition remains.
fn backtrack_repeat<T: Token>(
    matcher: &MatcherRef<T>,
    child: &MatcherRef<T>,
    done: &Vector<ChildRecord<T>>,
    failed_at: Option<Position>,
) -> Message<T> {
    let mut done = done.clone();
    let Some(rec) = done.pop_back() else {
        return Message::failure(failed_at);
    };
    delegate(
        matcher,
        MatcherState::Repeat { done },
        child,
        rec.state,
        rec.entered,
    )
}

fn collect_values<T: Token>(done: &Vector<ChildRecord<T>>) -> ParseValue<T> {
    ParseValue::List(done.iter().map(|rec| rec.value.clone()).collect())
}

fn state_mismatch<T: Token>(matcher: &Matcher<T>, state: &MatcherState<T>) -> WeftError {
    WeftError::StateMismatch {
        matcher: matcher.kind().to_string(),
        state: state.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{repeat, text, Grammar, Greed};
    use crate::input::TextSource;

    fn cx_over<'a>(
        grammar: &'a Grammar<char>,
        source: &'a TextSource<'a>,
    ) -> EngineCx<'a, char> {
        EngineCx::new(grammar, source)
    }

    #[test]
    fn literal_success_is_terminal() {
        let grammar = Grammar::from_root(text("hi"));
        let source = TextSource::new("hi there");
        let mut cx = cx_over(&grammar, &source);
        let msg = execute(&mut cx, grammar.root(), &MatcherState::Clean, source.start()).unwrap();
        let Message::Success(s) = msg else {
            panic!("literal should match");
        };
        assert_eq!(s.end.offset(), 2);
        assert_eq!(s.state, MatcherState::Spent);
        assert_eq!(s.value, ParseValue::Tokens(vec!['h', 'i']));
    }

    #[test]
    fn literal_failure_marks_the_mismatch_position() {
        let grammar = Grammar::from_root(text("ab"));
        let source = TextSource::new("ax");
        let mut cx = cx_over(&grammar, &source);
        let msg = execute(&mut cx, grammar.root(), &MatcherState::Clean, source.start()).unwrap();
        let Message::Failure(f) = msg else {
            panic!("literal should fail");
        };
        assert_eq!(f.at.map(|p| p.offset()), Some(1));
    }

    #[test]
    fn spent_resumption_fails() {
        let grammar = Grammar::from_root(text("a"));
        let source = TextSource::new("a");
        let mut cx = cx_over(&grammar, &source);
        let msg = execute(&mut cx, grammar.root(), &MatcherState::Spent, source.start()).unwrap();
        assert!(matches!(msg, Message::Failure(_)));
    }

    #[test]
    fn inverted_repeat_bounds_are_a_grammar_error() {
        let bad = repeat(text("a"), 3, Some(1), Greed::Greedy);
        let grammar = Grammar::from_root(bad.clone());
        let source = TextSource::new("aaa");
        let mut cx = cx_over(&grammar, &source);
        let err = execute(&mut cx, &bad, &MatcherState::Clean, source.start()).unwrap_err();
        assert_eq!(err, WeftError::RepeatBounds { min: 3, max: 1 });
    }

    #[test]
    fn lazy_repeat_yields_the_empty_parse_first() {
        let lazy = repeat(text("a"), 0, None, Greed::Lazy);
        let grammar = Grammar::from_root(lazy.clone());
        let source = TextSource::new("aaa");
        let mut cx = cx_over(&grammar, &source);
        let msg = execute(&mut cx, &lazy, &MatcherState::Clean, source.start()).unwrap();
        let Message::Success(s) = msg else {
            panic!("lazy min-0 repeat should succeed empty");
        };
        assert_eq!(s.end, source.start());
        assert_eq!(s.value, ParseValue::List(Vec::new()));
    }
}
