#![allow(dead_code)]

//! Shared helpers for the Weft integration test suite.
//!
//! Tests drive the public parse surface only. The helpers keep the
//! per-scenario setup down to one line: build a grammar, run it over a text
//! source, and look at values and end offsets.

use std::cell::RefCell;
use std::rc::Rc;

use weft::prelude::*;

/// Parses `input` fully with default options (first parse, full input).
pub fn parse_str(grammar: &Grammar<char>, input: &str) -> Outcome<char> {
    let source = TextSource::new(input);
    parse(grammar, &source, ParseOptions::default()).expect("grammar should be well-formed")
}

/// Parses `input` with `require_full_input` off.
pub fn parse_str_partial(grammar: &Grammar<char>, input: &str) -> Outcome<char> {
    let source = TextSource::new(input);
    let options = ParseOptions {
        require_full_input: false,
        ..ParseOptions::default()
    };
    parse(grammar, &source, options).expect("grammar should be well-formed")
}

/// Collects every parse of `input`, with configurable full-input filtering.
pub fn all_hits(grammar: &Grammar<char>, input: &str, require_full: bool) -> Vec<Hit<char>> {
    let source = TextSource::new(input);
    let options = ParseOptions {
        require_full_input: require_full,
        ..ParseOptions::default()
    };
    parses(grammar, &source, options)
        .map(|hit| hit.expect("enumeration should not halt"))
        .collect()
}

/// Like [`all_hits`] under the memoizing policy.
pub fn all_hits_memo(grammar: &Grammar<char>, input: &str, require_full: bool) -> Vec<Hit<char>> {
    let source = TextSource::new(input);
    let options = ParseOptions {
        require_full_input: require_full,
        memoize: true,
        ..ParseOptions::default()
    };
    parses(grammar, &source, options)
        .map(|hit| hit.expect("enumeration should not halt"))
        .collect()
}

/// End offsets of every parse, in enumeration order.
pub fn all_ends(grammar: &Grammar<char>, input: &str, require_full: bool) -> Vec<usize> {
    all_hits(grammar, input, require_full)
        .into_iter()
        .map(|hit| hit.end.offset())
        .collect()
}

/// The `Tokens` value a literal over `s` produces.
pub fn tokens(s: &str) -> ParseValue<char> {
    ParseValue::Tokens(s.chars().collect())
}

/// A `List` of literal token runs, the shape sequences and repeats produce.
pub fn token_list(parts: &[&str]) -> ParseValue<char> {
    ParseValue::List(parts.iter().map(|p| tokens(p)).collect())
}

/// An observer that appends rendered trace lines into a shared buffer, so
/// tests can inspect the trace after the options struct has been consumed.
#[derive(Clone, Default)]
pub struct SharedTracer {
    pub lines: Rc<RefCell<Vec<String>>>,
}

impl SharedTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Observer for SharedTracer {
    fn on_dispatch(&mut self, event: &TraceEvent) {
        self.lines.borrow_mut().push(event.to_string());
    }
}
