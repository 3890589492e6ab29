//! Weft - a trampolined parser-combinator engine.
//!
//! Grammars are directed acyclic graphs of immutable [`grammar::Matcher`]
//! nodes. Parsing is message-passing: a matcher-agnostic trampoline loop
//! ([`engine`]) drives the per-variant state machines ([`matchers`]) through
//! a pluggable [`policy::ExecutionPolicy`], so plain backtracking,
//! memoization, restricted backtracking, and tracing are scheduling
//! strategies rather than grammar rewrites.
//!
//! ```
//! use weft::engine::{parses, ParseOptions};
//! use weft::grammar::{choice, text, Grammar};
//! use weft::input::TextSource;
//!
//! // Ordered choice backtracks into the second alternative lazily.
//! let grammar = Grammar::from_root(choice(vec![text("foo"), text("foobar")]));
//! let source = TextSource::new("foobar");
//! let hits: Vec<_> = parses(&grammar, &source, ParseOptions::default())
//!     .map(|hit| hit.unwrap().end.offset())
//!     .collect();
//! assert_eq!(hits, [6]);
//! ```

pub use crate::errors::WeftError;

pub mod engine;
pub mod errors;
pub mod grammar;
pub mod input;
pub mod machine;
pub mod matchers;
pub mod observer;
pub mod policy;
pub mod state;
pub mod transforms;
pub mod value;

/// The commonly needed surface in one import.
pub mod prelude {
    pub use crate::engine::{
        parse, parse_with, parses, parses_with, CancelToken, Halt, Hit, Outcome, ParseOptions,
    };
    pub use crate::errors::WeftError;
    pub use crate::grammar::{
        apply, attempt, bytes, choice, lit, many, named_transform, optional, reference, repeat,
        seq, some, text, transform, Grammar, GrammarBuilder, Greed, Matcher, MatcherRef,
    };
    pub use crate::input::{ByteSource, Position, SliceSource, Source, TextSource, Token};
    pub use crate::observer::{BufferTracer, Observer, TraceEvent, WriterTracer};
    pub use crate::policy::{Backtrack, ExecutionPolicy, Memo, Restricted, Tracing};
    pub use crate::value::ParseValue;
}
