//! Grammar construction for the Weft engine.
//!
//! A grammar is a directed acyclic graph of immutable [`Matcher`] nodes,
//! shared by reference. Cycles are permitted only through [`Matcher::Reference`]
//! nodes, which are resolved lazily against the grammar's frozen binding
//! table at dispatch time — recursion never creates an ownership cycle.
//!
//! ## Construction
//!
//! Matchers are built with the free constructor functions in this module
//! (`lit`, `seq`, `choice`, `repeat`, ...). Recursive grammars go through
//! [`GrammarBuilder`]: `define` registers a named rule, `build` freezes the
//! binding table so `reference` lookups are constant-time during a parse.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::WeftError;
use crate::input::Token;
use crate::value::ParseValue;

/// Shared handle to a grammar node. The same matcher may appear in many
/// positions of the DAG; identity is the `Arc` pointer.
pub type MatcherRef<T> = Arc<Matcher<T>>;

/// A pure result-rewriting function attached to a Transform node.
///
/// The `Err` string is wrapped into [`WeftError::TransformFailed`] and
/// aborts the parse.
pub type TransformFn<T> =
    Arc<dyn Fn(ParseValue<T>) -> Result<ParseValue<T>, String> + Send + Sync>;

/// Enumeration order of repetition alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Greed {
    /// Longest parse first; gives repetitions back on resumption.
    Greedy,
    /// Shortest parse first; grows on resumption.
    Lazy,
}

/// An immutable node of the grammar DAG.
pub enum Matcher<T: Token> {
    /// Consumes exactly the given token run or fails.
    Literal(Vec<T>),
    /// Matches children left-to-right.
    Sequence(Vec<MatcherRef<T>>),
    /// Tries alternatives in declared order.
    Choice(Vec<MatcherRef<T>>),
    /// Matches `child` between `min` and `max` times; `max: None` is
    /// unbounded.
    Repeat {
        child: MatcherRef<T>,
        min: usize,
        max: Option<usize>,
        greed: Greed,
    },
    /// Delegates to `child` and rewrites its result with `f`.
    Transform {
        child: MatcherRef<T>,
        f: TransformFn<T>,
        label: String,
    },
    /// Late-bound rule, resolved through the grammar's binding table.
    Reference(String),
    /// Brackets `child` so a restricted-backtracking policy treats its
    /// failures as uncommitted. Transparent under other policies.
    Try(MatcherRef<T>),
}

impl<T: Token> Matcher<T> {
    /// Returns the variant name of the matcher as a string.
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Literal(_) => "Literal",
            Matcher::Sequence(_) => "Sequence",
            Matcher::Choice(_) => "Choice",
            Matcher::Repeat { .. } => "Repeat",
            Matcher::Transform { .. } => "Transform",
            Matcher::Reference(_) => "Reference",
            Matcher::Try(_) => "Try",
        }
    }

    /// True for the variants whose failure transition retries something
    /// (an alternative, a shorter repetition, an earlier sequence child).
    pub fn is_choice_point(&self) -> bool {
        matches!(
            self,
            Matcher::Sequence(_) | Matcher::Choice(_) | Matcher::Repeat { .. }
        )
    }

    /// Compact rendering of the node for traces and error messages.
    ///
    /// References render as `<name>` without resolving, which keeps the
    /// rendering finite on recursive grammars.
    pub fn pretty(&self) -> String {
        match self {
            Matcher::Literal(tokens) => format!("(lit {tokens:?})"),
            Matcher::Sequence(children) => {
                format!("(seq {})", render_children(children))
            }
            Matcher::Choice(alternatives) => {
                format!("(choice {})", render_children(alternatives))
            }
            Matcher::Repeat {
                child, min, max, greed,
            } => {
                let bound = match max {
                    Some(mx) => format!("{min},{mx}"),
                    None => format!("{min},"),
                };
                let marker = match greed {
                    Greed::Greedy => "",
                    Greed::Lazy => "?",
                };
                format!("(repeat{{{bound}}}{marker} {})", child.pretty())
            }
            Matcher::Transform { child, label, .. } => {
                format!("(transform[{label}] {})", child.pretty())
            }
            Matcher::Reference(name) => format!("<{name}>"),
            Matcher::Try(child) => format!("(try {})", child.pretty()),
        }
    }
}

fn render_children<T: Token>(children: &[MatcherRef<T>]) -> String {
    children
        .iter()
        .map(|c| c.pretty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl<T: Token> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty())
    }
}

/// Reference identity of a matcher within one parse, used for memo keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatcherId(usize);

impl MatcherId {
    pub fn of<T: Token>(matcher: &MatcherRef<T>) -> Self {
        Self(Arc::as_ptr(matcher) as *const () as usize)
    }
}

// ============================================================================
// CONSTRUCTORS - The grammar-construction surface
// ============================================================================

/// A literal matcher over an explicit token run.
pub fn lit<T: Token>(tokens: impl IntoIterator<Item = T>) -> MatcherRef<T> {
    Arc::new(Matcher::Literal(tokens.into_iter().collect()))
}

/// A literal matcher over the characters of `s`.
pub fn text(s: &str) -> MatcherRef<char> {
    lit(s.chars())
}

/// A literal matcher over a byte string.
pub fn bytes(bs: &[u8]) -> MatcherRef<u8> {
    lit(bs.iter().copied())
}

/// Matches `children` left-to-right; the result is the list of their results.
pub fn seq<T: Token>(children: Vec<MatcherRef<T>>) -> MatcherRef<T> {
    Arc::new(Matcher::Sequence(children))
}

/// Ordered choice: the first alternative's parses are enumerated before the
/// second's.
pub fn choice<T: Token>(alternatives: Vec<MatcherRef<T>>) -> MatcherRef<T> {
    Arc::new(Matcher::Choice(alternatives))
}

/// Repetition with explicit bounds and greediness.
pub fn repeat<T: Token>(
    child: MatcherRef<T>,
    min: usize,
    max: Option<usize>,
    greed: Greed,
) -> MatcherRef<T> {
    Arc::new(Matcher::Repeat {
        child,
        min,
        max,
        greed,
    })
}

/// Zero or more, greedy.
pub fn many<T: Token>(child: MatcherRef<T>) -> MatcherRef<T> {
    repeat(child, 0, None, Greed::Greedy)
}

/// One or more, greedy.
pub fn some<T: Token>(child: MatcherRef<T>) -> MatcherRef<T> {
    repeat(child, 1, None, Greed::Greedy)
}

/// Zero or one, greedy: `Repeat { min: 0, max: Some(1) }`.
pub fn optional<T: Token>(child: MatcherRef<T>) -> MatcherRef<T> {
    repeat(child, 0, Some(1), Greed::Greedy)
}

/// Delegates to `child` and rewrites its result with `f`.
pub fn transform<T: Token>(
    child: MatcherRef<T>,
    f: impl Fn(ParseValue<T>) -> Result<ParseValue<T>, String> + Send + Sync + 'static,
) -> MatcherRef<T> {
    named_transform("transform", child, f)
}

/// Like [`transform`], with a label used in traces and failure diagnostics.
pub fn named_transform<T: Token>(
    label: &str,
    child: MatcherRef<T>,
    f: impl Fn(ParseValue<T>) -> Result<ParseValue<T>, String> + Send + Sync + 'static,
) -> MatcherRef<T> {
    Arc::new(Matcher::Transform {
        child,
        f: Arc::new(f),
        label: label.to_string(),
    })
}

/// Applies a prebuilt [`TransformFn`] (see [`crate::transforms`]).
pub fn apply<T: Token>(label: &str, child: MatcherRef<T>, f: TransformFn<T>) -> MatcherRef<T> {
    Arc::new(Matcher::Transform {
        child,
        f,
        label: label.to_string(),
    })
}

/// A late-bound reference to a rule defined with [`GrammarBuilder::define`].
pub fn reference<T: Token>(name: &str) -> MatcherRef<T> {
    Arc::new(Matcher::Reference(name.to_string()))
}

/// Brackets `child` for restricted-backtracking policies (the Try node).
pub fn attempt<T: Token>(child: MatcherRef<T>) -> MatcherRef<T> {
    Arc::new(Matcher::Try(child))
}

// ============================================================================
// GRAMMAR - Root plus frozen binding table
// ============================================================================

/// A complete grammar: a root matcher and the frozen name→matcher binding
/// table that resolves `Reference` nodes.
#[derive(Debug, Clone)]
pub struct Grammar<T: Token> {
    root: MatcherRef<T>,
    bindings: im::HashMap<String, MatcherRef<T>>,
}

impl<T: Token> Grammar<T> {
    /// A grammar with no named rules.
    pub fn from_root(root: MatcherRef<T>) -> Self {
        Self {
            root,
            bindings: im::HashMap::new(),
        }
    }

    pub fn root(&self) -> &MatcherRef<T> {
        &self.root
    }

    /// Resolves a named rule. Constant-time against the frozen table.
    pub fn resolve(&self, name: &str) -> Result<&MatcherRef<T>, WeftError> {
        self.bindings
            .get(name)
            .ok_or_else(|| WeftError::UnresolvedReference {
                name: name.to_string(),
            })
    }

    /// Eagerly checks the grammar for structural defects: unresolved
    /// references and inverted repeat bounds.
    ///
    /// Parsing does not require this pass; the same defects surface as
    /// runtime errors when the offending node is first executed.
    pub fn validate(&self) -> Result<(), WeftError> {
        let mut findings = Vec::new();
        let mut visited = HashSet::new();
        self.walk(&self.root, &mut visited, &mut findings);
        for target in self.bindings.values() {
            self.walk(target, &mut visited, &mut findings);
        }
        if findings.is_empty() {
            Ok(())
        } else {
            Err(WeftError::ValidationFailed { findings })
        }
    }

    fn walk(
        &self,
        matcher: &MatcherRef<T>,
        visited: &mut HashSet<MatcherId>,
        findings: &mut Vec<String>,
    ) {
        if !visited.insert(MatcherId::of(matcher)) {
            return;
        }
        match &**matcher {
            Matcher::Literal(_) => {}
            Matcher::Sequence(children) | Matcher::Choice(children) => {
                for child in children {
                    self.walk(child, visited, findings);
                }
            }
            Matcher::Repeat {
                child, min, max, ..
            } => {
                if let Some(mx) = max {
                    if min > mx {
                        findings.push(format!("repeat bounds inverted: min {min} > max {mx}"));
                    }
                }
                self.walk(child, visited, findings);
            }
            Matcher::Transform { child, .. } | Matcher::Try(child) => {
                self.walk(child, visited, findings);
            }
            Matcher::Reference(name) => {
                if !self.bindings.contains_key(name) {
                    findings.push(format!("unresolved reference '{name}'"));
                }
            }
        }
    }
}

/// Accumulates named rules, then freezes them into a [`Grammar`].
#[derive(Debug, Clone)]
pub struct GrammarBuilder<T: Token> {
    bindings: im::HashMap<String, MatcherRef<T>>,
}

impl<T: Token> Default for GrammarBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> GrammarBuilder<T> {
    pub fn new() -> Self {
        Self {
            bindings: im::HashMap::new(),
        }
    }

    /// Registers `matcher` under `name`. Later definitions replace earlier
    /// ones.
    pub fn define(mut self, name: &str, matcher: MatcherRef<T>) -> Self {
        self.bindings.insert(name.to_string(), matcher);
        self
    }

    /// Freezes the binding table and produces the grammar.
    pub fn build(self, root: MatcherRef<T>) -> Grammar<T> {
        Grammar {
            root,
            bindings: self.bindings,
        }
    }
}
