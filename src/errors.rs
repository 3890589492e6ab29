//! Weft Error Handling - Unified Diagnostic Type
//!
//! All fatal failure modes of the engine are represented by [`WeftError`], a
//! single `miette`-backed diagnostic enum. Only *grammar* defects are errors:
//! a grammar that fails to match its input is ordinary control flow and is
//! reported through [`crate::engine::Outcome::NoMatch`], and an external
//! abort is [`crate::engine::Outcome::Cancelled`]. Anything that reaches
//! `Err(WeftError)` terminates the parse immediately, unwinding the frame
//! stack without invoking any parent failure transitions.

use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all fatal Weft failure modes.
///
/// Every variant carries a stable diagnostic code under the `weft::` prefix,
/// so callers can match on codes without depending on message text.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum WeftError {
    /// A `Reference` matcher named a rule the grammar never defined.
    #[error("unresolved grammar reference '{name}'")]
    #[diagnostic(
        code(weft::grammar::unresolved_reference),
        help("define the rule with GrammarBuilder::define before building the grammar")
    )]
    UnresolvedReference { name: String },

    /// A `Repeat` matcher was built with inverted bounds.
    #[error("repeat bounds are inverted: min {min} > max {max}")]
    #[diagnostic(
        code(weft::grammar::repeat_bounds),
        help("a repetition must allow at least `min` occurrences; raise max or lower min")
    )]
    RepeatBounds { min: usize, max: usize },

    /// A transform function reported failure; the parse cannot continue.
    #[error("transform '{label}' failed: {message}")]
    #[diagnostic(code(weft::transform::failed))]
    TransformFailed { label: String, message: String },

    /// Structural findings from an eager [`crate::grammar::Grammar::validate`] pass.
    #[error("grammar validation failed: {}", .findings.join("; "))]
    #[diagnostic(code(weft::grammar::validation_failed))]
    ValidationFailed { findings: Vec<String> },

    /// A matcher was handed a continuation state of the wrong shape.
    /// Indicates a corrupted message stream, which is an engine bug.
    #[error("matcher/state mismatch: {matcher} cannot proceed from {state}")]
    #[diagnostic(
        code(weft::engine::state_mismatch),
        help("this is an internal engine error; please report it as a bug")
    )]
    StateMismatch { matcher: String, state: String },

    /// Engine invariant breach with no more specific variant.
    #[error("internal engine error: {message}")]
    #[diagnostic(
        code(weft::engine::internal),
        help("this is an internal engine error; please report it as a bug")
    )]
    Internal { message: String },
}

impl WeftError {
    /// Creates an internal error. Use only for situations that cannot happen
    /// in correct engine operation.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for the variants that indicate an engine bug rather than a
    /// defective grammar.
    pub fn is_engine_bug(&self) -> bool {
        matches!(self, Self::StateMismatch { .. } | Self::Internal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_rule() {
        let err = WeftError::UnresolvedReference {
            name: "expr".into(),
        };
        assert_eq!(err.to_string(), "unresolved grammar reference 'expr'");
    }

    #[test]
    fn validation_findings_are_joined() {
        let err = WeftError::ValidationFailed {
            findings: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "grammar validation failed: a; b");
    }

    #[test]
    fn bug_classification() {
        assert!(WeftError::internal("boom").is_engine_bug());
        assert!(!WeftError::RepeatBounds { min: 3, max: 1 }.is_engine_bug());
    }
}
